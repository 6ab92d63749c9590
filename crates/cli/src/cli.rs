//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// distbatch - master/worker remote-chunking batch engine
#[derive(Parser, Debug)]
#[command(
    name = "distbatch",
    author,
    version,
    about = "Remote-chunking batch engine",
    long_about = "A master/worker batch engine.\n\n\
                  Reads an ordered input file, partitions it into chunks, dispatches \n\
                  each chunk to a pool of workers over bounded channels, and tracks \n\
                  correlated acknowledgements until the job completes."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DISTBATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DISTBATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch job
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "job.toml", env = "DISTBATCH_CONFIG")]
    pub config: PathBuf,

    /// Override input file path from configuration
    #[arg(long, env = "DISTBATCH_INPUT")]
    pub input: Option<PathBuf>,

    /// Override chunk size from configuration
    #[arg(long, env = "DISTBATCH_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Override worker pool size from configuration
    #[arg(long, env = "DISTBATCH_WORKERS")]
    pub workers: Option<usize>,

    /// Override reply timeout in milliseconds
    #[arg(long, env = "DISTBATCH_REPLY_TIMEOUT_MS")]
    pub reply_timeout_ms: Option<u64>,

    /// Override shutdown grace period in milliseconds
    #[arg(long, env = "DISTBATCH_SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: Option<u64>,

    /// Validate configuration and exit without running the job
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DISTBATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "job.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "job.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
