//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    job: JobInfo,
    input: InputInfo,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct JobInfo {
    chunk_size: usize,
    worker_count: usize,
    reply_timeout_ms: u64,
    reply_send_timeout_ms: u64,
    poll_interval_ms: u64,
    shutdown_grace_ms: u64,
    max_retries: u32,
    channel_capacity: usize,
}

#[derive(Serialize)]
struct InputInfo {
    path: String,
    delimiter: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let config_info = ConfigInfo {
        version: format!("{:?}", blueprint.version),
        job: JobInfo {
            chunk_size: blueprint.job.chunk_size,
            worker_count: blueprint.job.worker_count,
            reply_timeout_ms: blueprint.job.reply_timeout_ms,
            reply_send_timeout_ms: blueprint.job.reply_send_timeout_ms,
            poll_interval_ms: blueprint.job.poll_interval_ms,
            shutdown_grace_ms: blueprint.job.shutdown_grace_ms,
            max_retries: blueprint.job.max_retries,
            channel_capacity: blueprint.job.channel_capacity,
        },
        input: InputInfo {
            path: blueprint.input.path.display().to_string(),
            delimiter: blueprint.input.delimiter.clone(),
        },
        sinks: blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                params: s.params.clone(),
            })
            .collect(),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&config_info).context("Failed to serialize info")?;
        println!("{}", json);
    } else {
        print_info(&config_info);
    }

    Ok(())
}

fn print_info(info: &ConfigInfo) {
    println!("\n=== Job Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nJob:");
    println!("  Chunk size: {}", info.job.chunk_size);
    println!("  Workers: {}", info.job.worker_count);
    println!("  Reply timeout: {}ms", info.job.reply_timeout_ms);
    println!("  Reply send timeout: {}ms", info.job.reply_send_timeout_ms);
    println!("  Poll interval: {}ms", info.job.poll_interval_ms);
    println!("  Shutdown grace: {}ms", info.job.shutdown_grace_ms);
    println!("  Max retries: {}", info.job.max_retries);
    println!("  Channel capacity: {}", info.job.channel_capacity);

    println!("\nInput:");
    println!("  Path: {}", info.input.path);
    println!("  Delimiter: {:?}", info.input.delimiter);

    println!("\nSinks ({}):", info.sinks.len());
    for sink in &info.sinks {
        println!("  - {} ({})", sink.name, sink.sink_type);
        for (key, value) in &sink.params {
            println!("      {key} = {value}");
        }
    }

    println!();
}
