//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{JobRunner, JobRunnerConfig};

/// Execute the `run` command
pub async fn run_job(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref input) = args.input {
        info!(input = %input.display(), "Overriding input path from CLI");
        blueprint.input.path = input.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        info!(chunk_size, "Overriding chunk size from CLI");
        blueprint.job.chunk_size = chunk_size;
    }
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        blueprint.job.worker_count = workers;
    }
    if let Some(reply_timeout_ms) = args.reply_timeout_ms {
        info!(reply_timeout_ms, "Overriding reply timeout from CLI");
        blueprint.job.reply_timeout_ms = reply_timeout_ms;
    }
    if let Some(shutdown_grace_ms) = args.shutdown_grace_ms {
        info!(shutdown_grace_ms, "Overriding shutdown grace from CLI");
        blueprint.job.shutdown_grace_ms = shutdown_grace_ms;
    }

    info!(
        input = %blueprint.input.path.display(),
        chunk_size = blueprint.job.chunk_size,
        workers = blueprint.job.worker_count,
        sink = %blueprint.sinks[0].name,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build runner configuration
    let runner_config = JobRunnerConfig {
        blueprint,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let runner = JobRunner::new(runner_config);

    info!("Starting job...");
    let stats = runner.run(shutdown_signal()).await?;

    stats.print_summary();

    if let dispatcher::JobOutcome::Failed(ref reason) = stats.report.outcome {
        return Err(CliError::job_execution(reason.clone()).into());
    }

    info!("distbatch finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::JobBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Job:");
    println!("  Chunk size: {}", blueprint.job.chunk_size);
    println!("  Workers: {}", blueprint.job.worker_count);
    println!("  Reply timeout: {}ms", blueprint.job.reply_timeout_ms);
    println!("  Max retries: {}", blueprint.job.max_retries);
    println!("  Channel capacity: {}", blueprint.job.channel_capacity);
    println!("  Shutdown grace: {}ms", blueprint.job.shutdown_grace_ms);

    println!("\nInput:");
    println!("  Path: {}", blueprint.input.path.display());
    println!("  Delimiter: {:?}", blueprint.input.delimiter);

    println!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("  - {} ({:?})", sink.name, sink.sink_type);
    }

    println!();
}
