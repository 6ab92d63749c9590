//! Job orchestrator - wires every component for one run.
//!
//! Builds the two bounded channels, spawns the worker pool and the reply
//! listener, drives the dispatcher to completion, and walks the shutdown
//! coordinator. The chunk source is constructed here, only after the run
//! parameters are known.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{info, warn};

use chunk_source::{ChunkSource, FlatFileItemReader};
use contracts::{ChunkRequest, ChunkResult, Disposable, JobBlueprint, SinkConfig, SinkType};
use dispatcher::{
    CompletionTracker, Correlator, Dispatcher, DispatcherConfig, ReplyListener,
    ShutdownCoordinator,
};
use worker::sinks::{JsonlFileSink, LogSink, MemorySink};
use worker::{PoolMetricsSnapshot, PrimeFactors, WorkerPool};

use super::RunStats;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// The job blueprint (already validated)
    pub blueprint: JobBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main job orchestrator
pub struct JobRunner {
    config: JobRunnerConfig,
}

/// Worker pool behind the sink-type match, plus a way to read its
/// counters after the pool is boxed for disposal
struct PoolHandle {
    disposable: Box<dyn Disposable>,
    metrics: Arc<worker::WorkerPoolMetrics>,
}

impl JobRunner {
    /// Create a new runner with the given configuration
    pub fn new(config: JobRunnerConfig) -> Self {
        Self { config }
    }

    /// Run the job to completion
    ///
    /// `cancel_signal` resolves when the operator requests cancellation
    /// (Ctrl-C in the CLI); the dispatcher is interrupted and the run
    /// still drains and disposes normally.
    pub async fn run(
        self,
        cancel_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<RunStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let job = &blueprint.job;

        // Metrics exporter (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Chunk source first: it is constructed only after the run
        // parameters are known, and nothing else must start if the input
        // cannot be opened
        let delimiter = blueprint
            .input
            .delimiter
            .chars()
            .next()
            .expect("validator guarantees a one-character delimiter");
        let reader = FlatFileItemReader::open(&blueprint.input.path, delimiter)
            .with_context(|| format!("Failed to open {}", blueprint.input.path.display()))?;
        let mut source = ChunkSource::new(reader, job.chunk_size);

        // Transport: two bounded channels
        let (requests_tx, requests_rx) =
            async_channel::bounded::<ChunkRequest>(job.channel_capacity);
        let (replies_tx, replies_rx) = async_channel::bounded::<ChunkResult>(job.channel_capacity);

        // Worker pool over the configured sink
        let sink_config = &blueprint.sinks[0];
        info!(
            sink = %sink_config.name,
            sink_type = ?sink_config.sink_type,
            workers = job.worker_count,
            "Starting worker pool"
        );
        let pool = build_pool(
            sink_config,
            job.worker_count,
            requests_rx,
            replies_tx,
            job.reply_send_timeout(),
        )?;

        // Master-side protocol state
        let correlator = Arc::new(Correlator::new());
        let tracker = Arc::new(CompletionTracker::new());
        let listener = ReplyListener::spawn(
            replies_rx,
            Arc::clone(&correlator),
            job.poll_interval(),
        );

        // Dispatcher + operator cancellation wiring
        let (dispatcher, cancel) = Dispatcher::new(
            requests_tx,
            Arc::clone(&correlator),
            Arc::clone(&tracker),
            DispatcherConfig {
                reply_timeout: job.reply_timeout(),
                max_retries: job.max_retries,
            },
        );

        let (signal_done_tx, signal_done_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel_signal => {
                    warn!("Cancellation requested, interrupting dispatcher");
                    cancel.cancel();
                }
                _ = signal_done_rx => {}
            }
        });

        info!(
            chunk_size = job.chunk_size,
            reply_timeout_ms = job.reply_timeout_ms,
            max_retries = job.max_retries,
            "Job running"
        );

        let job_result = dispatcher.run_job(&mut source).await;
        // Stop watching for cancellation; the dispatch loop is done
        let _ = signal_done_tx.send(());

        // Draining and teardown happen for every outcome, fatal included
        info!("Job loop finished, shutting down");
        let mut coordinator = ShutdownCoordinator::new(job.shutdown_grace(), listener);
        coordinator.register(pool.disposable);
        let shutdown = coordinator.run().await;

        let report = job_result?;
        Ok(RunStats {
            report,
            pool: pool_snapshot(&pool.metrics),
            listener: shutdown.listener,
            worker_count: job.worker_count,
            duration: start_time.elapsed(),
        })
    }
}

fn pool_snapshot(metrics: &Arc<worker::WorkerPoolMetrics>) -> PoolMetricsSnapshot {
    metrics.snapshot()
}

/// Create the worker pool for the configured sink type
fn build_pool(
    config: &SinkConfig,
    worker_count: usize,
    requests: async_channel::Receiver<ChunkRequest>,
    replies: async_channel::Sender<ChunkResult>,
    reply_send_timeout: std::time::Duration,
) -> Result<PoolHandle> {
    let processor = Arc::new(PrimeFactors::new());

    let handle = match config.sink_type {
        SinkType::Log => {
            let pool = WorkerPool::spawn(
                worker_count,
                requests,
                replies,
                processor,
                LogSink::new(&config.name),
                reply_send_timeout,
            );
            PoolHandle {
                metrics: Arc::clone(pool.metrics()),
                disposable: Box::new(pool),
            }
        }
        SinkType::Jsonl => {
            let sink = JsonlFileSink::from_params(&config.name, &config.params)
                .with_context(|| format!("Failed to create sink '{}'", config.name))?;
            let pool = WorkerPool::spawn(
                worker_count,
                requests,
                replies,
                processor,
                sink,
                reply_send_timeout,
            );
            PoolHandle {
                metrics: Arc::clone(pool.metrics()),
                disposable: Box::new(pool),
            }
        }
        SinkType::Memory => {
            let (sink, _handle) = MemorySink::new(&config.name);
            let pool = WorkerPool::spawn(
                worker_count,
                requests,
                replies,
                processor,
                sink,
                reply_send_timeout,
            );
            PoolHandle {
                metrics: Arc::clone(pool.metrics()),
                disposable: Box::new(pool),
            }
        }
    };

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, InputConfig, JobConfig, SinkConfig};
    use dispatcher::JobOutcome;
    use std::collections::HashMap;
    use std::io::Write;

    fn blueprint_for(path: std::path::PathBuf) -> JobBlueprint {
        JobBlueprint {
            version: ConfigVersion::V1,
            job: JobConfig {
                chunk_size: 2,
                worker_count: 2,
                shutdown_grace_ms: 50,
                ..Default::default()
            },
            input: InputConfig {
                path,
                delimiter: "\t".into(),
            },
            sinks: vec![SinkConfig {
                name: "rows".into(),
                sink_type: SinkType::Memory,
                params: HashMap::new(),
            }],
        }
    }

    #[tokio::test]
    async fn test_runner_end_to_end() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        writeln!(input, "2\n3\n4\n5").unwrap();

        let runner = JobRunner::new(JobRunnerConfig {
            blueprint: blueprint_for(input.path().to_path_buf()),
            metrics_port: None,
        });

        let stats = runner.run(std::future::pending()).await.unwrap();
        assert_eq!(stats.report.outcome, JobOutcome::Success);
        assert_eq!(stats.report.dispatched, 2);
        assert_eq!(stats.pool.items_processed, 4);
        assert_eq!(stats.listener.matched, 2);
    }

    #[tokio::test]
    async fn test_runner_missing_input_fails() {
        let runner = JobRunner::new(JobRunnerConfig {
            blueprint: blueprint_for("/nonexistent/input.tsv".into()),
            metrics_port: None,
        });

        let result = runner.run(std::future::pending()).await;
        assert!(result.is_err());
    }
}
