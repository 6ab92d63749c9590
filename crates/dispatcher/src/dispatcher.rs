//! Dispatcher - master-side chunk lifecycle loop
//!
//! Drives the chunk source, assigns correlation ids, sends requests, and
//! blocks on the correlated reply before advancing. One chunk is fully
//! resolved before the next is dispatched (in-flight window of one).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::Sender;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    BatchError, Chunk, ChunkFeed, ChunkRequest, ChunkStatus, CorrelationIdGenerator,
};
use observability::JobMetricsAggregator;

use crate::completion::CompletionTracker;
use crate::correlator::Correlator;
use crate::report::JobReport;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Budget for one correlated reply
    pub reply_timeout: Duration,

    /// Resends of an unacknowledged chunk before the job fails
    pub max_retries: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_millis(2000),
            max_retries: 0,
        }
    }
}

/// Operator-facing cancellation handle
///
/// Cancelling interrupts a blocked reply wait; the job resolves with a
/// cancelled report and the orchestrator proceeds to draining.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation of the running job
    pub fn cancel(&self) {
        // Receiver gone means the job already finished
        let _ = self.tx.send(true);
    }
}

/// Outcome of resolving one chunk
enum ChunkResolution {
    Resolved,
    Cancelled,
}

/// The master-side dispatch loop
pub struct Dispatcher {
    requests: Sender<ChunkRequest>,
    correlator: Arc<Correlator>,
    tracker: Arc<CompletionTracker>,
    ids: CorrelationIdGenerator,
    config: DispatcherConfig,
    cancel_rx: watch::Receiver<bool>,
    stats: JobMetricsAggregator,
}

impl Dispatcher {
    /// Create a dispatcher over the outbound channel and shared protocol
    /// state, returning the cancellation handle alongside it
    pub fn new(
        requests: Sender<ChunkRequest>,
        correlator: Arc<Correlator>,
        tracker: Arc<CompletionTracker>,
        config: DispatcherConfig,
    ) -> (Self, CancelHandle) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (
            Self {
                requests,
                correlator,
                tracker,
                ids: CorrelationIdGenerator::new(),
                config,
                cancel_rx,
                stats: JobMetricsAggregator::new(),
            },
            CancelHandle { tx: cancel_tx },
        )
    }

    /// Run one job to completion
    ///
    /// Returns the final accounting report, or a fatal error
    /// ([`BatchError::SourceRead`] / [`BatchError::ChunkTimeout`]) that
    /// aborts the job.
    #[instrument(name = "dispatcher_run_job", skip_all)]
    pub async fn run_job<F: ChunkFeed>(mut self, source: &mut F) -> Result<JobReport, BatchError> {
        info!("job started");

        loop {
            if *self.cancel_rx.borrow() {
                info!("job cancelled before next dispatch");
                return Ok(self.cancelled_report());
            }

            let Some(chunk) = source.next_chunk()? else {
                break;
            };
            let sequence = chunk.sequence;

            match self.resolve_chunk(chunk).await? {
                ChunkResolution::Resolved => {}
                ChunkResolution::Cancelled => {
                    info!(sequence, "job cancelled while awaiting reply");
                    return Ok(self.cancelled_report());
                }
            }
        }

        self.tracker.mark_source_exhausted();
        // With an in-flight window of one, nothing is outstanding here
        debug_assert!(self.correlator.is_empty());
        debug_assert!(self.tracker.is_complete());

        let state = self.tracker.snapshot();
        info!(
            dispatched = state.dispatched,
            acked = state.acked,
            failed = state.failed,
            "source exhausted, all chunks resolved"
        );
        Ok(JobReport::from_state(
            &state,
            self.tracker.failure_reasons(),
            self.stats,
        ))
    }

    fn cancelled_report(&self) -> JobReport {
        JobReport::cancelled(
            &self.tracker.snapshot(),
            self.tracker.failure_reasons(),
            self.stats.clone(),
        )
    }

    /// Dispatch one chunk and block until it is acked, failed, retried
    /// out, or the job is cancelled
    async fn resolve_chunk(&mut self, chunk: Chunk) -> Result<ChunkResolution, BatchError> {
        let correlation_id = self.ids.generate();
        let sequence = chunk.sequence;
        self.tracker.on_dispatch();

        let mut cancel_rx = self.cancel_rx.clone();
        let mut attempt: u32 = 0;

        loop {
            let reply_rx = self
                .correlator
                .register(correlation_id, chunk.clone(), attempt);
            let request = ChunkRequest {
                correlation_id,
                chunk: chunk.clone(),
            };

            // A full queue blocks here; that backpressure is the
            // admission-control mechanism.
            if self.requests.send(request).await.is_err() {
                self.correlator.take(correlation_id);
                return Err(BatchError::Other("requests channel closed".to_string()));
            }
            let sent_at = Instant::now();
            self.stats.record_dispatch(attempt > 0);
            metrics::counter!("distbatch_chunks_dispatched_total").increment(1);
            if attempt > 0 {
                metrics::counter!("distbatch_chunk_retries_total").increment(1);
            }
            debug!(correlation_id = %correlation_id, sequence, attempt, "chunk dispatched");

            tokio::select! {
                _ = wait_cancelled(&mut cancel_rx) => {
                    self.correlator.take(correlation_id);
                    return Ok(ChunkResolution::Cancelled);
                }
                outcome = timeout(self.config.reply_timeout, reply_rx) => match outcome {
                    Ok(Ok(result)) => {
                        let round_trip = sent_at.elapsed();
                        self.stats
                            .record_round_trip_ms(round_trip.as_secs_f64() * 1000.0);
                        metrics::histogram!("distbatch_round_trip_ms")
                            .record(round_trip.as_secs_f64() * 1000.0);

                        return Ok(match result.status {
                            ChunkStatus::Success => {
                                self.tracker.on_ack();
                                self.stats.record_resolution(true);
                                metrics::counter!("distbatch_chunks_acked_total", "status" => "success")
                                    .increment(1);
                                debug!(
                                    correlation_id = %correlation_id,
                                    sequence,
                                    round_trip_ms = round_trip.as_millis() as u64,
                                    "chunk acknowledged"
                                );
                                ChunkResolution::Resolved
                            }
                            ChunkStatus::Failure(reason) => {
                                self.tracker.on_fail(reason.clone());
                                self.stats.record_resolution(false);
                                metrics::counter!("distbatch_chunks_acked_total", "status" => "failure")
                                    .increment(1);
                                warn!(
                                    correlation_id = %correlation_id,
                                    sequence,
                                    reason = %reason,
                                    "chunk resolved as failed"
                                );
                                ChunkResolution::Resolved
                            }
                        });
                    }
                    Ok(Err(_)) => {
                        // Slot closed without a reply; only possible if the
                        // record was displaced, which register() flags.
                        return Err(BatchError::Other(format!(
                            "reply slot closed for correlation id {correlation_id}"
                        )));
                    }
                    Err(_) => {
                        if self.correlator.take(correlation_id).is_none() {
                            debug!(
                                correlation_id = %correlation_id,
                                "reply raced the timeout; treating as timed out"
                            );
                        }

                        if attempt < self.config.max_retries {
                            attempt += 1;
                            warn!(
                                correlation_id = %correlation_id,
                                sequence,
                                attempt,
                                "reply timeout, resending chunk"
                            );
                            continue;
                        }

                        let waited_ms = self.config.reply_timeout.as_millis() as u64;
                        error!(
                            correlation_id = %correlation_id,
                            sequence,
                            waited_ms,
                            "reply timeout, retries exhausted"
                        );
                        self.tracker.on_fail(format!(
                            "no reply for chunk {sequence} after {waited_ms}ms"
                        ));
                        self.stats.record_resolution(false);
                        return Err(BatchError::ChunkTimeout {
                            correlation_id,
                            sequence,
                            waited_ms,
                        });
                    }
                },
            }
        }
    }
}

/// Resolve once the watch flag turns true; pend forever if the sender is
/// gone (cancellation can then never arrive)
async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
