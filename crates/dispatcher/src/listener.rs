//! ReplyListener - inbound reply routing task
//!
//! Owns the replies receiver and feeds every inbound `ChunkResult` through
//! the correlator. Runs until stopped by the shutdown coordinator or until
//! the replies channel closes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace};

use contracts::ChunkResult;

use crate::correlator::Correlator;

/// Counters kept by the listener task
#[derive(Debug, Default)]
pub struct ListenerMetrics {
    /// Replies matched to an outstanding chunk
    matched: AtomicU64,
    /// Replies discarded (unknown or duplicate correlation id)
    discarded: AtomicU64,
}

impl ListenerMetrics {
    /// Get snapshot of both counters
    pub fn snapshot(&self) -> ListenerStats {
        ListenerStats {
            matched: self.matched.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of listener counters
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerStats {
    pub matched: u64,
    pub discarded: u64,
}

/// Handle to the running listener task
pub struct ReplyListenerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    metrics: Arc<ListenerMetrics>,
}

impl ReplyListenerHandle {
    /// Signal the listener to stop accepting replies
    pub fn stop(&self) {
        // Receiver gone means the task already exited
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the listener task to exit and return its counters
    pub async fn join(self) -> ListenerStats {
        if let Err(e) = self.task.await {
            error!(error = ?e, "reply listener task panicked");
        }
        self.metrics.snapshot()
    }

    /// Current counters without stopping the task
    pub fn stats(&self) -> ListenerStats {
        self.metrics.snapshot()
    }
}

/// Reply listener over the inbound channel
pub struct ReplyListener;

impl ReplyListener {
    /// Spawn the listener task
    ///
    /// `poll_interval` is the idle tick used to refresh the in-flight
    /// gauge while no replies arrive.
    pub fn spawn(
        replies: Receiver<ChunkResult>,
        correlator: Arc<Correlator>,
        poll_interval: Duration,
    ) -> ReplyListenerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let metrics = Arc::new(ListenerMetrics::default());
        let task_metrics = Arc::clone(&metrics);

        let task = tokio::spawn(async move {
            listener_loop(replies, correlator, stop_rx, task_metrics, poll_interval).await;
        });

        ReplyListenerHandle {
            stop_tx,
            task,
            metrics,
        }
    }
}

#[instrument(name = "reply_listener_loop", skip_all)]
async fn listener_loop(
    replies: Receiver<ChunkResult>,
    correlator: Arc<Correlator>,
    mut stop_rx: watch::Receiver<bool>,
    metrics: Arc<ListenerMetrics>,
    poll_interval: Duration,
) {
    debug!("reply listener started");

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    break;
                }
            }
            received = replies.recv() => {
                match received {
                    Ok(result) => {
                        if correlator.match_reply(result) {
                            metrics.matched.fetch_add(1, Ordering::Relaxed);
                        } else {
                            metrics.discarded.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(_) => {
                        debug!("replies channel closed");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(poll_interval) => {
                trace!(pending = correlator.len(), "listener idle tick");
                metrics::gauge!("distbatch_inflight_chunks").set(correlator.len() as f64);
            }
        }
    }

    let stats = metrics.snapshot();
    debug!(
        matched = stats.matched,
        discarded = stats.discarded,
        "reply listener stopped"
    );
}
