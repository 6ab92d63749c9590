//! ShutdownCoordinator - ordered post-completion teardown
//!
//! One-shot state machine `Running -> Draining -> Stopped`. Draining keeps
//! the reply listener open for a grace window so replies already in flight
//! when completion was detected are absorbed (and discarded by the
//! correlator as unknown). Teardown then stops the inbound listener first
//! and walks the disposal list in reverse-acquisition order.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use contracts::Disposable;

use crate::listener::{ListenerStats, ReplyListenerHandle};

/// Coordinator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Stopped,
}

/// What the teardown observed
#[derive(Debug)]
pub struct ShutdownSummary {
    /// How long the drain window was held open
    pub drained_for: Duration,

    /// Listener counters at teardown
    pub listener: ListenerStats,

    /// Resources whose disposal failed (logged, not fatal)
    pub disposal_errors: usize,
}

/// Ordered teardown of one job run's resources
pub struct ShutdownCoordinator {
    grace: Duration,
    listener: ReplyListenerHandle,
    disposables: Vec<Box<dyn Disposable>>,
    state: ShutdownState,
}

impl ShutdownCoordinator {
    /// Create a coordinator holding the reply listener open for `grace`
    pub fn new(grace: Duration, listener: ReplyListenerHandle) -> Self {
        Self {
            grace,
            listener,
            disposables: Vec::new(),
            state: ShutdownState::Running,
        }
    }

    /// Register a resource in acquisition order
    ///
    /// Disposal happens in the reverse of registration order.
    pub fn register(&mut self, disposable: Box<dyn Disposable>) {
        self.disposables.push(disposable);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// Drain stragglers, then release everything
    ///
    /// Irreversible; call once the completion tracker reports the job
    /// done (or after a fatal error / cancellation).
    #[instrument(name = "shutdown_run", skip(self), fields(grace_ms = self.grace.as_millis() as u64))]
    pub async fn run(mut self) -> ShutdownSummary {
        self.state = ShutdownState::Draining;
        info!(grace_ms = self.grace.as_millis() as u64, "draining in-flight replies");

        let drain_started = Instant::now();
        tokio::time::sleep(self.grace).await;
        let drained_for = drain_started.elapsed();

        // Stop ingestion before releasing anything else
        self.listener.stop();
        let listener = self.listener.join().await;

        let mut disposal_errors = 0;
        for mut disposable in self.disposables.into_iter().rev() {
            let name = disposable.name().to_string();
            if let Err(e) = disposable.dispose().await {
                disposal_errors += 1;
                warn!(resource = %name, error = %e, "failed to dispose resource");
            } else {
                info!(resource = %name, "resource disposed");
            }
        }

        self.state = ShutdownState::Stopped;
        info!(
            matched = listener.matched,
            discarded = listener.discarded,
            disposal_errors,
            "shutdown complete"
        );

        ShutdownSummary {
            drained_for,
            listener,
            disposal_errors,
        }
    }
}
