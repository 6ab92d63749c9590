//! CompletionTracker - chunk accounting and the job-done predicate
//!
//! The sole authority the dispatcher and shutdown coordinator consult to
//! decide job termination. All counters live under one mutex so the
//! completion predicate is evaluated atomically with respect to
//! concurrent acks.

use std::sync::Mutex;

use tracing::trace;

/// Counters for one job run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobState {
    /// Chunks handed to the transport
    pub dispatched: u64,

    /// Chunks acknowledged as processed and committed
    pub acked: u64,

    /// Chunks acknowledged as failed (contained failures)
    pub failed: u64,

    /// True once the chunk source reported end of input
    pub source_exhausted: bool,
}

impl JobState {
    fn is_complete(&self) -> bool {
        self.source_exhausted && self.dispatched == self.acked + self.failed
    }
}

/// Thread-safe job completion tracker
#[derive(Debug, Default)]
pub struct CompletionTracker {
    state: Mutex<JobState>,
    failure_reasons: Mutex<Vec<String>>,
}

impl CompletionTracker {
    /// Create a tracker with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatched chunk
    pub fn on_dispatch(&self) {
        let mut state = self.state.lock().expect("tracker lock poisoned");
        state.dispatched += 1;
        trace!(dispatched = state.dispatched, "chunk dispatched");
    }

    /// Record one successfully acknowledged chunk
    pub fn on_ack(&self) {
        let mut state = self.state.lock().expect("tracker lock poisoned");
        state.acked += 1;
        debug_assert!(
            state.acked + state.failed <= state.dispatched,
            "ack/fail counters exceeded dispatched"
        );
    }

    /// Record one failed-but-resolved chunk
    pub fn on_fail(&self, reason: impl Into<String>) {
        {
            let mut state = self.state.lock().expect("tracker lock poisoned");
            state.failed += 1;
            debug_assert!(
                state.acked + state.failed <= state.dispatched,
                "ack/fail counters exceeded dispatched"
            );
        }
        self.failure_reasons
            .lock()
            .expect("tracker lock poisoned")
            .push(reason.into());
    }

    /// Record that the chunk source is exhausted
    pub fn mark_source_exhausted(&self) {
        let mut state = self.state.lock().expect("tracker lock poisoned");
        state.source_exhausted = true;
    }

    /// True once the source is exhausted and every dispatched chunk has
    /// been acked or failed
    pub fn is_complete(&self) -> bool {
        self.state.lock().expect("tracker lock poisoned").is_complete()
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> JobState {
        self.state.lock().expect("tracker lock poisoned").clone()
    }

    /// Reasons recorded by [`Self::on_fail`], in arrival order
    pub fn failure_reasons(&self) -> Vec<String> {
        self.failure_reasons
            .lock()
            .expect("tracker lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_not_complete_until_exhausted() {
        let tracker = CompletionTracker::new();
        tracker.on_dispatch();
        tracker.on_ack();
        assert!(!tracker.is_complete());

        tracker.mark_source_exhausted();
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_not_complete_while_outstanding() {
        let tracker = CompletionTracker::new();
        tracker.mark_source_exhausted();
        tracker.on_dispatch();
        assert!(!tracker.is_complete());

        tracker.on_fail("worker unreachable");
        assert!(tracker.is_complete());
        assert_eq!(tracker.failure_reasons(), vec!["worker unreachable"]);
    }

    #[test]
    fn test_empty_exhausted_job_is_complete() {
        let tracker = CompletionTracker::new();
        tracker.mark_source_exhausted();
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_snapshot_counts() {
        let tracker = CompletionTracker::new();
        for _ in 0..3 {
            tracker.on_dispatch();
        }
        tracker.on_ack();
        tracker.on_fail("boom");

        let state = tracker.snapshot();
        assert_eq!(state.dispatched, 3);
        assert_eq!(state.acked, 1);
        assert_eq!(state.failed, 1);
        assert!(!state.source_exhausted);
    }

    #[test]
    fn test_complete_under_random_ack_orderings() {
        use rand::seq::SliceRandom;

        let mut rng = rand::rng();
        for _ in 0..50 {
            let tracker = Arc::new(CompletionTracker::new());
            let total = 20u64;

            for _ in 0..total {
                tracker.on_dispatch();
            }
            tracker.mark_source_exhausted();

            // Resolve every chunk in a random order from worker threads
            let mut order: Vec<u64> = (0..total).collect();
            order.shuffle(&mut rng);

            let handles: Vec<_> = order
                .into_iter()
                .map(|i| {
                    let tracker = Arc::clone(&tracker);
                    std::thread::spawn(move || {
                        if i % 5 == 0 {
                            tracker.on_fail(format!("chunk {i} failed"));
                        } else {
                            tracker.on_ack();
                        }
                    })
                })
                .collect();

            let mut complete_seen_early = false;
            for handle in handles {
                // Predicate may flip only once everything resolved
                if tracker.is_complete() {
                    let state = tracker.snapshot();
                    if state.acked + state.failed != total {
                        complete_seen_early = true;
                    }
                }
                handle.join().unwrap();
            }

            assert!(!complete_seen_early);
            assert!(tracker.is_complete());
            let state = tracker.snapshot();
            assert_eq!(state.acked + state.failed, state.dispatched);
        }
    }
}
