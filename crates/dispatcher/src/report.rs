//! JobReport - final accounting returned by the dispatcher

use observability::JobMetricsAggregator;

use crate::completion::JobState;

/// Terminal outcome of a job run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every chunk acknowledged successfully
    Success,
    /// The run resolved but must not be treated as clean
    /// (contained chunk failures, or operator cancellation)
    Failed(String),
}

impl JobOutcome {
    /// True for `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

/// Final accounting for one job run
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Terminal outcome
    pub outcome: JobOutcome,

    /// Chunks handed to the transport
    pub dispatched: u64,

    /// Chunks acknowledged as committed
    pub acked: u64,

    /// Chunks that resolved as failures
    pub failed: u64,

    /// Reasons for every failed chunk, in arrival order
    pub failure_reasons: Vec<String>,

    /// Protocol metrics gathered during the run (round trips, retries)
    pub metrics: JobMetricsAggregator,
}

impl JobReport {
    /// Build a report from final tracker state
    pub fn from_state(
        state: &JobState,
        failure_reasons: Vec<String>,
        metrics: JobMetricsAggregator,
    ) -> Self {
        let outcome = if state.failed == 0 {
            JobOutcome::Success
        } else {
            JobOutcome::Failed(format!(
                "{} of {} chunks failed",
                state.failed, state.dispatched
            ))
        };
        Self {
            outcome,
            dispatched: state.dispatched,
            acked: state.acked,
            failed: state.failed,
            failure_reasons,
            metrics,
        }
    }

    /// Build a cancellation report from final tracker state
    pub fn cancelled(
        state: &JobState,
        failure_reasons: Vec<String>,
        metrics: JobMetricsAggregator,
    ) -> Self {
        Self {
            outcome: JobOutcome::Failed("job cancelled".to_string()),
            dispatched: state.dispatched,
            acked: state.acked,
            failed: state.failed,
            failure_reasons,
            metrics,
        }
    }
}
