//! Run statistics and summary printing.

use std::time::Duration;

use dispatcher::{JobOutcome, JobReport, ListenerStats};
use observability::JobMetricsAggregator;
use worker::PoolMetricsSnapshot;

/// Statistics from one job run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Final dispatcher accounting
    pub report: JobReport,

    /// Worker pool counters at teardown
    pub pool: PoolMetricsSnapshot,

    /// Reply listener counters at teardown
    pub listener: ListenerStats,

    /// Number of workers that served the run
    pub worker_count: usize,

    /// Total duration including the drain window
    pub duration: Duration,
}

impl RunStats {
    /// Chunk throughput over the whole run
    pub fn chunks_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.report.dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Protocol metrics completed with the worker/listener counters the
    /// dispatcher could not observe
    pub fn job_metrics(&self) -> JobMetricsAggregator {
        let mut metrics = self.report.metrics.clone();
        metrics.record_items(self.pool.items_processed);
        metrics.record_discarded(self.listener.discarded);
        metrics
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Job Summary ===\n");

        let outcome = match &self.report.outcome {
            JobOutcome::Success => "Success".to_string(),
            JobOutcome::Failed(reason) => format!("Failed ({reason})"),
        };
        println!("Outcome: {outcome}");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Workers: {}", self.worker_count);

        println!("\nChunks");
        println!("  dispatched: {}", self.report.dispatched);
        println!("  acked:      {}", self.report.acked);
        println!("  failed:     {}", self.report.failed);
        println!("  rate:       {:.2} chunks/s", self.chunks_per_sec());

        println!("\nWorkers");
        println!("  chunks committed: {}", self.pool.chunks_processed);
        println!("  chunks failed:    {}", self.pool.chunks_failed);
        println!("  items processed:  {}", self.pool.items_processed);
        println!("  replies dropped:  {}", self.pool.replies_dropped);

        println!("\nListener");
        println!("  replies matched:   {}", self.listener.matched);
        println!("  replies discarded: {}", self.listener.discarded);

        println!("\n{}", self.job_metrics().summary());

        if !self.report.failure_reasons.is_empty() {
            println!("\nFailure reasons");
            for reason in &self.report.failure_reasons {
                println!("  - {reason}");
            }
        }

        println!();
    }
}
