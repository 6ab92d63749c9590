//! Job metrics aggregation
//!
//! Protocol code records events through the `metrics` facade as they
//! happen; this module additionally aggregates them in memory so the CLI
//! can print an end-of-run summary without scraping the exporter.

use std::fmt;

/// In-memory aggregation of one job run
#[derive(Debug, Clone, Default)]
pub struct JobMetricsAggregator {
    /// Chunks dispatched (including resends)
    pub chunks_dispatched: u64,

    /// Chunks acknowledged as committed
    pub chunks_acked: u64,

    /// Chunks that resolved as failures
    pub chunks_failed: u64,

    /// Resends after a reply timeout
    pub retries: u64,

    /// Replies discarded as unknown or duplicate
    pub replies_discarded: u64,

    /// Items committed by workers
    pub items_processed: u64,

    /// Round-trip latency statistics (ms)
    pub round_trip_ms: RunningStats,
}

impl JobMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatch attempt
    pub fn record_dispatch(&mut self, is_retry: bool) {
        self.chunks_dispatched += 1;
        if is_retry {
            self.retries += 1;
        }
    }

    /// Record a resolved chunk
    pub fn record_resolution(&mut self, success: bool) {
        if success {
            self.chunks_acked += 1;
        } else {
            self.chunks_failed += 1;
        }
    }

    /// Record one chunk round trip in milliseconds
    pub fn record_round_trip_ms(&mut self, latency_ms: f64) {
        self.round_trip_ms.push(latency_ms);
    }

    /// Record committed items
    pub fn record_items(&mut self, count: u64) {
        self.items_processed += count;
    }

    /// Record discarded replies
    pub fn record_discarded(&mut self, count: u64) {
        self.replies_discarded += count;
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            chunks_dispatched: self.chunks_dispatched,
            chunks_acked: self.chunks_acked,
            chunks_failed: self.chunks_failed,
            retries: self.retries,
            replies_discarded: self.replies_discarded,
            items_processed: self.items_processed,
            failure_rate: if self.chunks_dispatched > 0 {
                self.chunks_failed as f64 / self.chunks_dispatched as f64 * 100.0
            } else {
                0.0
            },
            round_trip_ms: StatsSummary::from(&self.round_trip_ms),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub chunks_dispatched: u64,
    pub chunks_acked: u64,
    pub chunks_failed: u64,
    pub retries: u64,
    pub replies_discarded: u64,
    pub items_processed: u64,
    pub failure_rate: f64,
    pub round_trip_ms: StatsSummary,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Job Metrics Summary ===")?;
        writeln!(f, "Chunks dispatched: {}", self.chunks_dispatched)?;
        writeln!(f, "Chunks acked: {}", self.chunks_acked)?;
        writeln!(
            f,
            "Chunks failed: {} ({:.2}%)",
            self.chunks_failed, self.failure_rate
        )?;
        writeln!(f, "Retries: {}", self.retries)?;
        writeln!(f, "Replies discarded: {}", self.replies_discarded)?;
        writeln!(f, "Items processed: {}", self.items_processed)?;
        writeln!(f, "Round trip (ms): {}", self.round_trip_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Minimum observed value
    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    /// Maximum observed value
    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Mean value
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0] {
            stats.push(value);
        }
        assert_eq!(stats.count(), 4);
        assert_eq!(stats.min(), 1.0);
        assert_eq!(stats.max(), 4.0);
        assert!((stats.mean() - 2.5).abs() < 1e-9);
        assert!((stats.std_dev() - 1.2909944487).abs() < 1e-6);
    }

    #[test]
    fn test_empty_stats_display() {
        let summary = StatsSummary::from(&RunningStats::default());
        assert_eq!(summary.to_string(), "N/A");
    }

    #[test]
    fn test_aggregator_summary() {
        let mut aggregator = JobMetricsAggregator::new();
        aggregator.record_dispatch(false);
        aggregator.record_dispatch(false);
        aggregator.record_dispatch(true);
        aggregator.record_resolution(true);
        aggregator.record_resolution(false);
        aggregator.record_items(20);
        aggregator.record_round_trip_ms(10.0);

        let summary = aggregator.summary();
        assert_eq!(summary.chunks_dispatched, 3);
        assert_eq!(summary.retries, 1);
        assert_eq!(summary.chunks_failed, 1);
        assert_eq!(summary.items_processed, 20);
        assert!(summary.failure_rate > 0.0);
    }

    #[test]
    fn test_reset() {
        let mut aggregator = JobMetricsAggregator::new();
        aggregator.record_dispatch(false);
        aggregator.reset();
        assert_eq!(aggregator.summary().chunks_dispatched, 0);
    }
}
