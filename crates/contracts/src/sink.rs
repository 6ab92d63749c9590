//! ResultSink trait - Worker output interface
//!
//! Defines the abstract interface for result sinks.

use crate::{BatchError, FactorCount};

/// Durable, batched result output trait
///
/// All sink implementations must implement this trait. A batch commits as
/// one unit; a partial chunk write is not a valid end state.
#[trait_variant::make(ResultSink: Send)]
pub trait LocalResultSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one chunk's results as a single transactional batch
    ///
    /// # Errors
    /// Returns write error (should include context); the caller treats it
    /// as a whole-chunk failure.
    async fn append(&mut self, batch: &[FactorCount]) -> Result<(), BatchError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), BatchError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), BatchError>;
}
