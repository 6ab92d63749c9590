//! LogSink - logs batch summaries via tracing

use contracts::{BatchError, FactorCount, ResultSink};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
    rows_written: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows_written: 0,
        }
    }
}

impl ResultSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_append",
        skip(self, batch),
        fields(sink = %self.name, rows = batch.len())
    )]
    async fn append(&mut self, batch: &[FactorCount]) -> Result<(), BatchError> {
        self.rows_written += batch.len() as u64;
        info!(
            sink = %self.name,
            rows = batch.len(),
            total = self.rows_written,
            "batch received"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), BatchError> {
        // Nothing buffered
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), BatchError> {
        info!(sink = %self.name, rows = self.rows_written, "LogSink closed");
        Ok(())
    }
}
