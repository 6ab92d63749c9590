//! JsonlFileSink - appends result rows to a JSON-lines file

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use contracts::{BatchError, FactorCount, ResultSink};
use tracing::{debug, instrument};

/// Configuration for JsonlFileSink
#[derive(Debug, Clone)]
pub struct JsonlSinkConfig {
    /// Output file path
    pub path: PathBuf,
}

impl JsonlSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        params.get("path").map(|p| Self {
            path: PathBuf::from(p),
        })
    }
}

/// Sink that writes one JSON row per result to a file
///
/// A batch is serialized in memory first and written with a single
/// write + flush, so a failing row never leaves a partial batch behind.
#[derive(Debug)]
pub struct JsonlFileSink {
    name: String,
    file: File,
    rows_written: u64,
}

impl JsonlFileSink {
    /// Create a new JsonlFileSink, creating parent directories as needed
    pub fn new(name: impl Into<String>, config: JsonlSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;
        debug!(path = %config.path.display(), "opened jsonl sink");
        Ok(Self {
            name: name.into(),
            file,
            rows_written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = JsonlSinkConfig::from_params(params).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' parameter")
        })?;
        Self::new(name, config)
    }

    fn encode_batch(&self, batch: &[FactorCount]) -> Result<Vec<u8>, BatchError> {
        let mut buffer = Vec::with_capacity(batch.len() * 32);
        for row in batch {
            serde_json::to_writer(&mut buffer, row)
                .map_err(|e| BatchError::sink_write(&self.name, e.to_string()))?;
            buffer.push(b'\n');
        }
        Ok(buffer)
    }
}

impl ResultSink for JsonlFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "jsonl_sink_append",
        skip(self, batch),
        fields(sink = %self.name, rows = batch.len())
    )]
    async fn append(&mut self, batch: &[FactorCount]) -> Result<(), BatchError> {
        let encoded = self.encode_batch(batch)?;
        self.file
            .write_all(&encoded)
            .and_then(|()| self.file.flush())
            .map_err(|e| BatchError::sink_write(&self.name, e.to_string()))?;
        self.rows_written += batch.len() as u64;
        Ok(())
    }

    #[instrument(name = "jsonl_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), BatchError> {
        self.file
            .flush()
            .map_err(|e| BatchError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "jsonl_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), BatchError> {
        self.file
            .sync_all()
            .map_err(|e| BatchError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, rows = self.rows_written, "JsonlFileSink closed");
        Ok(())
    }
}
