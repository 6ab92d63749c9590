//! Layered error definitions
//!
//! Categorized by source: config / source / protocol / worker / shutdown

use thiserror::Error;

use crate::CorrelationId;

/// Unified error type
#[derive(Debug, Error)]
pub enum BatchError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Input cannot be read; fatal, the job aborts immediately
    #[error("source read error at line {line}: {message}")]
    SourceRead { line: u64, message: String },

    // ===== Protocol Errors =====
    /// No ack arrived for a dispatched chunk within the reply timeout
    #[error(
        "chunk timeout: no reply for correlation id {correlation_id} \
         (chunk sequence {sequence}) after {waited_ms}ms"
    )]
    ChunkTimeout {
        correlation_id: CorrelationId,
        sequence: u64,
        waited_ms: u64,
    },

    // ===== Worker Errors =====
    /// Item processing failed; contained, fails the whole chunk
    #[error("item processing error for {item}: {message}")]
    ItemProcessing { item: i64, message: String },

    /// Sink append failed; contained, fails the whole chunk
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== Shutdown Errors =====
    /// A resource could not be disposed; logged, never aborts shutdown
    #[error("failed to dispose '{resource}': {message}")]
    Disposal { resource: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl BatchError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source read error
    pub fn source_read(line: u64, message: impl Into<String>) -> Self {
        Self::SourceRead {
            line,
            message: message.into(),
        }
    }

    /// Create item processing error
    pub fn item_processing(item: i64, message: impl Into<String>) -> Self {
        Self::ItemProcessing {
            item,
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create disposal error
    pub fn disposal(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Disposal {
            resource: resource.into(),
            message: message.into(),
        }
    }
}
