//! JobBlueprint - Config Loader output
//!
//! Describes one complete job run: chunking parameters, timing budgets,
//! worker pool size, input source, result sinks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete job configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Chunking, timing, and pool settings
    #[serde(default)]
    pub job: JobConfig,

    /// Input source settings
    pub input: InputConfig,

    /// Result sink configurations
    pub sinks: Vec<SinkConfig>,
}

/// Chunking, timing, and pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Items per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Master-side budget for one correlated reply (ms)
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Worker-side budget for handing a reply to the transport (ms)
    #[serde(default = "default_reply_send_timeout_ms")]
    pub reply_send_timeout_ms: u64,

    /// Reply listener idle poll tick (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Grace window absorbing in-flight replies before teardown (ms)
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Worker pool size
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Resends of an unacknowledged chunk before the job fails.
    /// 0 = timeout is fatal on the first miss.
    #[serde(default)]
    pub max_retries: u32,

    /// Bounded depth of the requests/replies channels
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_chunk_size() -> usize {
    10
}

fn default_reply_timeout_ms() -> u64 {
    2000
}

fn default_reply_send_timeout_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_shutdown_grace_ms() -> u64 {
    10_000
}

fn default_worker_count() -> usize {
    4
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            reply_timeout_ms: default_reply_timeout_ms(),
            reply_send_timeout_ms: default_reply_send_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            worker_count: default_worker_count(),
            max_retries: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl JobConfig {
    /// Reply timeout as a [`Duration`]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Reply send budget as a [`Duration`]
    pub fn reply_send_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_send_timeout_ms)
    }

    /// Listener poll tick as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shutdown grace window as a [`Duration`]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Input source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the flat input file
    pub path: PathBuf,

    /// Field delimiter within a record
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    "\t".to_string()
}

/// Result sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Unique sink name
    pub name: String,

    /// Sink implementation selector
    pub sink_type: SinkType,

    /// Sink specific parameters (e.g. `path` for jsonl)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    Log,
    Jsonl,
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_config_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.reply_timeout_ms, 2000);
        assert_eq!(config.reply_send_timeout_ms, 3000);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.shutdown_grace_ms, 10_000);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_blueprint_deserializes_with_defaults() {
        let json = r#"{
            "input": { "path": "primes.tsv" },
            "sinks": [{ "name": "rows", "sink_type": "log" }]
        }"#;
        let blueprint: JobBlueprint = serde_json::from_str(json).unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.job.chunk_size, 10);
        assert_eq!(blueprint.input.delimiter, "\t");
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_durations() {
        let config = JobConfig {
            reply_timeout_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.reply_timeout(), Duration::from_millis(250));
    }
}
