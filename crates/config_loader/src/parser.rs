//! Configuration parsing
//!
//! Supports TOML (primary) and JSON (secondary) formats.

use contracts::{BatchError, JobBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<JobBlueprint, BatchError> {
    toml::from_str(content).map_err(|e| BatchError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<JobBlueprint, BatchError> {
    serde_json::from_str(content).map_err(|e| BatchError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<JobBlueprint, BatchError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[job]
chunk_size = 5
reply_timeout_ms = 500
worker_count = 2
max_retries = 1

[input]
path = "data/primes.tsv"
delimiter = "\t"

[[sinks]]
name = "rows"
sink_type = "jsonl"
[sinks.params]
path = "out/factors.jsonl"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let blueprint = result.unwrap();
        assert_eq!(blueprint.job.chunk_size, 5);
        assert_eq!(blueprint.job.max_retries, 1);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Jsonl);
        assert_eq!(
            blueprint.sinks[0].params.get("path").map(String::as_str),
            Some("out/factors.jsonl")
        );
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "input": { "path": "primes.tsv" },
            "sinks": [{ "name": "rows", "sink_type": "memory" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let blueprint = result.unwrap();
        assert_eq!(blueprint.job.worker_count, 4);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Memory);
    }

    #[test]
    fn test_parse_toml_invalid() {
        let result = parse_toml("job = nonsense");
        assert!(result.is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("JSON"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
