//! Configuration validation
//!
//! Validation rules:
//! - chunk_size, worker_count, channel_capacity >= 1
//! - timing budgets > 0
//! - input path non-empty, delimiter a single character
//! - exactly one sink, with a non-empty name
//! - jsonl sinks carry a `path` parameter

use contracts::{BatchError, JobBlueprint, SinkType};

/// Validate a JobBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &JobBlueprint) -> Result<(), BatchError> {
    validate_job(blueprint)?;
    validate_input(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Validate chunking/timing/pool settings
fn validate_job(blueprint: &JobBlueprint) -> Result<(), BatchError> {
    let job = &blueprint.job;

    if job.chunk_size == 0 {
        return Err(BatchError::config_validation(
            "job.chunk_size",
            "chunk_size must be >= 1",
        ));
    }
    if job.worker_count == 0 {
        return Err(BatchError::config_validation(
            "job.worker_count",
            "worker_count must be >= 1",
        ));
    }
    if job.channel_capacity == 0 {
        return Err(BatchError::config_validation(
            "job.channel_capacity",
            "channel_capacity must be >= 1",
        ));
    }
    if job.reply_timeout_ms == 0 {
        return Err(BatchError::config_validation(
            "job.reply_timeout_ms",
            "reply_timeout_ms must be > 0",
        ));
    }
    if job.reply_send_timeout_ms == 0 {
        return Err(BatchError::config_validation(
            "job.reply_send_timeout_ms",
            "reply_send_timeout_ms must be > 0",
        ));
    }
    if job.poll_interval_ms == 0 {
        return Err(BatchError::config_validation(
            "job.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// Validate input settings
fn validate_input(blueprint: &JobBlueprint) -> Result<(), BatchError> {
    let input = &blueprint.input;

    if input.path.as_os_str().is_empty() {
        return Err(BatchError::config_validation(
            "input.path",
            "input path cannot be empty",
        ));
    }
    if input.delimiter.chars().count() != 1 {
        return Err(BatchError::config_validation(
            "input.delimiter",
            format!("delimiter must be one character, got {:?}", input.delimiter),
        ));
    }
    Ok(())
}

/// Validate sink configuration
///
/// Chunk atomicity is defined against a single durable stream, so exactly
/// one sink must be configured.
fn validate_sinks(blueprint: &JobBlueprint) -> Result<(), BatchError> {
    if blueprint.sinks.len() != 1 {
        return Err(BatchError::config_validation(
            "sinks",
            format!("exactly one sink required, got {}", blueprint.sinks.len()),
        ));
    }

    let sink = &blueprint.sinks[0];
    if sink.name.is_empty() {
        return Err(BatchError::config_validation(
            "sinks[0].name",
            "sink name cannot be empty",
        ));
    }
    if sink.sink_type == SinkType::Jsonl && !sink.params.contains_key("path") {
        return Err(BatchError::config_validation(
            format!("sinks[name={}].params.path", sink.name),
            "jsonl sink requires a 'path' parameter",
        ));
    }
    Ok(())
}
