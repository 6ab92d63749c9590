//! Sink implementations
//!
//! Contains LogSink, JsonlFileSink, and MemorySink.

mod jsonl;
mod log;
mod memory;

pub use self::jsonl::JsonlFileSink;
pub use self::log::LogSink;
pub use self::memory::{MemorySink, MemorySinkHandle, SharedRows};
