//! ItemReader / ChunkFeed traits - input side interfaces
//!
//! `ItemReader` yields one item at a time from a sequential resource;
//! `ChunkFeed` groups items into chunks for the dispatcher. Both are
//! single-pass, single-consumer.

use crate::{BatchError, Chunk, Item};

/// Sequential item source
///
/// One pass only; there is no rewind. A read failure is fatal for the job.
pub trait ItemReader: Send {
    /// Read the next item, or `None` once the input is exhausted
    ///
    /// # Errors
    /// Returns [`BatchError::SourceRead`] if the underlying input cannot
    /// be read or a record does not parse.
    fn read(&mut self) -> Result<Option<Item>, BatchError>;
}

/// Chunk producer consumed by the dispatcher
pub trait ChunkFeed: Send {
    /// Produce the next chunk, or `None` at end of input
    fn next_chunk(&mut self) -> Result<Option<Chunk>, BatchError>;
}
