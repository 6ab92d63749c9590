//! Chunk envelopes - Dispatcher/Worker wire types
//!
//! A chunk is a bounded batch of items processed as one atomic unit of
//! remote work.

use serde::{Deserialize, Serialize};

use crate::CorrelationId;

/// A single unit of input. No identity beyond value + position.
pub type Item = i64;

/// Ordered batch of items, tagged with its creation sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Monotonically increasing, assigned at creation, unique per job run
    pub sequence: u64,

    /// Items in source order
    pub items: Vec<Item>,
}

impl Chunk {
    /// Create a chunk from a sequence number and items
    pub fn new(sequence: u64, items: Vec<Item>) -> Self {
        Self { sequence, items }
    }

    /// Number of items in the chunk
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the chunk carries no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Outbound envelope on the requests channel (master -> worker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    /// Binds this dispatch attempt to its eventual reply
    pub correlation_id: CorrelationId,

    /// The chunk payload
    pub chunk: Chunk,
}

/// Terminal status of one processed chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkStatus {
    /// Every item processed and the batch committed
    Success,
    /// Processing or commit failed; nothing from the chunk was committed
    Failure(String),
}

impl ChunkStatus {
    /// True for `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, ChunkStatus::Success)
    }
}

/// Inbound envelope on the replies channel (worker -> master)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Correlation id copied from the request
    pub correlation_id: CorrelationId,

    /// Number of items the worker received in the chunk
    pub item_count: usize,

    /// Outcome for the whole chunk
    pub status: ChunkStatus,
}

impl ChunkResult {
    /// Successful result for a chunk of `item_count` items
    pub fn success(correlation_id: CorrelationId, item_count: usize) -> Self {
        Self {
            correlation_id,
            item_count,
            status: ChunkStatus::Success,
        }
    }

    /// Failed result carrying the failure reason
    pub fn failure(
        correlation_id: CorrelationId,
        item_count: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id,
            item_count,
            status: ChunkStatus::Failure(reason.into()),
        }
    }
}

/// One output row: an input number and its prime-factor count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorCount {
    /// The input number
    pub number: Item,

    /// Count of prime factors, or the domain sentinel for values below 2
    pub count: i64,
}
