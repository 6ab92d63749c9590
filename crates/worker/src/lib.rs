//! # Worker
//!
//! Remote side of the chunking protocol: a pool of tasks pulls chunk
//! requests from the shared work channel, applies the item processor to
//! every item in order, commits the chunk's results to the sink as one
//! batch, and answers with exactly one correlated [`contracts::ChunkResult`]
//! per request.
//!
//! The work channel is the only mutual exclusion between workers: a chunk
//! is delivered to exactly one of them.

mod chunk_processor;
mod pool;
mod processor;
pub mod sinks;

pub use chunk_processor::process_items;
pub use pool::{PoolMetricsSnapshot, WorkerPool, WorkerPoolMetrics};
pub use processor::{BelowTwoPolicy, PrimeFactors};
