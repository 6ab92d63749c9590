//! ItemProcessor trait - the per-item workload
//!
//! Pure, synchronous, no side effects beyond the return value. Workers
//! apply it to every item of a chunk in order.

use crate::{BatchError, Item};

/// Per-item computation
pub trait ItemProcessor: Send + Sync {
    /// Compute the result for one item
    ///
    /// # Errors
    /// An error fails the whole chunk the item belongs to; nothing from
    /// that chunk is committed.
    fn process(&self, item: Item) -> Result<i64, BatchError>;
}
