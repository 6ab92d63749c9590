//! Per-chunk item processing
//!
//! Applies the item processor to every item of a chunk in order. The first
//! failure discards the whole chunk's results; nothing is handed to the
//! sink for a failed chunk.

use contracts::{BatchError, Chunk, FactorCount, ItemProcessor};

/// Process every item of `chunk` in order
///
/// # Errors
/// Returns the first [`BatchError::ItemProcessing`] encountered; results
/// computed before the failure are dropped with it.
pub fn process_items<P: ItemProcessor>(
    processor: &P,
    chunk: &Chunk,
) -> Result<Vec<FactorCount>, BatchError> {
    let mut rows = Vec::with_capacity(chunk.len());
    for &item in &chunk.items {
        let count = processor.process(item)?;
        rows.push(FactorCount {
            number: item,
            count,
        });
    }
    Ok(rows)
}
