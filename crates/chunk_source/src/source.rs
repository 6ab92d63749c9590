//! ChunkSource - groups items into fixed-size chunks

use contracts::{BatchError, Chunk, ChunkFeed, ItemReader};
use tracing::{instrument, trace};

/// Lazy, finite, ordered chunk producer over an [`ItemReader`].
///
/// Buffers exactly one chunk's worth of items before emitting; the final
/// chunk may be partial. Sequence numbers start at 0 and increase by one
/// per emitted chunk. Single consumer, no rewind.
pub struct ChunkSource<R: ItemReader> {
    reader: R,
    chunk_size: usize,
    next_sequence: u64,
    exhausted: bool,
    items_read: u64,
}

impl<R: ItemReader> ChunkSource<R> {
    /// Create a source emitting chunks of at most `chunk_size` items
    ///
    /// `chunk_size` must be >= 1; the config validator enforces this for
    /// blueprint-driven runs.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size >= 1, "chunk_size must be >= 1");
        Self {
            reader,
            chunk_size,
            next_sequence: 0,
            exhausted: false,
            items_read: 0,
        }
    }

    /// Chunks emitted so far
    pub fn chunks_emitted(&self) -> u64 {
        self.next_sequence
    }

    /// Items read so far
    pub fn items_read(&self) -> u64 {
        self.items_read
    }
}

impl<R: ItemReader> ChunkFeed for ChunkSource<R> {
    #[instrument(name = "chunk_source_next", skip(self), fields(sequence = self.next_sequence))]
    fn next_chunk(&mut self) -> Result<Option<Chunk>, BatchError> {
        if self.exhausted {
            return Ok(None);
        }

        let mut items = Vec::with_capacity(self.chunk_size);
        while items.len() < self.chunk_size {
            match self.reader.read()? {
                Some(item) => {
                    items.push(item);
                    self.items_read += 1;
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }

        if items.is_empty() {
            return Ok(None);
        }

        let chunk = Chunk::new(self.next_sequence, items);
        self.next_sequence += 1;
        trace!(sequence = chunk.sequence, items = chunk.len(), "chunk assembled");
        Ok(Some(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VecItemReader;

    fn collect_chunks(items: Vec<i64>, chunk_size: usize) -> Vec<Chunk> {
        let mut source = ChunkSource::new(VecItemReader::new(items), chunk_size);
        let mut chunks = Vec::new();
        while let Some(chunk) = source.next_chunk().unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn test_partition_properties() {
        // number of chunks = ceil(L/C), last chunk = L mod C (or C),
        // total items = L, order preserved
        for (len, chunk_size) in [(0usize, 3usize), (1, 3), (3, 3), (4, 3), (9, 3), (10, 3)] {
            let items: Vec<i64> = (0..len as i64).collect();
            let chunks = collect_chunks(items.clone(), chunk_size);

            assert_eq!(chunks.len(), len.div_ceil(chunk_size), "len={len}");
            if let Some(last) = chunks.last() {
                let expected = if len % chunk_size == 0 {
                    chunk_size
                } else {
                    len % chunk_size
                };
                assert_eq!(last.len(), expected, "len={len}");
            }

            let flattened: Vec<i64> = chunks.iter().flat_map(|c| c.items.clone()).collect();
            assert_eq!(flattened, items, "len={len}");
        }
    }

    #[test]
    fn test_sequence_numbers_are_contiguous() {
        let chunks = collect_chunks((0..25).collect(), 10);
        let sequences: Vec<u64> = chunks.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let mut source = ChunkSource::new(VecItemReader::new(vec![]), 10);
        assert!(source.next_chunk().unwrap().is_none());
        // Stays exhausted on repeat polls
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_read_error_propagates() {
        let mut source = ChunkSource::new(VecItemReader::failing_at(vec![1, 2, 3], 2), 10);
        assert!(source.next_chunk().is_err());
    }

    #[test]
    fn test_counters() {
        let mut source = ChunkSource::new(VecItemReader::new((0..7).collect()), 3);
        while source.next_chunk().unwrap().is_some() {}
        assert_eq!(source.chunks_emitted(), 3);
        assert_eq!(source.items_read(), 7);
    }
}
