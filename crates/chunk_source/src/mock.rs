//! VecItemReader - in-memory reader for tests and demos

use contracts::{BatchError, Item, ItemReader};

/// Yields items from an in-memory list, optionally failing at a given
/// position to exercise the fatal-source-error path.
pub struct VecItemReader {
    items: std::vec::IntoIter<Item>,
    position: u64,
    fail_at: Option<u64>,
}

impl VecItemReader {
    /// Reader over the given items
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into_iter(),
            position: 0,
            fail_at: None,
        }
    }

    /// Reader that fails with a `SourceRead` error at the given 0-based
    /// read position
    pub fn failing_at(items: Vec<Item>, position: u64) -> Self {
        Self {
            items: items.into_iter(),
            position: 0,
            fail_at: Some(position),
        }
    }
}

impl ItemReader for VecItemReader {
    fn read(&mut self) -> Result<Option<Item>, BatchError> {
        if self.fail_at == Some(self.position) {
            return Err(BatchError::source_read(
                self.position + 1,
                "injected read failure",
            ));
        }
        self.position += 1;
        Ok(self.items.next())
    }
}
