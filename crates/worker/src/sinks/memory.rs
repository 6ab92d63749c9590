//! MemorySink - collects rows in memory for tests and inspection

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{BatchError, FactorCount, ResultSink};

/// Shared handle to the rows a [`MemorySink`] committed
pub type SharedRows = Arc<Mutex<Vec<FactorCount>>>;

/// Observer handle for a [`MemorySink`] that outlives the sink itself
#[derive(Debug, Clone, Default)]
pub struct MemorySinkHandle {
    rows: SharedRows,
    batches: Arc<AtomicU64>,
}

impl MemorySinkHandle {
    /// Copy of the committed rows
    pub fn rows(&self) -> Vec<FactorCount> {
        self.rows.lock().expect("rows lock poisoned").clone()
    }

    /// Number of batches committed
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }
}

/// Sink that appends batches to a shared in-memory vector
///
/// Each committed batch is appended atomically under the handle's lock, so
/// observers never see half a chunk. Can be configured to fail, to
/// exercise the whole-chunk-failure path.
pub struct MemorySink {
    name: String,
    handle: MemorySinkHandle,
    fail_appends: bool,
}

impl MemorySink {
    /// Create a sink and return it with its observer handle
    pub fn new(name: impl Into<String>) -> (Self, MemorySinkHandle) {
        let handle = MemorySinkHandle::default();
        (
            Self {
                name: name.into(),
                handle: handle.clone(),
                fail_appends: false,
            },
            handle,
        )
    }

    /// Sink whose every append fails with a `SinkWrite` error
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: MemorySinkHandle::default(),
            fail_appends: true,
        }
    }
}

impl ResultSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append(&mut self, batch: &[FactorCount]) -> Result<(), BatchError> {
        if self.fail_appends {
            return Err(BatchError::sink_write(&self.name, "append disabled"));
        }
        let mut rows = self
            .handle
            .rows
            .lock()
            .map_err(|_| BatchError::sink_write(&self.name, "rows lock poisoned"))?;
        rows.extend_from_slice(batch);
        self.handle.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), BatchError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BatchError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batches_visible_through_handle() {
        let (mut sink, handle) = MemorySink::new("mem");
        sink.append(&[FactorCount {
            number: 5,
            count: 1,
        }])
        .await
        .unwrap();
        assert_eq!(handle.rows().len(), 1);
        assert_eq!(handle.batches(), 1);
    }

    #[tokio::test]
    async fn test_failing_sink_commits_nothing() {
        let mut sink = MemorySink::failing("mem");
        let err = sink
            .append(&[FactorCount {
                number: 5,
                count: 1,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::SinkWrite { .. }));
    }
}
