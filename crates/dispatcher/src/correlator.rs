//! Correlator - outstanding chunk bookkeeping
//!
//! Maps each in-flight correlation id to its dispatch record and routes
//! inbound replies to the waiting dispatch path. The dispatch path
//! (`register`/`take`) and the listener path (`match_reply`) run on
//! different tasks; the shared map is the only state they contend on.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

use contracts::{Chunk, ChunkResult, CorrelationId};

/// Dispatch metadata for one outstanding chunk
///
/// Owned exclusively by the correlator while outstanding; removed on ack
/// or when the dispatcher reclaims it after a timeout.
#[derive(Debug)]
pub struct DispatchRecord {
    /// The outstanding correlation id
    pub correlation_id: CorrelationId,

    /// The dispatched chunk (kept for resend)
    pub chunk: Chunk,

    /// When this attempt was sent
    pub sent_at: Instant,

    /// 0-based attempt counter
    pub attempt: u32,

    /// Completed by the listener when the matching reply arrives
    reply_slot: oneshot::Sender<ChunkResult>,
}

/// Outstanding-chunk map shared between dispatch and listener paths
#[derive(Debug, Default)]
pub struct Correlator {
    outstanding: Mutex<HashMap<CorrelationId, DispatchRecord>>,
}

impl Correlator {
    /// Create an empty correlator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatch attempt and return the slot the matching reply
    /// will arrive on
    ///
    /// A duplicate in-flight id is a protocol violation; the stale record
    /// is replaced (its waiter observes a closed slot) and the violation
    /// is logged.
    #[instrument(name = "correlator_register", skip(self, chunk), fields(correlation_id = %correlation_id, attempt))]
    pub fn register(
        &self,
        correlation_id: CorrelationId,
        chunk: Chunk,
        attempt: u32,
    ) -> oneshot::Receiver<ChunkResult> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let record = DispatchRecord {
            correlation_id,
            chunk,
            sent_at: Instant::now(),
            attempt,
            reply_slot: reply_tx,
        };

        let mut outstanding = self.outstanding.lock().expect("correlator lock poisoned");
        if outstanding.insert(correlation_id, record).is_some() {
            warn!(correlation_id = %correlation_id, "duplicate in-flight correlation id");
            debug_assert!(false, "duplicate in-flight correlation id {correlation_id}");
        }
        reply_rx
    }

    /// Route an inbound reply to its waiting dispatch attempt
    ///
    /// Returns `true` if the reply matched an outstanding record. An
    /// unknown id is an expected artifact of at-least-once delivery
    /// (stale reply after a timeout-driven reclaim) and is discarded.
    pub fn match_reply(&self, result: ChunkResult) -> bool {
        let correlation_id = result.correlation_id;
        let record = {
            let mut outstanding = self.outstanding.lock().expect("correlator lock poisoned");
            outstanding.remove(&correlation_id)
        };

        match record {
            Some(record) => {
                if record.reply_slot.send(result).is_err() {
                    // Waiter gave up between match and delivery; the
                    // timeout path reconciles accounting.
                    debug!(correlation_id = %correlation_id, "reply matched an abandoned waiter");
                }
                true
            }
            None => {
                debug!(correlation_id = %correlation_id, "discarding reply for unknown correlation id");
                metrics::counter!("distbatch_replies_discarded_total").increment(1);
                false
            }
        }
    }

    /// Reclaim an outstanding record (timeout path)
    pub fn take(&self, correlation_id: CorrelationId) -> Option<DispatchRecord> {
        self.outstanding
            .lock()
            .expect("correlator lock poisoned")
            .remove(&correlation_id)
    }

    /// Outstanding correlation ids
    pub fn pending(&self) -> Vec<CorrelationId> {
        self.outstanding
            .lock()
            .expect("correlator lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Number of outstanding chunks
    pub fn len(&self) -> usize {
        self.outstanding.lock().expect("correlator lock poisoned").len()
    }

    /// True if nothing is outstanding
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
