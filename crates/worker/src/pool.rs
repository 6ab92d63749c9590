//! WorkerPool - chunk-consuming worker tasks
//!
//! Spawns N persistent tokio tasks that pull chunk requests from a shared
//! bounded channel. The channel's `Receiver` is `Clone`, so each worker
//! gets its own handle and the channel itself guarantees a chunk reaches
//! exactly one worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use contracts::{
    BatchError, ChunkRequest, ChunkResult, Disposable, DisposeFuture, ItemProcessor, ResultSink,
};

use crate::chunk_processor::process_items;

/// Aggregate metrics across all workers of a pool
#[derive(Debug, Default)]
pub struct WorkerPoolMetrics {
    /// Chunks processed and committed
    chunks_processed: AtomicU64,
    /// Chunks that failed (processing or commit)
    chunks_failed: AtomicU64,
    /// Items processed in committed chunks
    items_processed: AtomicU64,
    /// Replies that could not be handed to the transport in budget
    replies_dropped: AtomicU64,
}

impl WorkerPoolMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
            items_processed: self.items_processed.load(Ordering::Relaxed),
            replies_dropped: self.replies_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pool metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolMetricsSnapshot {
    pub chunks_processed: u64,
    pub chunks_failed: u64,
    pub items_processed: u64,
    pub replies_dropped: u64,
}

/// A pool of worker tasks consuming the requests channel
pub struct WorkerPool<S: ResultSink + Send + 'static> {
    requests: Receiver<ChunkRequest>,
    handles: Vec<JoinHandle<()>>,
    metrics: Arc<WorkerPoolMetrics>,
    sink: Arc<Mutex<S>>,
}

impl<S: ResultSink + Send + 'static> WorkerPool<S> {
    /// Spawn `worker_count` workers over the given channels
    ///
    /// Every worker applies `processor` to each item of a received chunk
    /// in order, commits the rows to the shared `sink` as one batch, and
    /// sends exactly one reply per request. `reply_send_timeout` bounds
    /// how long a worker waits for the transport to accept a reply.
    pub fn spawn<P: ItemProcessor + 'static>(
        worker_count: usize,
        requests: Receiver<ChunkRequest>,
        replies: Sender<ChunkResult>,
        processor: Arc<P>,
        sink: S,
        reply_send_timeout: Duration,
    ) -> Self {
        let metrics = Arc::new(WorkerPoolMetrics::new());
        let sink = Arc::new(Mutex::new(sink));

        let handles = (0..worker_count)
            .map(|worker_id| {
                let requests = requests.clone();
                let replies = replies.clone();
                let processor = Arc::clone(&processor);
                let sink = Arc::clone(&sink);
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    worker_loop(
                        worker_id,
                        requests,
                        replies,
                        processor,
                        sink,
                        metrics,
                        reply_send_timeout,
                    )
                    .await;
                })
            })
            .collect();

        Self {
            requests,
            handles,
            metrics,
            sink,
        }
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<WorkerPoolMetrics> {
        &self.metrics
    }

    /// Number of spawned workers
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop accepting work, drain, and release the sink
    #[instrument(name = "worker_pool_shutdown", skip(self))]
    pub async fn shutdown(&mut self) -> Result<(), BatchError> {
        // Close the work channel; workers drain buffered requests and exit
        self.requests.close();
        for handle in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await {
                error!(error = ?e, "worker task panicked");
            }
        }

        let mut sink = self.sink.lock().await;
        sink.flush().await?;
        sink.close().await?;
        debug!("worker pool shutdown complete");
        Ok(())
    }
}

impl<S: ResultSink + Send + 'static> Disposable for WorkerPool<S> {
    fn name(&self) -> &str {
        "worker_pool"
    }

    fn dispose(&mut self) -> DisposeFuture<'_> {
        Box::pin(self.shutdown())
    }
}

/// One worker's request loop
#[instrument(name = "worker_loop", skip_all, fields(worker = worker_id))]
async fn worker_loop<P: ItemProcessor, S: ResultSink>(
    worker_id: usize,
    requests: Receiver<ChunkRequest>,
    replies: Sender<ChunkResult>,
    processor: Arc<P>,
    sink: Arc<Mutex<S>>,
    metrics: Arc<WorkerPoolMetrics>,
    reply_send_timeout: Duration,
) {
    debug!("worker started");

    while let Ok(request) = requests.recv().await {
        let result = handle_request(&request, processor.as_ref(), &sink, &metrics).await;

        match timeout(reply_send_timeout, replies.send(result)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                warn!(
                    correlation_id = %request.correlation_id,
                    "replies channel closed, dropping ack"
                );
                metrics.replies_dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                error!(
                    correlation_id = %request.correlation_id,
                    budget_ms = reply_send_timeout.as_millis() as u64,
                    "reply send budget exceeded, dropping ack"
                );
                metrics.replies_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    debug!("worker stopped");
}

/// Process one chunk and build its reply
///
/// All-or-nothing per chunk: a processing or commit failure yields a
/// `Failure` result and nothing from the chunk reaches the sink.
async fn handle_request<P: ItemProcessor, S: ResultSink>(
    request: &ChunkRequest,
    processor: &P,
    sink: &Arc<Mutex<S>>,
    metrics: &WorkerPoolMetrics,
) -> ChunkResult {
    let correlation_id = request.correlation_id;
    let chunk = &request.chunk;

    let rows = match process_items(processor, chunk) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                correlation_id = %correlation_id,
                sequence = chunk.sequence,
                error = %e,
                "chunk processing failed"
            );
            metrics.chunks_failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("distbatch_chunks_processed_total", "status" => "failure")
                .increment(1);
            return ChunkResult::failure(correlation_id, chunk.len(), e.to_string());
        }
    };

    if let Err(e) = sink.lock().await.append(&rows).await {
        warn!(
            correlation_id = %correlation_id,
            sequence = chunk.sequence,
            error = %e,
            "batch commit failed"
        );
        metrics.chunks_failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("distbatch_chunks_processed_total", "status" => "failure").increment(1);
        return ChunkResult::failure(correlation_id, chunk.len(), e.to_string());
    }

    metrics.chunks_processed.fetch_add(1, Ordering::Relaxed);
    metrics
        .items_processed
        .fetch_add(rows.len() as u64, Ordering::Relaxed);
    metrics::counter!("distbatch_chunks_processed_total", "status" => "success").increment(1);
    metrics::counter!("distbatch_items_processed_total").increment(rows.len() as u64);

    ChunkResult::success(correlation_id, chunk.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use crate::PrimeFactors;
    use contracts::{Chunk, ChunkStatus, CorrelationId, Item};

    fn request(id: u64, sequence: u64, items: Vec<Item>) -> ChunkRequest {
        ChunkRequest {
            correlation_id: CorrelationId::new(id),
            chunk: Chunk::new(sequence, items),
        }
    }

    #[tokio::test]
    async fn test_pool_processes_and_replies() {
        let (request_tx, request_rx) = async_channel::bounded(8);
        let (reply_tx, reply_rx) = async_channel::bounded(8);
        let (sink, handle) = MemorySink::new("mem");

        let mut pool = WorkerPool::spawn(
            2,
            request_rx,
            reply_tx,
            Arc::new(PrimeFactors::new()),
            sink,
            Duration::from_millis(3000),
        );

        request_tx.send(request(1, 0, vec![2, 3])).await.unwrap();
        request_tx.send(request(2, 1, vec![4, 5])).await.unwrap();

        let mut replies = vec![
            reply_rx.recv().await.unwrap(),
            reply_rx.recv().await.unwrap(),
        ];
        replies.sort_by_key(|r| r.correlation_id);

        assert_eq!(replies[0].correlation_id, CorrelationId::new(1));
        assert!(replies[0].status.is_success());
        assert_eq!(replies[0].item_count, 2);
        assert!(replies[1].status.is_success());

        pool.shutdown().await.unwrap();

        let mut committed = handle.rows();
        committed.sort_by_key(|r| r.number);
        let pairs: Vec<(i64, i64)> = committed.iter().map(|r| (r.number, r.count)).collect();
        assert_eq!(pairs, vec![(2, 1), (3, 1), (4, 2), (5, 1)]);
        assert_eq!(pool.metrics().snapshot().chunks_processed, 2);
    }

    #[tokio::test]
    async fn test_sink_failure_fails_whole_chunk() {
        let (request_tx, request_rx) = async_channel::bounded(8);
        let (reply_tx, reply_rx) = async_channel::bounded(8);

        let mut pool = WorkerPool::spawn(
            1,
            request_rx,
            reply_tx,
            Arc::new(PrimeFactors::new()),
            MemorySink::failing("mem"),
            Duration::from_millis(3000),
        );

        request_tx.send(request(9, 0, vec![2, 3])).await.unwrap();
        let reply = reply_rx.recv().await.unwrap();

        assert_eq!(reply.correlation_id, CorrelationId::new(9));
        assert!(matches!(reply.status, ChunkStatus::Failure(_)));
        assert_eq!(pool.metrics().snapshot().chunks_failed, 1);

        pool.shutdown().await.unwrap();
    }

    struct PoisonProcessor;

    impl ItemProcessor for PoisonProcessor {
        fn process(&self, item: Item) -> Result<i64, BatchError> {
            if item < 0 {
                return Err(BatchError::item_processing(item, "negative input"));
            }
            Ok(item)
        }
    }

    #[tokio::test]
    async fn test_processor_failure_commits_nothing() {
        let (request_tx, request_rx) = async_channel::bounded(8);
        let (reply_tx, reply_rx) = async_channel::bounded(8);
        let (sink, handle) = MemorySink::new("mem");

        let mut pool = WorkerPool::spawn(
            1,
            request_rx,
            reply_tx,
            Arc::new(PoisonProcessor),
            sink,
            Duration::from_millis(3000),
        );

        request_tx.send(request(3, 0, vec![7, -1, 9])).await.unwrap();
        let reply = reply_rx.recv().await.unwrap();

        assert!(matches!(reply.status, ChunkStatus::Failure(_)));
        assert!(handle.rows().is_empty());

        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_buffered_requests() {
        let (request_tx, request_rx) = async_channel::bounded(8);
        let (reply_tx, reply_rx) = async_channel::bounded(8);
        let (sink, handle) = MemorySink::new("mem");

        let mut pool = WorkerPool::spawn(
            1,
            request_rx,
            reply_tx,
            Arc::new(PrimeFactors::new()),
            sink,
            Duration::from_millis(3000),
        );

        for i in 0..4u64 {
            request_tx
                .send(request(i + 1, i, vec![i as i64 + 2]))
                .await
                .unwrap();
        }
        drop(request_tx);

        pool.shutdown().await.unwrap();
        assert_eq!(handle.rows().len(), 4);

        // One reply per request even across shutdown
        let mut seen = 0;
        while reply_rx.try_recv().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 4);
    }
}
