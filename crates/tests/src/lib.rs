//! # Integration Tests
//!
//! End-to-end scenarios wiring the chunk source, the worker pool, and the
//! master-side protocol together over real channels.

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chunk_source::{ChunkSource, VecItemReader};
    use contracts::{ChunkRequest, ChunkResult, Item};
    use dispatcher::{
        CompletionTracker, Correlator, Dispatcher, DispatcherConfig, JobOutcome, JobReport,
        ReplyListener, ReplyListenerHandle, ShutdownCoordinator,
    };
    use worker::sinks::{MemorySink, MemorySinkHandle};
    use worker::{PrimeFactors, WorkerPool};

    struct Rig {
        correlator: Arc<Correlator>,
        tracker: Arc<CompletionTracker>,
        listener: ReplyListenerHandle,
        pool: WorkerPool<MemorySink>,
        sink: MemorySinkHandle,
        dispatcher: Dispatcher,
    }

    /// Wire a full master/worker rig over in-process channels
    fn rig(worker_count: usize, config: DispatcherConfig) -> Rig {
        let (requests_tx, requests_rx) = async_channel::bounded::<ChunkRequest>(16);
        let (replies_tx, replies_rx) = async_channel::bounded::<ChunkResult>(16);

        let (memory_sink, sink) = MemorySink::new("mem");
        let pool = WorkerPool::spawn(
            worker_count,
            requests_rx,
            replies_tx,
            Arc::new(PrimeFactors::new()),
            memory_sink,
            Duration::from_millis(3000),
        );

        let correlator = Arc::new(Correlator::new());
        let tracker = Arc::new(CompletionTracker::new());
        let listener = ReplyListener::spawn(
            replies_rx,
            Arc::clone(&correlator),
            Duration::from_millis(100),
        );

        let (dispatcher, _cancel) = Dispatcher::new(
            requests_tx,
            Arc::clone(&correlator),
            Arc::clone(&tracker),
            config,
        );

        Rig {
            correlator,
            tracker,
            listener,
            pool,
            sink,
            dispatcher,
        }
    }

    async fn run_to_completion(rig: Rig, items: Vec<Item>, chunk_size: usize) -> (JobReport, Rig2) {
        let Rig {
            correlator,
            tracker,
            listener,
            pool,
            sink,
            dispatcher,
        } = rig;

        let mut source = ChunkSource::new(VecItemReader::new(items), chunk_size);
        let report = dispatcher.run_job(&mut source).await.unwrap();

        let mut coordinator = ShutdownCoordinator::new(Duration::from_millis(50), listener);
        coordinator.register(Box::new(pool));
        let summary = coordinator.run().await;

        (
            report,
            Rig2 {
                correlator,
                tracker,
                sink,
                discarded: summary.listener.discarded,
            },
        )
    }

    struct Rig2 {
        correlator: Arc<Correlator>,
        tracker: Arc<CompletionTracker>,
        sink: MemorySinkHandle,
        discarded: u64,
    }

    /// [2,3,4,5] with chunk size 2 produces two chunks, two committed
    /// batches, and four rows.
    #[tokio::test]
    async fn test_e2e_prime_factor_job() {
        let rig = rig(2, DispatcherConfig::default());
        let (report, end) = run_to_completion(rig, vec![2, 3, 4, 5], 2).await;

        assert_eq!(report.outcome, JobOutcome::Success);
        assert_eq!(report.dispatched, 2);
        assert_eq!(report.acked, 2);
        assert_eq!(report.failed, 0);

        assert_eq!(end.sink.batches(), 2);
        let mut rows: Vec<(i64, i64)> = end
            .sink
            .rows()
            .iter()
            .map(|r| (r.number, r.count))
            .collect();
        rows.sort();
        assert_eq!(rows, vec![(2, 1), (3, 1), (4, 2), (5, 1)]);

        assert!(end.correlator.is_empty());
        assert!(end.tracker.is_complete());
        assert_eq!(end.discarded, 0);

        // Protocol metrics observed one round trip per chunk
        let summary: observability::MetricsSummary = report.metrics.summary();
        assert_eq!(summary.chunks_dispatched, 2);
        assert_eq!(summary.round_trip_ms.count, 2);
    }

    /// Item value 1 maps to the sentinel -1 and the chunk still succeeds.
    #[tokio::test]
    async fn test_e2e_sentinel_item_chunk_succeeds() {
        let rig = rig(1, DispatcherConfig::default());
        let (report, end) = run_to_completion(rig, vec![1, 6], 10).await;

        assert_eq!(report.outcome, JobOutcome::Success);
        assert_eq!(report.failed, 0);

        let rows = end.sink.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].number, rows[0].count), (1, -1));
        assert_eq!((rows[1].number, rows[1].count), (6, 2));
    }

    /// Order within a chunk survives the full path; one worker keeps
    /// cross-chunk order deterministic too.
    #[tokio::test]
    async fn test_e2e_item_order_preserved() {
        let rig = rig(1, DispatcherConfig::default());
        let items: Vec<i64> = (2..30).collect();
        let (report, end) = run_to_completion(rig, items.clone(), 5).await;

        assert_eq!(report.outcome, JobOutcome::Success);
        let numbers: Vec<i64> = end.sink.rows().iter().map(|r| r.number).collect();
        assert_eq!(numbers, items);
        assert_eq!(end.sink.batches(), 6);
    }

    /// A worker that answers every request twice: the duplicate replies
    /// are discarded and the accounting is unchanged.
    #[tokio::test]
    async fn test_e2e_duplicate_replies_discarded() {
        let (requests_tx, requests_rx) = async_channel::bounded::<ChunkRequest>(16);
        let (replies_tx, replies_rx) = async_channel::bounded::<ChunkResult>(16);

        // Duplicating transport double: at-least-once delivery, twice
        tokio::spawn(async move {
            while let Ok(request) = requests_rx.recv().await {
                let reply = ChunkResult::success(request.correlation_id, request.chunk.len());
                if replies_tx.send(reply.clone()).await.is_err() {
                    break;
                }
                let _ = replies_tx.send(reply).await;
            }
        });

        let correlator = Arc::new(Correlator::new());
        let tracker = Arc::new(CompletionTracker::new());
        let listener = ReplyListener::spawn(
            replies_rx,
            Arc::clone(&correlator),
            Duration::from_millis(50),
        );
        let (dispatcher, _cancel) = Dispatcher::new(
            requests_tx,
            Arc::clone(&correlator),
            Arc::clone(&tracker),
            DispatcherConfig::default(),
        );

        let mut source = ChunkSource::new(VecItemReader::new(vec![2, 3, 4, 5]), 2);
        let report = dispatcher.run_job(&mut source).await.unwrap();

        assert_eq!(report.outcome, JobOutcome::Success);
        assert_eq!(report.acked, 2);

        let coordinator = ShutdownCoordinator::new(Duration::from_millis(100), listener);
        let summary = coordinator.run().await;

        // Exactly one duplicate per chunk was thrown away
        assert_eq!(summary.listener.matched, 2);
        assert_eq!(summary.listener.discarded, 2);

        // Duplicates were no-ops on the counters
        let state = tracker.snapshot();
        assert_eq!(state.dispatched, 2);
        assert_eq!(state.acked, 2);
        assert_eq!(state.failed, 0);
    }

    /// With no worker attached and retries disabled, the first chunk
    /// times out and fails the job with its correlation id and sequence.
    #[tokio::test]
    async fn test_e2e_timeout_fails_job() {
        let (requests_tx, _requests_rx) = async_channel::bounded::<ChunkRequest>(16);
        let (_replies_tx, replies_rx) = async_channel::bounded::<ChunkResult>(16);

        let correlator = Arc::new(Correlator::new());
        let tracker = Arc::new(CompletionTracker::new());
        let listener = ReplyListener::spawn(
            replies_rx,
            Arc::clone(&correlator),
            Duration::from_millis(20),
        );
        let (dispatcher, _cancel) = Dispatcher::new(
            requests_tx,
            Arc::clone(&correlator),
            Arc::clone(&tracker),
            DispatcherConfig {
                reply_timeout: Duration::from_millis(50),
                max_retries: 0,
            },
        );

        let mut source = ChunkSource::new(VecItemReader::new(vec![2, 3, 4, 5]), 2);
        let err = dispatcher.run_job(&mut source).await.unwrap_err();

        match err {
            contracts::BatchError::ChunkTimeout {
                sequence, waited_ms, ..
            } => {
                assert_eq!(sequence, 0);
                assert_eq!(waited_ms, 50);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Teardown still drains cleanly after the fatal error
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(20), listener);
        let summary = coordinator.run().await;
        assert_eq!(summary.disposal_errors, 0);
    }

    /// Chunk failures are contained: the job completes, the failure count
    /// and reason surface, and other chunks commit.
    #[tokio::test]
    async fn test_e2e_sink_failure_contained() {
        let (requests_tx, requests_rx) = async_channel::bounded::<ChunkRequest>(16);
        let (replies_tx, replies_rx) = async_channel::bounded::<ChunkResult>(16);

        let pool = WorkerPool::spawn(
            1,
            requests_rx,
            replies_tx,
            Arc::new(PrimeFactors::new()),
            MemorySink::failing("mem"),
            Duration::from_millis(3000),
        );

        let correlator = Arc::new(Correlator::new());
        let tracker = Arc::new(CompletionTracker::new());
        let listener = ReplyListener::spawn(
            replies_rx,
            Arc::clone(&correlator),
            Duration::from_millis(50),
        );
        let (dispatcher, _cancel) = Dispatcher::new(
            requests_tx,
            Arc::clone(&correlator),
            Arc::clone(&tracker),
            DispatcherConfig::default(),
        );

        let mut source = ChunkSource::new(VecItemReader::new(vec![2, 3, 4, 5]), 2);
        let report = dispatcher.run_job(&mut source).await.unwrap();

        assert_eq!(report.dispatched, 2);
        assert_eq!(report.failed, 2);
        assert!(matches!(report.outcome, JobOutcome::Failed(_)));
        assert_eq!(report.failure_reasons.len(), 2);
        assert!(tracker.is_complete());

        let mut coordinator = ShutdownCoordinator::new(Duration::from_millis(20), listener);
        coordinator.register(Box::new(pool));
        coordinator.run().await;
    }

    /// A fatal source error aborts the job before dispatching past it.
    #[tokio::test]
    async fn test_e2e_source_error_aborts() {
        let rig = rig(1, DispatcherConfig::default());
        let mut source = ChunkSource::new(VecItemReader::failing_at(vec![2, 3, 4, 5], 2), 2);

        let err = rig.dispatcher.run_job(&mut source).await.unwrap_err();
        assert!(matches!(err, contracts::BatchError::SourceRead { .. }));

        // The chunk before the failure resolved; nothing is outstanding
        assert!(rig.correlator.is_empty());
        let state = rig.tracker.snapshot();
        assert_eq!(state.dispatched, 1);

        let mut coordinator =
            ShutdownCoordinator::new(Duration::from_millis(20), rig.listener);
        coordinator.register(Box::new(rig.pool));
        coordinator.run().await;
    }

    /// Blueprint-driven parameters flow end to end through the loader.
    #[tokio::test]
    async fn test_e2e_blueprint_round() {
        let toml = r#"
[job]
chunk_size = 3
worker_count = 2
shutdown_grace_ms = 50

[input]
path = "unused.tsv"

[[sinks]]
name = "rows"
sink_type = "memory"
"#;
        let blueprint =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(blueprint.job.chunk_size, 3);

        let rig = rig(
            blueprint.job.worker_count,
            DispatcherConfig {
                reply_timeout: blueprint.job.reply_timeout(),
                max_retries: blueprint.job.max_retries,
            },
        );
        let (report, end) =
            run_to_completion(rig, (1..=10).collect(), blueprint.job.chunk_size).await;

        assert_eq!(report.outcome, JobOutcome::Success);
        assert_eq!(report.dispatched, 4);
        assert_eq!(end.sink.rows().len(), 10);
    }
}
