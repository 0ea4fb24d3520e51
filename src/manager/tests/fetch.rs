use super::*;

#[tokio::test]
async fn test_250_items_fetched_in_two_batches() {
    let manager = create_test_manager();
    let catalog = Arc::new(MemoryCatalog::synthetic("cat", 250));

    run_to_fetch_end(&manager, Box::new(CatalogSource::new(catalog.clone()))).await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.fetched, 250);
    assert_eq!(snapshot.available, 250);
    assert_eq!(snapshot.consumed, 0);
    assert!(!snapshot.fetching);
    assert!(snapshot.finished.is_some());
    assert!(snapshot.exhausted.is_none(), "queue still holds items");
    assert_eq!(catalog.served_pages(), vec![(200, false), (50, true)]);
}

#[tokio::test]
async fn test_batch_events_report_progress() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    manager.force_trigger(Box::new(MemorySource::synthetic("cat", 250)));

    let first = wait_for_event(&mut rx, |e| matches!(e, Event::BatchFetched { .. })).await;
    match first {
        Event::BatchFetched {
            count,
            fetched,
            available,
        } => {
            assert_eq!(count, 200);
            assert_eq!(fetched, 200);
            assert_eq!(available, 200);
        }
        other => panic!("unexpected event {:?}", other),
    }

    match wait_for_event(&mut rx, |e| matches!(e, Event::FetchFinished { .. })).await {
        Event::FetchFinished { fetched } => assert_eq!(fetched, 250),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_tick_skipped_above_threshold() {
    let manager = create_test_manager();
    lock(&manager.state).queue.extend(items("old", 801));
    let mut source = MemorySource::synthetic("cat", 10);

    let outcome = manager.fetch_tick(&mut source).await.unwrap();

    assert_eq!(outcome, TickOutcome::Skipped);
    assert_eq!(source.remaining(), 10, "source must not be touched");
    assert_eq!(manager.available(), 801);
}

#[tokio::test]
async fn test_tick_fetches_at_threshold() {
    let manager = create_test_manager();
    lock(&manager.state).queue.extend(items("old", 800));
    let mut source = EndlessSource::new("cat");

    let outcome = manager.fetch_tick(&mut source).await.unwrap();

    assert_eq!(outcome, TickOutcome::Fetched);
    assert_eq!(manager.available(), 1000);
}

#[tokio::test(start_paused = true)]
async fn test_queue_never_exceeds_max_size() {
    let manager = create_test_manager();

    assert!(manager.force_trigger(Box::new(EndlessSource::new("cat"))));
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = manager.snapshot();
    assert!(snapshot.fetching, "endless source keeps the loop alive");
    assert_eq!(snapshot.available, 1000);
    assert_eq!(snapshot.fetched, 1000);

    // Draining below the threshold lets the loop resume
    manager.pop_tasks(300).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.available, 900);
    assert_eq!(snapshot.fetched, 1200);
    assert!(snapshot.available <= manager.config().max_queue_size);

    manager.shutdown();
}

#[tokio::test]
async fn test_fetch_error_aborts_run_but_keeps_queue() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    manager.force_trigger(Box::new(FailingSource::after(vec![items("cat", 3)])));

    match wait_for_event(&mut rx, |e| matches!(e, Event::FetchFailed { .. })).await {
        Event::FetchFailed { error } => assert!(error.contains("DataSourceError"), "{}", error),
        other => panic!("unexpected event {:?}", other),
    }

    let snapshot = manager.snapshot();
    assert!(!snapshot.fetching);
    assert!(snapshot.finished.is_some());
    assert_eq!(snapshot.available, 3);
    assert!(snapshot.last_error.unwrap().contains("returned 3"));
    assert!(manager.is_busy(), "queued items keep the run alive");

    assert_eq!(manager.pop_tasks(10).await.unwrap().len(), 3);
    assert!(manager.snapshot().exhausted.is_some());
    assert!(!manager.is_busy());
}

#[tokio::test]
async fn test_empty_source_finishes_and_exhausts_at_once() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    manager.force_trigger(Box::new(MemorySource::default()));

    wait_for_event(&mut rx, |e| matches!(e, Event::FetchFinished { fetched: 0 })).await;
    match wait_for_event(&mut rx, |e| matches!(e, Event::QueueExhausted { .. })).await {
        Event::QueueExhausted { consumed } => assert_eq!(consumed, 0),
        other => panic!("unexpected event {:?}", other),
    }

    let snapshot = manager.snapshot();
    let finished = snapshot.finished.unwrap();
    let exhausted = snapshot.exhausted.unwrap();
    assert!(exhausted > finished, "exhausted must come strictly after finished");
    assert!(!manager.is_busy());
}

#[tokio::test]
async fn test_shutdown_cancels_fetch_loop() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    manager.force_trigger(Box::new(EndlessSource::new("cat")));
    wait_for_event(&mut rx, |e| matches!(e, Event::BatchFetched { .. })).await;

    manager.shutdown();
    wait_for_event(&mut rx, |e| matches!(e, Event::Shutdown)).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while manager.snapshot().fetching {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("fetch loop should stop after shutdown");

    let snapshot = manager.snapshot();
    assert!(snapshot.last_error.unwrap().contains("shutdown"));
}
