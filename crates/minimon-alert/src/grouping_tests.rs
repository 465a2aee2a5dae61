use minimon_protocols::MessageKind;

use super::*;

const WINDOW: Duration = Duration::from_secs(15);

fn failure(n: usize) -> Message {
    Message::failure(format!("metric {} failed", n))
}

#[tokio::test(start_paused = true)]
async fn test_flush_at_max_batch() {
    let now = Instant::now();
    let mut grouping = AlertGrouping::new(WINDOW, now);

    for n in 0..MAX_BATCH - 1 {
        assert!(grouping.push(failure(n), now).is_none());
    }
    let aggregate = grouping.push(failure(MAX_BATCH - 1), now).unwrap();
    assert_eq!(aggregate.kind, MessageKind::Aggregate);
    assert_eq!(aggregate.title, "Failure: 10");
    assert_eq!(aggregate.body.lines().count(), MAX_BATCH);
    assert!(grouping.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_set_by_first_message() {
    let start = Instant::now();
    let mut grouping = AlertGrouping::new(WINDOW, start);

    let first = start + Duration::from_secs(40);
    grouping.push(failure(0), first);
    assert_eq!(grouping.deadline(), first + WINDOW);

    grouping.push(failure(1), first + Duration::from_secs(5));
    assert_eq!(grouping.deadline(), first + WINDOW);
}

#[tokio::test(start_paused = true)]
async fn test_empty_deadline_rearms_without_output() {
    let start = Instant::now();
    let mut grouping = AlertGrouping::new(WINDOW, start);

    assert!(grouping.on_deadline(start + WINDOW).is_none());
    assert_eq!(grouping.deadline(), start + WINDOW * 2);
}

#[tokio::test(start_paused = true)]
async fn test_aggregate_preserves_order_and_counts() {
    let now = Instant::now();
    let mut grouping = AlertGrouping::new(WINDOW, now);
    grouping.push(Message::failure("a failed"), now);
    grouping.push(Message::recovery("b recovered"), now);
    grouping.push(Message::failure("c failed"), now);
    grouping.push(Message::notification("d: updated"), now);

    let aggregate = grouping.on_deadline(now + WINDOW).unwrap();
    assert_eq!(aggregate.title, "Notification: 1, Failure: 2, Recovery: 1");
    assert_eq!(
        aggregate.body,
        " - a failed\n - b recovered\n - c failed\n - d: updated\n"
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_single_message_flushes_exactly_at_deadline() {
    let (in_tx, in_rx) = mpsc::channel(5);
    let (out_tx, mut out_rx) = mpsc::channel(5);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(AlertGrouping::new(WINDOW, Instant::now()).run(in_rx, out_tx, cancel.clone()));

    let sent_at = Instant::now();
    in_tx.send(failure(0)).await.unwrap();

    tokio::time::sleep(WINDOW - Duration::from_millis(100)).await;
    assert!(out_rx.try_recv().is_err());

    let aggregate = out_rx.recv().await.unwrap();
    let elapsed = Instant::now() - sent_at;
    assert!(elapsed >= WINDOW);
    assert!(elapsed < WINDOW + Duration::from_millis(10));
    assert_eq!(aggregate.title, "Failure: 1");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_full_batch_does_not_wait_for_deadline() {
    let (in_tx, in_rx) = mpsc::channel(MAX_BATCH);
    let (out_tx, mut out_rx) = mpsc::channel(5);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(AlertGrouping::new(WINDOW, Instant::now()).run(in_rx, out_tx, cancel.clone()));

    let start = Instant::now();
    for n in 0..MAX_BATCH {
        in_tx.send(failure(n)).await.unwrap();
    }

    let aggregate = out_rx.recv().await.unwrap();
    assert_eq!(Instant::now(), start);
    assert_eq!(aggregate.title, "Failure: 10");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_idle_emits_nothing() {
    let (_in_tx, in_rx) = mpsc::channel::<Message>(5);
    let (out_tx, mut out_rx) = mpsc::channel(5);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(AlertGrouping::new(WINDOW, Instant::now()).run(in_rx, out_tx, cancel.clone()));

    tokio::time::sleep(WINDOW * 5).await;
    assert!(out_rx.try_recv().is_err());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_flushes_pending_batch_on_cancel() {
    let (in_tx, in_rx) = mpsc::channel(5);
    let (out_tx, mut out_rx) = mpsc::channel(5);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(AlertGrouping::new(WINDOW, Instant::now()).run(in_rx, out_tx, cancel.clone()));

    in_tx.send(failure(0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    handle.await.unwrap();

    let aggregate = out_rx.recv().await.unwrap();
    assert_eq!(aggregate.title, "Failure: 1");
}

#[tokio::test(start_paused = true)]
async fn test_run_flushes_when_input_closes() {
    let (in_tx, in_rx) = mpsc::channel(5);
    let (out_tx, mut out_rx) = mpsc::channel(5);
    let handle = tokio::spawn(AlertGrouping::new(WINDOW, Instant::now()).run(in_rx, out_tx, CancellationToken::new()));

    in_tx.send(failure(0)).await.unwrap();
    in_tx.send(failure(1)).await.unwrap();
    drop(in_tx);
    handle.await.unwrap();

    let aggregate = out_rx.recv().await.unwrap();
    assert_eq!(aggregate.title, "Failure: 2");
    assert!(out_rx.recv().await.is_none());
}
