// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn returns_first_matching_event() {
    let (tx, mut rx) = mpsc::channel(4);
    tx.send(1).await.unwrap();
    tx.send(2).await.unwrap();
    tx.send(3).await.unwrap();

    let cancel = CancellationToken::new();
    let got = wait_for(&mut rx, |n| *n >= 2, Duration::from_secs(5), &cancel).await;
    assert_eq!(got, Ok(2));
}

#[tokio::test(start_paused = true)]
async fn times_out_when_no_event_matches() {
    let (tx, mut rx) = mpsc::channel::<u32>(4);
    let cancel = CancellationToken::new();

    let waiter = wait_for(&mut rx, |_| true, Duration::from_secs(10), &cancel);
    let got = waiter.await;
    assert_eq!(got, Err(WaitError::TimedOut));
    drop(tx);
}

#[tokio::test]
async fn cancellation_unblocks_immediately() {
    let (_tx, mut rx) = mpsc::channel::<u32>(4);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let got = wait_for(&mut rx, |_| true, Duration::from_secs(600), &cancel).await;
    assert_eq!(got, Err(WaitError::Cancelled));
}

#[tokio::test]
async fn closed_stream_is_an_error() {
    let (tx, mut rx) = mpsc::channel::<u32>(4);
    drop(tx);

    let cancel = CancellationToken::new();
    let got = wait_for(&mut rx, |_| true, Duration::from_secs(600), &cancel).await;
    assert_eq!(got, Err(WaitError::StreamClosed));
}

#[tokio::test]
async fn non_matching_events_are_skipped_not_fatal() {
    let (tx, mut rx) = mpsc::channel(4);
    tokio::spawn(async move {
        for n in [1, 2, 3, 42] {
            tx.send(n).await.unwrap();
        }
    });

    let cancel = CancellationToken::new();
    let got = wait_for(&mut rx, |n| *n == 42, Duration::from_secs(5), &cancel).await;
    assert_eq!(got, Ok(42));
}

#[tokio::test(start_paused = true)]
async fn failed_waiter_cancels_its_siblings() {
    let cancel = CancellationToken::new();

    // Sibling with a long timeout and a stream that never produces.
    let (_sibling_tx, mut sibling_rx) = mpsc::channel::<u32>(1);
    let sibling_cancel = cancel.clone();
    let sibling = tokio::spawn(async move {
        wait_for(&mut sibling_rx, |_| true, Duration::from_secs(600), &sibling_cancel).await
    });

    // Failing waiter: its stream is already closed.
    let (failed_tx, mut failed_rx) = mpsc::channel::<u32>(1);
    drop(failed_tx);
    let started = tokio::time::Instant::now();
    let got = cancel_on_failure(cancel.clone(), async {
        wait_for(&mut failed_rx, |_| true, Duration::from_secs(600), &cancel).await
    })
    .await;
    assert_eq!(got, Err(WaitError::StreamClosed));

    // The sibling observes cancellation instead of waiting out its timeout.
    let sibling_got = sibling.await.unwrap();
    assert_eq!(sibling_got, Err(WaitError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(600));
}

#[tokio::test]
async fn successful_waiter_leaves_the_token_alone() {
    let cancel = CancellationToken::new();
    let got: Result<u32, WaitError> =
        cancel_on_failure(cancel.clone(), async { Ok(7) }).await;
    assert_eq!(got, Ok(7));
    assert!(!cancel.is_cancelled());
}
