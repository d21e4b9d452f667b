// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic "wait until predicate holds" over a typed event stream.
//!
//! Every readiness waiter is this loop with a different predicate: consume
//! state-change notifications until one satisfies the predicate, the
//! per-waiter deadline passes, or the shared token is cancelled. Waiters
//! are never restarted once they fail.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The per-waiter deadline passed.
    TimedOut,
    /// The shared token was cancelled (a sibling waiter failed).
    Cancelled,
    /// The event stream ended before the predicate held.
    StreamClosed,
}

/// Wait until an event satisfying `pred` arrives, returning it.
pub async fn wait_for<T, F>(
    rx: &mut mpsc::Receiver<T>,
    mut pred: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, WaitError>
where
    F: FnMut(&T) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        tokio::select! {
            () = cancel.cancelled() => return Err(WaitError::Cancelled),
            () = tokio::time::sleep_until(deadline) => return Err(WaitError::TimedOut),
            event = rx.recv() => match event {
                Some(event) if pred(&event) => return Ok(event),
                Some(_) => {}
                None => return Err(WaitError::StreamClosed),
            },
        }
    }
}

/// Fan-out discipline: a waiter that fails cancels the shared token so its
/// siblings unblock immediately instead of running to their own timeouts.
pub async fn cancel_on_failure<T, E, F>(cancel: CancellationToken, fut: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let result = fut.await;
    if result.is_err() {
        cancel.cancel();
    }
    result
}

#[cfg(test)]
#[path = "waiter_tests.rs"]
mod tests;
