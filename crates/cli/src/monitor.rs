// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod container inspection and the exit-code monitor.
//!
//! The monitor is best-effort and non-blocking: it consumes a pod watch
//! stream in the background and delivers the runner container's exit
//! status over a oneshot channel once the container terminates. The caller
//! awaits it only after log streaming ends, with its own bound.

use k8s_openapi::api::core::v1::Pod;
use tokio::sync::{mpsc, oneshot};

/// Whether the named container reports ready.
pub fn container_ready(pod: &Pod, container: &str) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .is_some_and(|statuses| statuses.iter().any(|s| s.name == container && s.ready))
}

/// Exit code of the named container, once terminated.
pub fn container_exit_code(pod: &Pod, container: &str) -> Option<i32> {
    pod.status
        .as_ref()?
        .container_statuses
        .as_ref()?
        .iter()
        .find(|s| s.name == container)?
        .state
        .as_ref()?
        .terminated
        .as_ref()
        .map(|t| t.exit_code)
}

/// Watch `events` until the container terminates, delivering its exit code.
/// The sender side is dropped if the stream ends first; the receiver then
/// resolves with an error, which callers map to their exit-code timeout.
pub fn spawn_exit_monitor(
    mut events: mpsc::Receiver<Pod>,
    container: String,
) -> oneshot::Receiver<i32> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        while let Some(pod) = events.recv().await {
            if let Some(code) = container_exit_code(&pod, &container) {
                let _ = tx.send(code);
                return;
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
