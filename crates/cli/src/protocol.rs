// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace readiness protocol.
//!
//! Three waiters run concurrently under one shared cancellation token:
//! workspace reconciled, runner container ready, restore outcome reported.
//! Each has its own timeout and its own sentinel error; the first failure
//! cancels the siblings. The ready pod is handed to the caller over a
//! oneshot channel.

use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use terrace_core::{condition, Workspace};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::ClientError;
use crate::monitor::container_ready;
use crate::waiter::{cancel_on_failure, wait_for, WaitError};

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub reconcile: Duration,
    pub pod: Duration,
    /// `None` when no backup bucket is configured: there is nothing to
    /// restore, so no restore outcome will ever be reported.
    pub restore: Option<Duration>,
}

fn on_timeout(err: WaitError, sentinel: ClientError) -> ClientError {
    match err {
        WaitError::TimedOut => sentinel,
        WaitError::Cancelled => ClientError::Cancelled,
        WaitError::StreamClosed => ClientError::WatchClosed,
    }
}

/// Duplicate workspace events so the reconcile and restore waiters each
/// get their own stream. A waiter that finishes drops its receiver; the
/// relay keeps feeding the other until both are gone.
fn fan_out(
    mut events: mpsc::Receiver<Workspace>,
) -> (mpsc::Receiver<Workspace>, mpsc::Receiver<Workspace>) {
    let (tx_a, rx_a) = mpsc::channel(16);
    let (tx_b, rx_b) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(ws) = events.recv().await {
            let a = tx_a.send(ws.clone()).await.is_ok();
            let b = tx_b.send(ws).await.is_ok();
            if !a && !b {
                return;
            }
        }
    });
    (rx_a, rx_b)
}

/// Wait until the workspace is reconciled, the restore outcome is known,
/// and the runner container is ready, returning the ready pod.
pub async fn await_ready(
    workspace_events: mpsc::Receiver<Workspace>,
    pod_events: mpsc::Receiver<Pod>,
    container: String,
    timeouts: Timeouts,
) -> Result<Pod, ClientError> {
    let cancel = CancellationToken::new();
    let (reconcile_rx, restore_rx) = fan_out(workspace_events);
    let (pod_tx, pod_rx) = oneshot::channel();

    let reconcile = {
        let cancel = cancel.clone();
        cancel_on_failure(cancel.clone(), async move {
            let mut rx = reconcile_rx;
            wait_for(&mut rx, Workspace::is_reconciled, timeouts.reconcile, &cancel)
                .await
                .map_err(|e| on_timeout(e, ClientError::ReconcileTimeout))?;
            Ok::<(), ClientError>(())
        })
    };

    let restore = {
        let cancel = cancel.clone();
        cancel_on_failure(cancel.clone(), async move {
            let mut rx = restore_rx;
            let Some(timeout) = timeouts.restore else {
                return Ok(());
            };
            let ws = wait_for(&mut rx, Workspace::restore_settled, timeout, &cancel)
                .await
                .map_err(|e| on_timeout(e, ClientError::RestoreTimeout))?;
            let failed = ws
                .status
                .as_ref()
                .is_some_and(|s| s.conditions.is_true(condition::RESTORE_FAILURE));
            if failed {
                warn!(workspace = %ws.name_any(), "state restore failed; starting from empty state");
            }
            Ok::<(), ClientError>(())
        })
    };

    let pod = {
        let cancel = cancel.clone();
        cancel_on_failure(cancel.clone(), async move {
            let mut rx = pod_events;
            let pod = wait_for(
                &mut rx,
                |pod| container_ready(pod, &container),
                timeouts.pod,
                &cancel,
            )
            .await
            .map_err(|e| on_timeout(e, ClientError::PodTimeout))?;
            let _ = pod_tx.send(pod);
            Ok::<(), ClientError>(())
        })
    };

    tokio::try_join!(reconcile, restore, pod)?;
    pod_rx.await.map_err(|_| ClientError::WatchClosed)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
