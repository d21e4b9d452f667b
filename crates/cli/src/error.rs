// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side errors.
//!
//! Each waiter times out with its own sentinel so the user learns *which*
//! condition never arrived; they are never collapsed into a generic
//! "timed out".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("timed out waiting for pod to be ready")]
    PodTimeout,
    #[error("timed out waiting for workspace to be reconciled")]
    ReconcileTimeout,
    #[error("timed out waiting for workspace to provide status of restore")]
    RestoreTimeout,
    #[error("timed out waiting for run to be queued")]
    EnqueueTimeout,
    #[error("timed out waiting for run to reach the head of the queue")]
    QueueTimeout,
    #[error("timed out waiting for exit code")]
    ExitCodeTimeout,
    #[error("expected at least one argument providing the command to run")]
    MissingCommand,
    #[error("no workspace selected; pass --workspace or create one with 'terrace workspace new'")]
    NoWorkspaceSelected,
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),
    #[error("malformed backend config entry, expected key=value: {0}")]
    MalformedConfig(String),
    #[error("cancelled")]
    Cancelled,
    #[error("watch stream ended unexpectedly")]
    WatchClosed,
    #[error("api error: {0}")]
    Api(#[from] kube::Error),
    #[error("encoding status: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for crate::exit_error::ExitError {
    fn from(err: ClientError) -> Self {
        crate::exit_error::ExitError::new(1, err.to_string())
    }
}
