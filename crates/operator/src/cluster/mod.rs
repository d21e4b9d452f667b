// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster access behind a trait so the engine can be driven in tests
//! without a live API server.
//!
//! Semantics the engine relies on:
//!
//! - `get_*` returns `Ok(None)` for a missing resource; only transport and
//!   server errors surface as `Err`.
//! - `create_*` treats "already exists" as success. Another actor may have
//!   created the resource between the engine's check and create, and the
//!   engine never assumes exclusive access to shared cluster state.

pub mod kube;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use self::kube::KubeCluster;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod};
use terrace_core::{Run, Workspace};
use thiserror::Error;

/// Errors from cluster operations. Not-found is never an error here; it is
/// part of the `Option` contract on gets.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("api error: {0}")]
    Api(String),
}

#[async_trait]
pub trait Cluster: Send + Sync {
    async fn get_workspace(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Workspace>, ClusterError>;

    /// Full status rewrite for the named workspace.
    async fn update_workspace_status(&self, workspace: &Workspace) -> Result<(), ClusterError>;

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, ClusterError>;

    async fn service_account_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, ClusterError>;

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, ClusterError>;

    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<(), ClusterError>;

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, ClusterError>;

    async fn create_pvc(
        &self,
        namespace: &str,
        pvc: &PersistentVolumeClaim,
    ) -> Result<(), ClusterError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, ClusterError>;

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), ClusterError>;

    /// All runs labeled for the given workspace, in no particular order.
    async fn list_runs(&self, namespace: &str, workspace: &str)
        -> Result<Vec<Run>, ClusterError>;
}
