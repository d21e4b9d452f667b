// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cluster for engine tests.
//!
//! Stores objects keyed by `namespace/name` and records every mutating call
//! so tests can assert idempotence (a second reconcile pass must add no
//! create or status-update calls).

use super::{Cluster, ClusterError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use terrace_core::{Run, Workspace};

/// Recorded mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    CreateConfigMap(String),
    CreatePvc(String),
    CreatePod(String),
    UpdateWorkspaceStatus(String),
}

#[derive(Default)]
struct FakeClusterState {
    workspaces: HashMap<String, Workspace>,
    config_maps: HashMap<String, ConfigMap>,
    pvcs: HashMap<String, PersistentVolumeClaim>,
    pods: HashMap<String, Pod>,
    runs: Vec<Run>,
    secrets: HashSet<String>,
    service_accounts: HashSet<String>,
    calls: Vec<ClusterCall>,
    /// When set, every operation fails with this message.
    fail_with: Option<String>,
}

/// Fake cluster adapter for testing
#[derive(Clone, Default)]
pub struct FakeCluster {
    inner: Arc<Mutex<FakeClusterState>>,
}

fn key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_workspace(&self, workspace: Workspace) {
        let ns = workspace.metadata.namespace.clone().unwrap_or_else(|| "default".into());
        let name = workspace.metadata.name.clone().unwrap_or_default();
        self.inner.lock().workspaces.insert(key(&ns, &name), workspace);
    }

    pub fn seed_run(&self, run: Run) {
        self.inner.lock().runs.push(run);
    }

    pub fn seed_secret(&self, namespace: &str, name: &str) {
        self.inner.lock().secrets.insert(key(namespace, name));
    }

    pub fn seed_service_account(&self, namespace: &str, name: &str) {
        self.inner.lock().service_accounts.insert(key(namespace, name));
    }

    /// Make every subsequent operation fail, simulating a transient API
    /// outage.
    pub fn fail_with(&self, message: &str) {
        self.inner.lock().fail_with = Some(message.to_string());
    }

    /// Recorded mutating calls, in order.
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().calls.clone()
    }

    pub fn workspace(&self, namespace: &str, name: &str) -> Option<Workspace> {
        self.inner.lock().workspaces.get(&key(namespace, name)).cloned()
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.inner.lock().config_maps.get(&key(namespace, name)).cloned()
    }

    pub fn pvc(&self, namespace: &str, name: &str) -> Option<PersistentVolumeClaim> {
        self.inner.lock().pvcs.get(&key(namespace, name)).cloned()
    }

    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.inner.lock().pods.get(&key(namespace, name)).cloned()
    }

    fn check_failure(&self) -> Result<(), ClusterError> {
        match &self.inner.lock().fail_with {
            Some(msg) => Err(ClusterError::Api(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn get_workspace(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Workspace>, ClusterError> {
        self.check_failure()?;
        Ok(self.inner.lock().workspaces.get(&key(namespace, name)).cloned())
    }

    async fn update_workspace_status(&self, workspace: &Workspace) -> Result<(), ClusterError> {
        self.check_failure()?;
        let ns = workspace.metadata.namespace.clone().unwrap_or_else(|| "default".into());
        let name = workspace.metadata.name.clone().unwrap_or_default();
        let mut state = self.inner.lock();
        state.calls.push(ClusterCall::UpdateWorkspaceStatus(name.clone()));
        if let Some(existing) = state.workspaces.get_mut(&key(&ns, &name)) {
            existing.status = workspace.status.clone();
        }
        Ok(())
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, ClusterError> {
        self.check_failure()?;
        Ok(self.inner.lock().secrets.contains(&key(namespace, name)))
    }

    async fn service_account_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, ClusterError> {
        self.check_failure()?;
        Ok(self.inner.lock().service_accounts.contains(&key(namespace, name)))
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, ClusterError> {
        self.check_failure()?;
        Ok(self.inner.lock().config_maps.get(&key(namespace, name)).cloned())
    }

    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<(), ClusterError> {
        self.check_failure()?;
        let name = config_map.metadata.name.clone().unwrap_or_default();
        let mut state = self.inner.lock();
        state.calls.push(ClusterCall::CreateConfigMap(name.clone()));
        state.config_maps.entry(key(namespace, &name)).or_insert_with(|| config_map.clone());
        Ok(())
    }

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, ClusterError> {
        self.check_failure()?;
        Ok(self.inner.lock().pvcs.get(&key(namespace, name)).cloned())
    }

    async fn create_pvc(
        &self,
        namespace: &str,
        pvc: &PersistentVolumeClaim,
    ) -> Result<(), ClusterError> {
        self.check_failure()?;
        let name = pvc.metadata.name.clone().unwrap_or_default();
        let mut state = self.inner.lock();
        state.calls.push(ClusterCall::CreatePvc(name.clone()));
        state.pvcs.entry(key(namespace, &name)).or_insert_with(|| pvc.clone());
        Ok(())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, ClusterError> {
        self.check_failure()?;
        Ok(self.inner.lock().pods.get(&key(namespace, name)).cloned())
    }

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), ClusterError> {
        self.check_failure()?;
        let name = pod.metadata.name.clone().unwrap_or_default();
        let mut state = self.inner.lock();
        state.calls.push(ClusterCall::CreatePod(name.clone()));
        state.pods.entry(key(namespace, &name)).or_insert_with(|| pod.clone());
        Ok(())
    }

    async fn list_runs(
        &self,
        namespace: &str,
        workspace: &str,
    ) -> Result<Vec<Run>, ClusterError> {
        self.check_failure()?;
        Ok(self
            .inner
            .lock()
            .runs
            .iter()
            .filter(|r| {
                r.metadata.namespace.as_deref().unwrap_or("default") == namespace
                    && r.workspace_name() == Some(workspace)
            })
            .cloned()
            .collect())
    }
}
