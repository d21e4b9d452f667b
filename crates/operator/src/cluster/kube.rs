// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster implementation backed by the Kubernetes API.

use super::{Cluster, ClusterError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, ServiceAccount};
use kube::api::{Api, ListParams, PostParams};
use kube::Client;
use terrace_core::{labels, Run, Workspace};

/// Real cluster access via `kube`.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn workspaces(&self, namespace: &str) -> Api<Workspace> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn api_err(err: kube::Error) -> ClusterError {
    ClusterError::Api(err.to_string())
}

/// Create-if-absent: a 409 means another actor got there first, which is
/// success for our purposes.
async fn create_ignore_conflict<K>(api: &Api<K>, obj: &K) -> Result<(), ClusterError>
where
    K: Clone + std::fmt::Debug + serde::Serialize + serde::de::DeserializeOwned,
{
    match api.create(&PostParams::default(), obj).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(err) => Err(api_err(err)),
    }
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn get_workspace(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Workspace>, ClusterError> {
        self.workspaces(namespace).get_opt(name).await.map_err(api_err)
    }

    async fn update_workspace_status(&self, workspace: &Workspace) -> Result<(), ClusterError> {
        let namespace = workspace.metadata.namespace.as_deref().unwrap_or("default");
        let name = workspace.metadata.name.as_deref().unwrap_or_default();
        let body = serde_json::to_vec(workspace)
            .map_err(|e| ClusterError::Api(format!("encoding workspace status: {}", e)))?;
        self.workspaces(namespace)
            .replace_status(name, &PostParams::default(), body)
            .await
            .map_err(api_err)?;
        Ok(())
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, ClusterError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(secrets.get_opt(name).await.map_err(api_err)?.is_some())
    }

    async fn service_account_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, ClusterError> {
        let accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        Ok(accounts.get_opt(name).await.map_err(api_err)?.is_some())
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, ClusterError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(api_err)
    }

    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<(), ClusterError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        create_ignore_conflict(&api, config_map).await
    }

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, ClusterError> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(api_err)
    }

    async fn create_pvc(
        &self,
        namespace: &str,
        pvc: &PersistentVolumeClaim,
    ) -> Result<(), ClusterError> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        create_ignore_conflict(&api, pvc).await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, ClusterError> {
        self.pods(namespace).get_opt(name).await.map_err(api_err)
    }

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), ClusterError> {
        create_ignore_conflict(&self.pods(namespace), pod).await
    }

    async fn list_runs(
        &self,
        namespace: &str,
        workspace: &str,
    ) -> Result<Vec<Run>, ClusterError> {
        let api: Api<Run> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(&labels::workspace_selector(workspace));
        Ok(api.list(&lp).await.map_err(api_err)?.items)
    }
}
