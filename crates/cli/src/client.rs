// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespaced Kubernetes access for the CLI.
//!
//! Watches are surfaced as plain mpsc channels so the readiness waiters
//! never touch the API machinery directly; watcher errors are logged and
//! the watch resumes with backoff.

use futures_util::{io::AsyncBufReadExt, StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::{Pod, Secret, ServiceAccount};
use kube::api::{Api, DeleteParams, ListParams, LogParams, ObjectMeta, PostParams};
use kube::runtime::{watcher, WatchStreamExt};
use kube::Client;
use terrace_core::{condition, labels, Clock, ConditionStatus, Run, SystemClock, Workspace};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::ClientError;

/// Buffered events per watch; waiters drain faster than the API serves.
const WATCH_BUFFER: usize = 32;

#[derive(Clone)]
pub struct AppClient {
    client: Client,
    namespace: String,
}

impl AppClient {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self { client, namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn workspaces(&self) -> Api<Workspace> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn runs(&self) -> Api<Run> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Create the service account if absent. Returns whether this client
    /// created it, so cleanup only removes what it made.
    pub async fn ensure_service_account(&self, name: &str) -> Result<bool, ClientError> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), &self.namespace);
        if api.get_opt(name).await?.is_some() {
            return Ok(false);
        }
        let account = ServiceAccount {
            metadata: named_meta(name),
            ..Default::default()
        };
        create_if_absent(&api, &account).await
    }

    /// Create an empty secret if absent, as a place for credentials.
    pub async fn ensure_secret(&self, name: &str) -> Result<bool, ClientError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);
        if api.get_opt(name).await?.is_some() {
            return Ok(false);
        }
        let secret = Secret {
            metadata: named_meta(name),
            ..Default::default()
        };
        create_if_absent(&api, &secret).await
    }

    pub async fn get_workspace(&self, name: &str) -> Result<Option<Workspace>, ClientError> {
        Ok(self.workspaces().get_opt(name).await?)
    }

    pub async fn create_workspace(&self, workspace: &Workspace) -> Result<Workspace, ClientError> {
        Ok(self.workspaces().create(&PostParams::default(), workspace).await?)
    }

    pub async fn create_run(&self, run: &Run) -> Result<Run, ClientError> {
        Ok(self.runs().create(&PostParams::default(), run).await?)
    }

    /// Stream of applied states of one workspace.
    pub fn watch_workspace(&self, name: &str) -> mpsc::Receiver<Workspace> {
        forward_watch(self.workspaces(), name)
    }

    /// Stream of applied states of one pod.
    pub fn watch_pod(&self, name: &str) -> mpsc::Receiver<Pod> {
        forward_watch(self.pods(), name)
    }

    /// Follow the container's logs to stdout until the stream ends.
    pub async fn stream_logs(&self, pod: &str, container: &str) -> Result<(), ClientError> {
        let params = LogParams {
            follow: true,
            container: Some(container.to_string()),
            ..Default::default()
        };
        let reader = self.pods().log_stream(pod, &params).await?;
        let mut lines = reader.lines().boxed();
        while let Some(line) = lines.try_next().await? {
            println!("{line}");
        }
        Ok(())
    }

    /// Record the command's terminal result on its run.
    pub async fn complete_run(&self, name: &str, exit_code: i32) -> Result<(), ClientError> {
        let api = self.runs();
        let mut run = api.get(name).await?;
        let mut status = run.status.take().unwrap_or_default();
        status.conditions.set(condition::COMPLETED, ConditionStatus::True, SystemClock.now());
        status.exit_code = Some(exit_code);
        run.status = Some(status);
        let body = serde_json::to_vec(&run)?;
        api.replace_status(name, &PostParams::default(), body).await?;
        Ok(())
    }

    /// Delete the workspace; its dependents follow via owner references.
    pub async fn delete_workspace(&self, name: &str) -> Result<(), ClientError> {
        match self.workspaces().delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                Err(ClientError::WorkspaceNotFound(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete all runs labeled for the workspace. Runs are not owned by it,
    /// so garbage collection never reaps them.
    pub async fn delete_runs(&self, workspace: &str) -> Result<(), ClientError> {
        let lp = ListParams::default().labels(&labels::workspace_selector(workspace));
        self.runs().delete_collection(&DeleteParams::default(), &lp).await?;
        Ok(())
    }

    pub async fn delete_secret(&self, name: &str) -> Result<(), ClientError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);
        delete_ignore_missing(&api, name).await
    }

    pub async fn delete_service_account(&self, name: &str) -> Result<(), ClientError> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), &self.namespace);
        delete_ignore_missing(&api, name).await
    }
}

fn named_meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// Create, treating a 409 as "someone else made it" rather than a failure.
async fn create_if_absent<K>(api: &Api<K>, obj: &K) -> Result<bool, ClientError>
where
    K: Clone + std::fmt::Debug + serde::Serialize + serde::de::DeserializeOwned,
{
    match api.create(&PostParams::default(), obj).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(false),
        Err(err) => Err(err.into()),
    }
}

async fn delete_ignore_missing<K>(api: &Api<K>, name: &str) -> Result<(), ClientError>
where
    K: Clone + std::fmt::Debug + serde::de::DeserializeOwned,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Watch a single named object, forwarding each applied state. The watcher
/// retries with backoff; the channel closes only when the receiver is
/// dropped or the watch fails terminally.
fn forward_watch<K>(api: Api<K>, name: &str) -> mpsc::Receiver<K>
where
    K: kube::Resource + Clone + std::fmt::Debug + Send + serde::de::DeserializeOwned + 'static,
    K::DynamicType: Default + std::hash::Hash + Eq + Clone,
{
    let (tx, rx) = mpsc::channel(WATCH_BUFFER);
    let config = watcher::Config::default().fields(&format!("metadata.name={name}"));
    tokio::spawn(async move {
        let mut stream = watcher(api, config).default_backoff().applied_objects().boxed();
        while let Some(event) = stream.next().await {
            match event {
                Ok(obj) => {
                    if tx.send(obj).await.is_err() {
                        return;
                    }
                }
                Err(err) => warn!(error = %err, "watch error, retrying"),
            }
        }
    });
    rx
}
