// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller wiring: subscribes the engine to cluster changes.
//!
//! The engine is invoked once per observed change to a workspace, to any
//! dependent it owns, or to any run labeled for it, plus a periodic resync
//! as a safety net. Retry with backoff on error lives here, not in the
//! engine.

use crate::cluster::{ClusterError, KubeCluster};
use crate::reconciler::Reconciler;
use futures_util::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod};
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use terrace_core::{Run, SystemClock, Workspace};

const RESYNC_INTERVAL: Duration = Duration::from_secs(300);
const ERROR_REQUEUE: Duration = Duration::from_secs(5);

struct Context {
    reconciler: Reconciler<KubeCluster, SystemClock>,
}

async fn reconcile(ws: Arc<Workspace>, ctx: Arc<Context>) -> Result<Action, ClusterError> {
    let namespace = ws.namespace().unwrap_or_else(|| "default".to_string());
    let name = ws.name_any();
    ctx.reconciler.reconcile(&namespace, &name).await?;
    Ok(Action::requeue(RESYNC_INTERVAL))
}

fn error_policy(ws: Arc<Workspace>, err: &ClusterError, _ctx: Arc<Context>) -> Action {
    tracing::warn!(workspace = %ws.name_any(), error = %err, "reconcile failed, requeueing");
    Action::requeue(ERROR_REQUEUE)
}

/// Map a changed run back to the workspace it is labeled for.
fn run_to_workspace(run: Run) -> Option<ObjectRef<Workspace>> {
    let namespace = run.namespace()?;
    run.workspace_name().map(|ws| ObjectRef::new(ws).within(&namespace))
}

/// Run the workspace controller until the process is stopped.
pub async fn run(client: Client) {
    let workspaces: Api<Workspace> = Api::all(client.clone());
    let pvcs: Api<PersistentVolumeClaim> = Api::all(client.clone());
    let config_maps: Api<ConfigMap> = Api::all(client.clone());
    let pods: Api<Pod> = Api::all(client.clone());
    let runs: Api<Run> = Api::all(client.clone());

    let context = Arc::new(Context {
        reconciler: Reconciler::new(KubeCluster::new(client), SystemClock),
    });

    Controller::new(workspaces, watcher::Config::default())
        .owns(pvcs, watcher::Config::default())
        .owns(config_maps, watcher::Config::default())
        .owns(pods, watcher::Config::default())
        .watches(runs, watcher::Config::default(), run_to_workspace)
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => tracing::debug!(workspace = %obj.name, "reconciled"),
                Err(err) => tracing::warn!(error = %err, "controller error"),
            }
        })
        .await;
}
