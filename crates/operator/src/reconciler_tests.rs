// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cluster::fake::{ClusterCall, FakeCluster};
use chrono::{TimeZone, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use terrace_core::condition::{ConditionStatus, COMPLETED, HEALTHY, RECONCILED};
use terrace_core::{labels, FakeClock, Run, RunSpec, RunStatus, WorkspaceSpec, WorkspaceStatus};

fn workspace(name: &str, spec: WorkspaceSpec) -> Workspace {
    let mut ws = Workspace::new(name, spec);
    ws.metadata.namespace = Some("default".to_string());
    ws.metadata.uid = Some(format!("uid-{}", name));
    ws
}

fn run_for(workspace: &str, name: &str, created_secs: i64) -> Run {
    let mut run = Run::new(name, RunSpec::default());
    run.metadata.namespace = Some("default".to_string());
    run.metadata.labels = Some(labels::common(workspace, labels::COMPONENT_RUN));
    run.metadata.creation_timestamp =
        Some(Time(Utc.timestamp_opt(created_secs, 0).single().unwrap()));
    run
}

fn reconciler(cluster: FakeCluster) -> Reconciler<FakeCluster, FakeClock> {
    Reconciler::new(cluster, FakeClock::new())
}

#[tokio::test]
async fn missing_workspace_is_not_an_error() {
    let cluster = FakeCluster::new();
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ghost").await.unwrap();
    assert!(cluster.calls().is_empty());
}

#[tokio::test]
async fn creates_all_dependents_when_absent() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace("ws-1", WorkspaceSpec::default()));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    assert!(cluster.config_map("default", "workspace-ws-1").is_some());
    assert!(cluster.pvc("default", "workspace-ws-1").is_some());
    assert!(cluster.pod("default", "workspace-ws-1").is_some());
}

#[tokio::test]
async fn second_pass_is_idempotent() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace("ws-1", WorkspaceSpec::default()));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();
    let first_pass = cluster.calls();
    let status_after_first = cluster.workspace("default", "ws-1").unwrap().status;

    r.reconcile("default", "ws-1").await.unwrap();

    assert_eq!(cluster.calls(), first_pass, "second pass must not mutate anything");
    assert_eq!(cluster.workspace("default", "ws-1").unwrap().status, status_after_first);
}

#[tokio::test]
async fn missing_secret_marks_unhealthy_but_still_converges() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace(
        "ws-1",
        WorkspaceSpec { secret_name: Some("creds".into()), ..Default::default() },
    ));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.conditions.status(HEALTHY), ConditionStatus::False);
    // Advisory only: dependents are created regardless.
    assert!(cluster.pod("default", "workspace-ws-1").is_some());
}

#[tokio::test]
async fn missing_service_account_marks_unhealthy() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace(
        "ws-1",
        WorkspaceSpec { service_account_name: Some("terrace".into()), ..Default::default() },
    ));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.conditions.status(HEALTHY), ConditionStatus::False);
}

#[tokio::test]
async fn existing_references_mark_healthy() {
    let cluster = FakeCluster::new();
    cluster.seed_secret("default", "creds");
    cluster.seed_service_account("default", "terrace");
    cluster.seed_workspace(workspace(
        "ws-1",
        WorkspaceSpec {
            secret_name: Some("creds".into()),
            service_account_name: Some("terrace".into()),
            ..Default::default()
        },
    ));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.conditions.status(HEALTHY), ConditionStatus::True);
}

#[tokio::test]
async fn no_references_means_healthy() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace("ws-1", WorkspaceSpec::default()));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.conditions.status(HEALTHY), ConditionStatus::True);
    assert_eq!(status.conditions.status(RECONCILED), ConditionStatus::True);
}

#[tokio::test]
async fn queue_contains_only_this_workspaces_runs() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace("ws-1", WorkspaceSpec::default()));
    cluster.seed_run(run_for("ws-1", "plan-1", 100));
    cluster.seed_run(run_for("ws-1", "plan-2", 200));
    cluster.seed_run(run_for("ws-2", "plan-3", 150));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.queue, vec!["plan-1", "plan-2"]);
}

#[tokio::test]
async fn completed_run_is_excluded_from_queue() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace("ws-1", WorkspaceSpec::default()));
    let mut done = run_for("ws-1", "plan-0", 50);
    let mut status = RunStatus::default();
    status.conditions.set(
        COMPLETED,
        ConditionStatus::True,
        Utc.timestamp_opt(60, 0).single().unwrap(),
    );
    done.status = Some(status);
    cluster.seed_run(done);
    cluster.seed_run(run_for("ws-1", "plan-1", 100));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.queue, vec!["plan-1"]);
}

#[tokio::test]
async fn existing_queue_order_is_preserved() {
    let cluster = FakeCluster::new();
    let mut ws = workspace("ws-1", WorkspaceSpec::default());
    ws.status = Some(WorkspaceStatus {
        queue: vec!["plan-1".to_string()],
        ..Default::default()
    });
    cluster.seed_workspace(ws);
    cluster.seed_run(run_for("ws-1", "plan-1", 100));
    cluster.seed_run(run_for("ws-1", "plan-2", 200));
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();

    let status = cluster.workspace("default", "ws-1").unwrap().status.unwrap();
    assert_eq!(status.queue, vec!["plan-1", "plan-2"]);
}

#[tokio::test]
async fn api_errors_propagate_to_the_caller() {
    let cluster = FakeCluster::new();
    cluster.seed_workspace(workspace("ws-1", WorkspaceSpec::default()));
    cluster.fail_with("connection refused");
    let r = reconciler(cluster.clone());

    let err = r.reconcile("default", "ws-1").await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn existing_pod_is_left_untouched() {
    let cluster = FakeCluster::new();
    let ws = workspace("ws-1", WorkspaceSpec::default());
    cluster.seed_workspace(ws.clone());
    let r = reconciler(cluster.clone());

    r.reconcile("default", "ws-1").await.unwrap();
    let pod_before = cluster.pod("default", "workspace-ws-1").unwrap();

    // Change the spec; the running pod must not be recreated or patched.
    let mut changed = ws;
    changed.spec.terraform_version = Some("1.5.7".into());
    cluster.seed_workspace(changed);
    r.reconcile("default", "ws-1").await.unwrap();

    assert_eq!(cluster.pod("default", "workspace-ws-1").unwrap(), pod_before);
    let pod_creates = cluster
        .calls()
        .iter()
        .filter(|c| matches!(c, ClusterCall::CreatePod(_)))
        .count();
    assert_eq!(pod_creates, 1);
}
