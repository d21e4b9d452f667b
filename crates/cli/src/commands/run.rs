// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `terrace run` — submit a command against the selected workspace.
//!
//! The run is created, waits its turn in the workspace queue, then the
//! client streams the runner pod and records the command's exit status on
//! the run itself.

use std::path::Path;
use std::time::Duration;

use clap::Args;
use kube::Client;
use terrace_core::workspace::RUNNER_CONTAINER;
use terrace_core::{labels, Run, RunSpec, Workspace};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::AppClient;
use crate::envfile::Env;
use crate::error::ClientError;
use crate::exit_error::ExitError;
use crate::monitor::{container_ready, spawn_exit_monitor};
use crate::waiter::{wait_for, WaitError};

use super::workspace::EXIT_CODE_TIMEOUT;

/// Run names are short random suffixes, like generated pod names.
const NAME_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
    'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

#[derive(Args)]
pub struct RunArgs {
    /// Workspace to run against; defaults to the environment pointer
    #[arg(long)]
    pub workspace: Option<String>,
    #[arg(long)]
    pub namespace: Option<String>,
    /// How long to wait for the run to show up in the queue at all
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub enqueue_timeout: Duration,
    /// How long to wait for runs ahead in the queue to finish
    #[arg(long, default_value = "1h", value_parser = humantime::parse_duration)]
    pub queue_timeout: Duration,
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub pod_timeout: Duration,
    /// Command and arguments to run, e.g. `plan -input=false`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub async fn execute(args: RunArgs) -> Result<(), ExitError> {
    match run(args).await {
        Ok(0) => Ok(()),
        Ok(code) => Err(ExitError::silent(code)),
        Err(err) => Err(err.into()),
    }
}

fn on_timeout(err: WaitError, sentinel: ClientError) -> ClientError {
    match err {
        WaitError::TimedOut => sentinel,
        WaitError::Cancelled => ClientError::Cancelled,
        WaitError::StreamClosed => ClientError::WatchClosed,
    }
}

fn queue_position(ws: &Workspace, run: &str) -> Option<usize> {
    ws.status
        .as_ref()
        .and_then(|s| s.queue.iter().position(|name| name == run))
}

async fn run(args: RunArgs) -> Result<i32, ClientError> {
    let env = Env::read(Path::new("."))?;
    let workspace_name = args
        .workspace
        .clone()
        .or_else(|| env.as_ref().map(|e| e.workspace.clone()))
        .ok_or(ClientError::NoWorkspaceSelected)?;
    let namespace = args
        .namespace
        .clone()
        .or_else(|| env.as_ref().map(|e| e.namespace.clone()))
        .unwrap_or_else(|| "default".to_string());
    if args.args.is_empty() {
        return Err(ClientError::MissingCommand);
    }

    let client = Client::try_default().await?;
    let app = AppClient::new(client, &namespace);

    let workspace = app
        .get_workspace(&workspace_name)
        .await?
        .ok_or_else(|| ClientError::WorkspaceNotFound(workspace_name.clone()))?;

    let privileged = workspace.spec.privileged_commands.contains(&args.args[0]);
    let name = format!("run-{}", nanoid::nanoid!(5, &NAME_ALPHABET));
    let mut run = Run::new(&name, RunSpec { args: args.args.clone(), privileged });
    run.metadata.labels = Some(labels::common(&workspace_name, labels::COMPONENT_RUN));
    app.create_run(&run).await?;
    info!(run = %name, workspace = %workspace_name, "created run");

    // Seeing the run in the queue is the first evidence the operator has
    // picked it up; reaching the head can take as long as the runs ahead.
    let cancel = CancellationToken::new();
    let mut ws_rx = app.watch_workspace(&workspace_name);
    let state = wait_for(
        &mut ws_rx,
        |ws| queue_position(ws, &name).is_some(),
        args.enqueue_timeout,
        &cancel,
    )
    .await
    .map_err(|e| on_timeout(e, ClientError::EnqueueTimeout))?;
    if queue_position(&state, &name) != Some(0) {
        wait_for(
            &mut ws_rx,
            |ws| queue_position(ws, &name) == Some(0),
            args.queue_timeout,
            &cancel,
        )
        .await
        .map_err(|e| on_timeout(e, ClientError::QueueTimeout))?;
    }
    drop(ws_rx);

    let pod_name = workspace.dependent_name();
    let mut pod_rx = app.watch_pod(&pod_name);
    wait_for(
        &mut pod_rx,
        |pod| container_ready(pod, RUNNER_CONTAINER),
        args.pod_timeout,
        &cancel,
    )
    .await
    .map_err(|e| on_timeout(e, ClientError::PodTimeout))?;
    drop(pod_rx);

    let exit = spawn_exit_monitor(app.watch_pod(&pod_name), RUNNER_CONTAINER.to_string());
    app.stream_logs(&pod_name, RUNNER_CONTAINER).await?;

    let code = match tokio::time::timeout(EXIT_CODE_TIMEOUT, exit).await {
        Ok(Ok(code)) => code,
        Ok(Err(_)) | Err(_) => return Err(ClientError::ExitCodeTimeout),
    };
    app.complete_run(&name, code).await?;
    Ok(code)
}
