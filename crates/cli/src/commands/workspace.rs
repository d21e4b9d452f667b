// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `terrace workspace new` and `terrace workspace delete`.
//!
//! `new` creates the workspace's identity resources and the workspace
//! itself, runs the readiness protocol, streams the runner's output, and
//! records the environment pointer. On failure it deletes whatever it
//! created, newest first, unless cleanup is disabled.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use clap::{Args, Subcommand};
use kube::Client;
use terrace_core::workspace::RUNNER_CONTAINER;
use terrace_core::{labels, BackendSpec, Workspace, WorkspaceCacheSpec, WorkspaceSpec};
use tracing::{info, warn};

use crate::client::AppClient;
use crate::envfile::Env;
use crate::error::ClientError;
use crate::exit_error::ExitError;
use crate::monitor::spawn_exit_monitor;
use crate::protocol::{await_ready, Timeouts};

/// Final bound on exit-code recovery once log streaming has ended.
pub const EXIT_CODE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Create a workspace and wait for it to become ready
    New(NewArgs),
    /// Delete a workspace and its runs
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Workspace name
    pub name: String,
    #[arg(long, default_value = "default")]
    pub namespace: String,
    /// Secret injected into the runner pod
    #[arg(long, default_value = "terrace")]
    pub secret: String,
    /// Service account the runner pod runs as
    #[arg(long, default_value = "terrace")]
    pub service_account: String,
    /// Skip creating the secret if it is missing
    #[arg(long)]
    pub no_create_secret: bool,
    /// Skip creating the service account if it is missing
    #[arg(long)]
    pub no_create_service_account: bool,
    /// Cache volume size, e.g. 2Gi
    #[arg(long)]
    pub cache_size: Option<String>,
    /// Cache volume storage class; omit for the cluster default
    #[arg(long)]
    pub storage_class: Option<String>,
    /// Backend type, e.g. gcs
    #[arg(long, default_value = "local")]
    pub backend_type: String,
    /// Backend setting as key=value, repeatable
    #[arg(long = "backend-config")]
    pub backend_config: Vec<String>,
    /// GCS bucket to back the state file up to
    #[arg(long)]
    pub backup_bucket: Option<String>,
    /// Override the terraform version baked into the runner image
    #[arg(long)]
    pub terraform_version: Option<String>,
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub reconcile_timeout: Duration,
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub pod_timeout: Duration,
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub restore_timeout: Duration,
    /// Leave created resources in place when creation fails
    #[arg(long)]
    pub disable_cleanup: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Workspace name
    pub name: String,
    #[arg(long, default_value = "default")]
    pub namespace: String,
}

pub async fn execute(cmd: WorkspaceCommand) -> Result<(), ExitError> {
    match cmd {
        WorkspaceCommand::New(args) => match new_workspace(args).await {
            Ok(0) => Ok(()),
            Ok(code) => Err(ExitError::silent(code)),
            Err(err) => Err(err.into()),
        },
        WorkspaceCommand::Delete(args) => delete_workspace(args).await.map_err(Into::into),
    }
}

/// Resources created by this invocation, newest last. Cleanup walks the
/// list in reverse so dependents go before the things they reference.
enum Created {
    ServiceAccount(String),
    Secret(String),
    Workspace(String),
}

struct CreatedStack {
    app: AppClient,
    entries: Vec<Created>,
    enabled: bool,
}

impl CreatedStack {
    fn new(app: AppClient, enabled: bool) -> Self {
        Self { app, entries: Vec::new(), enabled }
    }

    fn push(&mut self, entry: Created) {
        self.entries.push(entry);
    }

    /// Best-effort: a failed delete is logged, never surfaced in place of
    /// the original error.
    async fn cleanup(self) {
        if !self.enabled {
            return;
        }
        for entry in self.entries.into_iter().rev() {
            let result = match &entry {
                Created::Workspace(name) => self.app.delete_workspace(name).await,
                Created::Secret(name) => self.app.delete_secret(name).await,
                Created::ServiceAccount(name) => self.app.delete_service_account(name).await,
            };
            if let Err(err) = result {
                warn!(error = %err, "cleanup failed");
            }
        }
    }
}

async fn new_workspace(args: NewArgs) -> Result<i32, ClientError> {
    let client = Client::try_default().await?;
    let app = AppClient::new(client, &args.namespace);
    let mut created = CreatedStack::new(app.clone(), !args.disable_cleanup);

    match create_and_wait(&app, &args, &mut created).await {
        Ok(code) => Ok(code),
        Err(err) => {
            created.cleanup().await;
            Err(err)
        }
    }
}

async fn create_and_wait(
    app: &AppClient,
    args: &NewArgs,
    created: &mut CreatedStack,
) -> Result<i32, ClientError> {
    if !args.no_create_service_account && app.ensure_service_account(&args.service_account).await? {
        info!(name = %args.service_account, "created service account");
        created.push(Created::ServiceAccount(args.service_account.clone()));
    }
    if !args.no_create_secret && app.ensure_secret(&args.secret).await? {
        info!(name = %args.secret, "created secret");
        created.push(Created::Secret(args.secret.clone()));
    }

    let workspace = build_workspace(args)?;
    let workspace = app.create_workspace(&workspace).await?;
    created.push(Created::Workspace(args.name.clone()));
    println!("Created workspace {}/{}", args.namespace, args.name);

    let pod_name = workspace.dependent_name();
    let timeouts = Timeouts {
        reconcile: args.reconcile_timeout,
        pod: args.pod_timeout,
        restore: args.backup_bucket.is_some().then_some(args.restore_timeout),
    };
    await_ready(
        app.watch_workspace(&args.name),
        app.watch_pod(&pod_name),
        RUNNER_CONTAINER.to_string(),
        timeouts,
    )
    .await?;

    // Monitor first: the container may terminate while we stream.
    let exit = spawn_exit_monitor(app.watch_pod(&pod_name), RUNNER_CONTAINER.to_string());
    app.stream_logs(&pod_name, RUNNER_CONTAINER).await?;

    let env = Env::new(&args.namespace, &args.name);
    env.write(Path::new("."))?;
    info!(%env, "wrote environment pointer");

    match tokio::time::timeout(EXIT_CODE_TIMEOUT, exit).await {
        Ok(Ok(code)) => Ok(code),
        Ok(Err(_)) | Err(_) => Err(ClientError::ExitCodeTimeout),
    }
}

fn build_workspace(args: &NewArgs) -> Result<Workspace, ClientError> {
    let mut config = BTreeMap::new();
    for entry in &args.backend_config {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| ClientError::MalformedConfig(entry.clone()))?;
        config.insert(key.to_string(), value.to_string());
    }

    let spec = WorkspaceSpec {
        secret_name: Some(args.secret.clone()),
        service_account_name: Some(args.service_account.clone()),
        cache: WorkspaceCacheSpec {
            size: args.cache_size.clone(),
            storage_class: args.storage_class.clone(),
        },
        backend: BackendSpec {
            backend_type: args.backend_type.clone(),
            config,
        },
        backup_bucket: args.backup_bucket.clone(),
        terraform_version: args.terraform_version.clone(),
        ..Default::default()
    };

    let mut workspace = Workspace::new(&args.name, spec);
    workspace.metadata.labels = Some(labels::common(&args.name, labels::COMPONENT_WORKSPACE));
    Ok(workspace)
}

async fn delete_workspace(args: DeleteArgs) -> Result<(), ClientError> {
    let client = Client::try_default().await?;
    let app = AppClient::new(client, &args.namespace);

    // Dependents are garbage-collected with the workspace; runs are only
    // labeled for it, so they need an explicit sweep.
    app.delete_workspace(&args.name).await?;
    app.delete_runs(&args.name).await?;
    println!("Deleted workspace {}/{}", args.namespace, args.name);
    Ok(())
}
