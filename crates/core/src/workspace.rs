// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Workspace custom resource.
//!
//! A workspace is a named execution context with its own cache volume,
//! generated backend configuration and runner pod. Runs queue against it
//! serially; the queue lives in the status and is rebuilt by the operator
//! from live cluster state on every reconciliation.

use crate::condition::{self, ConditionSet};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default size of the cache volume when the spec leaves it unset.
pub const DEFAULT_CACHE_SIZE: &str = "1Gi";
/// Name of the tool container inside the workspace pod. The operator
/// synthesizes it; the client waits on and streams it.
pub const RUNNER_CONTAINER: &str = "runner";
/// Default client idle timeout written into the runner pod's arguments.
pub const DEFAULT_TIMEOUT_CLIENT: &str = "10s";

/// Desired state of a workspace.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "terrace.dev",
    version = "v1alpha1",
    kind = "Workspace",
    namespaced,
    status = "WorkspaceStatus",
    shortname = "ws",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    /// Secret holding credentials, injected into the runner pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    /// Service account the runner pod runs as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(default)]
    pub cache: WorkspaceCacheSpec,
    #[serde(default)]
    pub backend: BackendSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    /// Run commands that require the privileged flag on their Run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub privileged_commands: Vec<String>,
    /// How long the runner waits for a client to attach before giving up.
    #[serde(default = "default_timeout_client")]
    pub timeout_client: String,
    #[serde(default)]
    pub verbosity: i32,
    /// GCS bucket to back the state file up to (and restore it from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_bucket: Option<String>,
    /// Override the terraform version baked into the runner image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
}

fn default_timeout_client() -> String {
    DEFAULT_TIMEOUT_CLIENT.to_string()
}

// Derived Default would leave timeout_client empty, diverging from the
// deserialization default.
impl Default for WorkspaceSpec {
    fn default() -> Self {
        Self {
            secret_name: None,
            service_account_name: None,
            cache: WorkspaceCacheSpec::default(),
            backend: BackendSpec::default(),
            variables: Vec::new(),
            privileged_commands: Vec::new(),
            timeout_client: default_timeout_client(),
            verbosity: 0,
            backup_bucket: None,
            terraform_version: None,
        }
    }
}

/// Cache volume settings.
///
/// `storage_class` is deliberately tri-state: `None` means "use the cluster
/// provisioner's default", `Some("")` requests an explicitly empty class,
/// and `Some(name)` names one. Flattening this to a plain string would lose
/// the first distinction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceCacheSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl WorkspaceCacheSpec {
    /// Requested size, defaulted when unset.
    pub fn size_or_default(&self) -> &str {
        self.size.as_deref().unwrap_or(DEFAULT_CACHE_SIZE)
    }
}

/// Backend type plus its free-form settings, rendered into the generated
/// config map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    #[serde(default, rename = "type")]
    pub backend_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
}

/// A terraform or environment variable passed to the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub key: String,
    #[serde(default)]
    pub value: String,
    /// When set, the variable is exported into the runner's environment
    /// instead of being passed as a tool variable.
    #[serde(default)]
    pub environment_variable: bool,
}

/// Observed state of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStatus {
    /// Names of this workspace's non-terminal runs, FIFO execution order.
    #[serde(default)]
    pub queue: Vec<String>,
    #[serde(default, skip_serializing_if = "ConditionSet::is_empty")]
    pub conditions: ConditionSet,
}

impl Workspace {
    /// Name shared by this workspace's dependent resources (config map,
    /// cache volume claim, runner pod).
    pub fn dependent_name(&self) -> String {
        format!("workspace-{}", self.metadata.name.as_deref().unwrap_or_default())
    }

    /// Whether the operator has observed this workspace at least once.
    pub fn is_reconciled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.conditions.is_true(condition::RECONCILED))
    }

    /// Whether a state restore outcome has been reported (either way).
    pub fn restore_settled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.conditions.is_settled(condition::RESTORE_FAILURE))
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
