// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Run custom resource: a single requested tool invocation.
//!
//! A run belongs to exactly one workspace, linked by the
//! `terrace.dev/workspace` label rather than an owner reference: the
//! operator reads runs to rebuild the queue but never takes write ownership
//! of them. A run is terminal once its `Completed` condition is true, at
//! which point it drops out of the workspace queue.

use crate::condition::{self, ConditionSet};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a run.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "terrace.dev",
    version = "v1alpha1",
    kind = "Run",
    namespaced,
    status = "RunStatus",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct RunSpec {
    /// Tool arguments, e.g. `["plan", "-input=false"]`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Whether the submitting client asserted the privileged flag. The
    /// workspace's `privilegedCommands` list decides which commands need it.
    #[serde(default)]
    pub privileged: bool,
}

/// Observed state of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    #[serde(default, skip_serializing_if = "ConditionSet::is_empty")]
    pub conditions: ConditionSet,
    /// Exit status of the remote process, recovered by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl Run {
    /// Terminal runs are excluded from the workspace queue.
    pub fn is_completed(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.conditions.is_true(condition::COMPLETED))
    }

    /// The workspace this run is labeled for, if any.
    pub fn workspace_name(&self) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(crate::labels::WORKSPACE))
            .map(String::as_str)
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
