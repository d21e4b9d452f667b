// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Common labels applied to every resource the client or operator creates.
//!
//! The workspace label is the only load-bearing one: runs carry it so the
//! operator can list a workspace's runs without a secondary index, and
//! `workspace delete` uses it to sweep a workspace's runs.

use std::collections::BTreeMap;

/// Label naming the workspace a resource belongs to.
pub const WORKSPACE: &str = "terrace.dev/workspace";
/// Label naming the component that created a resource.
pub const COMPONENT: &str = "terrace.dev/component";
/// Standard app label.
pub const APP: &str = "app.kubernetes.io/name";

pub const APP_NAME: &str = "terrace";
pub const COMPONENT_WORKSPACE: &str = "workspace";
pub const COMPONENT_RUN: &str = "run";

/// Labels for a resource belonging to `workspace`, created by `component`.
pub fn common(workspace: &str, component: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP.to_string(), APP_NAME.to_string()),
        (WORKSPACE.to_string(), workspace.to_string()),
        (COMPONENT.to_string(), component.to_string()),
    ])
}

/// List selector matching every resource labeled for `workspace`.
pub fn workspace_selector(workspace: &str) -> String {
    format!("{}={}", WORKSPACE, workspace)
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
