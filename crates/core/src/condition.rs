// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status conditions for workspaces and runs.
//!
//! A [`ConditionSet`] is a keyed, insertion-ordered map from condition type
//! to [`Condition`]. Keying by type enforces at most one condition per type;
//! upserting a condition whose status is unchanged preserves the recorded
//! transition time, so `lastTransitionTime` only moves when the status
//! actually flips.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace is healthy: referenced secret and service account (if any) exist.
pub const HEALTHY: &str = "Healthy";
/// Workspace has been reconciled at least once.
pub const RECONCILED: &str = "Reconciled";
/// Run has reached its terminal state.
pub const COMPLETED: &str = "Completed";
/// Outcome of restoring state from the backup bucket.
pub const RESTORE_FAILURE: &str = "RestoreFailure";

/// Tri-state condition status, mirroring the Kubernetes convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(b: bool) -> Self {
        if b {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A single named condition: status plus the time the status last changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Ordered set of conditions, at most one per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ConditionSet(IndexMap<String, Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a condition. The transition time is only updated when the
    /// status differs from the currently recorded one.
    pub fn set(&mut self, r#type: &str, status: ConditionStatus, now: DateTime<Utc>) {
        match self.0.get_mut(r#type) {
            Some(existing) if existing.status == status => {}
            Some(existing) => {
                existing.status = status;
                existing.last_transition_time = Some(now);
            }
            None => {
                self.0.insert(
                    r#type.to_string(),
                    Condition { status, last_transition_time: Some(now) },
                );
            }
        }
    }

    pub fn get(&self, r#type: &str) -> Option<&Condition> {
        self.0.get(r#type)
    }

    /// Status of the given condition type, `Unknown` when absent.
    pub fn status(&self, r#type: &str) -> ConditionStatus {
        self.get(r#type).map(|c| c.status).unwrap_or_default()
    }

    pub fn is_true(&self, r#type: &str) -> bool {
        self.status(r#type) == ConditionStatus::True
    }

    /// True once the condition reports either `True` or `False`.
    pub fn is_settled(&self, r#type: &str) -> bool {
        matches!(
            self.status(r#type),
            ConditionStatus::True | ConditionStatus::False
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
