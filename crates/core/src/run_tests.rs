// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::condition::{ConditionStatus, COMPLETED};
use crate::labels;
use chrono::{TimeZone, Utc};

#[test]
fn run_without_status_is_not_completed() {
    let run = Run::new("plan-1", RunSpec::default());
    assert!(!run.is_completed());
}

#[test]
fn run_with_completed_true_is_terminal() {
    let now = Utc.timestamp_opt(100, 0).single().unwrap();
    let mut run = Run::new("plan-1", RunSpec::default());
    let mut status = RunStatus::default();
    status.conditions.set(COMPLETED, ConditionStatus::True, now);
    run.status = Some(status);

    assert!(run.is_completed());
}

#[test]
fn run_with_completed_false_is_still_pending() {
    let now = Utc.timestamp_opt(100, 0).single().unwrap();
    let mut run = Run::new("plan-1", RunSpec::default());
    let mut status = RunStatus::default();
    status.conditions.set(COMPLETED, ConditionStatus::False, now);
    run.status = Some(status);

    assert!(!run.is_completed());
}

#[test]
fn workspace_name_reads_the_label() {
    let mut run = Run::new("plan-1", RunSpec::default());
    assert_eq!(run.workspace_name(), None);

    run.metadata.labels = Some(labels::common("networks", labels::COMPONENT_RUN));
    assert_eq!(run.workspace_name(), Some("networks"));
}

#[test]
fn run_spec_serde_round_trip() {
    let spec = RunSpec { args: vec!["plan".into(), "-input=false".into()], privileged: true };
    let json = serde_json::to_string(&spec).unwrap();
    let parsed: RunSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, spec);
}
