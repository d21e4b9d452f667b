// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use terrace_core::condition::{ConditionStatus, COMPLETED};
use terrace_core::{RunSpec, RunStatus};

fn run(name: &str, created_secs: i64) -> Run {
    let mut run = Run::new(name, RunSpec::default());
    run.metadata.creation_timestamp =
        Some(Time(Utc.timestamp_opt(created_secs, 0).single().unwrap()));
    run
}

fn completed_run(name: &str, created_secs: i64) -> Run {
    let mut run = run(name, created_secs);
    let mut status = RunStatus::default();
    status.conditions.set(
        COMPLETED,
        ConditionStatus::True,
        Utc.timestamp_opt(created_secs + 60, 0).single().unwrap(),
    );
    run.status = Some(status);
    run
}

#[test]
fn empty_input_yields_empty_queue() {
    assert_eq!(rebuild(&[], &[]), Vec::<String>::new());
}

#[test]
fn new_runs_append_in_creation_order() {
    let runs = vec![run("plan-2", 200), run("plan-1", 100)];
    assert_eq!(rebuild(&[], &runs), vec!["plan-1", "plan-2"]);
}

#[test]
fn creation_ties_break_by_name() {
    let runs = vec![run("plan-b", 100), run("plan-a", 100)];
    assert_eq!(rebuild(&[], &runs), vec!["plan-a", "plan-b"]);
}

#[test]
fn completed_runs_are_excluded() {
    let runs = vec![completed_run("plan-0", 50), run("plan-1", 100), run("plan-2", 200)];
    assert_eq!(rebuild(&[], &runs), vec!["plan-1", "plan-2"]);
}

#[test]
fn completed_runs_drop_out_of_an_existing_queue() {
    let previous = vec!["plan-1".to_string(), "plan-2".to_string()];
    let runs = vec![completed_run("plan-1", 100), run("plan-2", 200)];
    assert_eq!(rebuild(&previous, &runs), vec!["plan-2"]);
}

#[test]
fn existing_entries_keep_their_position() {
    let previous = vec!["plan-1".to_string()];
    let runs = vec![run("plan-1", 100), run("plan-2", 200)];
    assert_eq!(rebuild(&previous, &runs), vec!["plan-1", "plan-2"]);
}

#[test]
fn previous_order_wins_over_creation_order() {
    // plan-2 was observed first in an earlier pass; a later listing that
    // includes the older plan-1 must not reshuffle it to the front.
    let previous = vec!["plan-2".to_string()];
    let runs = vec![run("plan-1", 100), run("plan-2", 200)];
    assert_eq!(rebuild(&previous, &runs), vec!["plan-2", "plan-1"]);
}

#[test]
fn vanished_runs_are_pruned() {
    let previous = vec!["plan-1".to_string(), "plan-2".to_string()];
    let runs = vec![run("plan-2", 200)];
    assert_eq!(rebuild(&previous, &runs), vec!["plan-2"]);
}

#[test]
fn runs_without_creation_timestamp_sort_first() {
    let runs = vec![run("plan-1", 100), Run::new("plan-0", RunSpec::default())];
    assert_eq!(rebuild(&[], &runs), vec!["plan-0", "plan-1"]);
}
