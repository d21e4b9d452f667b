// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace run queue reconstruction.
//!
//! The queue is derived from live cluster state on every pass, merged
//! against the previously observed order: runs already queued keep their
//! relative position, newly observed runs are appended in creation order.
//! A fresh sort would let a run's position shift whenever an unrelated run
//! shows up in a different watch cycle, breaking FIFO under
//! eventually-consistent listing.

use std::collections::HashSet;
use terrace_core::Run;

/// Rebuild the queue from the previous order and the workspace's runs.
/// Completed runs drop out; survivors keep their old positions; new runs
/// append ordered by creation timestamp, ties broken by name.
pub fn rebuild(previous: &[String], runs: &[Run]) -> Vec<String> {
    let pending: Vec<&Run> = runs.iter().filter(|r| !r.is_completed()).collect();
    let pending_names: HashSet<&str> =
        pending.iter().filter_map(|r| r.metadata.name.as_deref()).collect();

    let mut queue: Vec<String> = previous
        .iter()
        .filter(|name| pending_names.contains(name.as_str()))
        .cloned()
        .collect();

    let known: HashSet<&str> = queue.iter().map(String::as_str).collect();
    let mut fresh: Vec<&Run> = pending
        .iter()
        .filter(|r| {
            r.metadata.name.as_deref().is_some_and(|name| !known.contains(name))
        })
        .copied()
        .collect();
    fresh.sort_by(|a, b| {
        let a_key = (a.metadata.creation_timestamp.as_ref().map(|t| t.0), &a.metadata.name);
        let b_key = (b.metadata.creation_timestamp.as_ref().map(|t| t.0), &b.metadata.name);
        a_key.cmp(&b_key)
    });

    queue.extend(fresh.iter().filter_map(|r| r.metadata.name.clone()));
    queue
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
