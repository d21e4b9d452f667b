// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! terrace-operator: the workspace reconciliation engine.
//!
//! The engine is a level-triggered control loop. Given a workspace identity
//! it fetches current state, synthesizes the desired dependent resources
//! (cache volume claim, backend config map, runner pod), creates whichever
//! are absent, rebuilds the run queue from live cluster state and persists
//! the status. Every pass is idempotent; retry on error belongs to the
//! dispatching controller, not the engine.

pub mod backend;
pub mod builders;
pub mod cluster;
pub mod controller;
pub mod queue;
pub mod reconciler;

pub use cluster::{Cluster, ClusterError, KubeCluster};
pub use reconciler::Reconciler;

#[cfg(any(test, feature = "test-support"))]
pub use cluster::fake::{ClusterCall, FakeCluster};
