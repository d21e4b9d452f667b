// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! terrace-core: resource model shared by the operator and the CLI.
//!
//! Defines the `Workspace` and `Run` custom resources (group
//! `terrace.dev/v1alpha1`), the condition set attached to their statuses,
//! the label scheme linking runs to workspaces, and a clock abstraction so
//! condition transition times are testable.

pub mod clock;
pub mod condition;
pub mod labels;
pub mod run;
pub mod workspace;

pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{Condition, ConditionSet, ConditionStatus};
pub use run::{Run, RunSpec, RunStatus};
pub use workspace::{
    BackendSpec, Variable, Workspace, WorkspaceCacheSpec, WorkspaceSpec, WorkspaceStatus,
};
