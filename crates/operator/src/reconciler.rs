// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workspace reconciliation engine.
//!
//! Stateless between invocations: the workspace's own status (queue and
//! conditions) is the only persisted state, so every pass is safe from a
//! cold start and safe to repeat. Errors other than not-found propagate to
//! the dispatching controller, whose backoff policy retries per identity;
//! the engine itself never retries.

use crate::cluster::{Cluster, ClusterError};
use crate::{builders, queue};
use terrace_core::condition::{self, ConditionStatus};
use terrace_core::{Clock, Workspace};

pub struct Reconciler<C, K> {
    cluster: C,
    clock: K,
}

impl<C, K> Reconciler<C, K>
where
    C: Cluster,
    K: Clock,
{
    pub fn new(cluster: C, clock: K) -> Self {
        Self { cluster, clock }
    }

    /// Drive one workspace toward its declared spec. A missing workspace is
    /// success: dependents are garbage-collected through owner references,
    /// there is nothing left to do.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let Some(mut ws) = self.cluster.get_workspace(namespace, name).await? else {
            tracing::debug!(namespace, workspace = name, "workspace gone, nothing to reconcile");
            return Ok(());
        };

        let now = self.clock.now();
        let mut status = ws.status.clone().unwrap_or_default();

        // Advisory only: a missing secret or service account surfaces as
        // unhealthy but never blocks resource convergence.
        let healthy = self.references_exist(namespace, &ws).await?;
        status.conditions.set(condition::HEALTHY, healthy.into(), now);
        if !healthy {
            tracing::warn!(
                namespace,
                workspace = name,
                "referenced secret or service account missing"
            );
        }

        self.ensure_dependents(namespace, &ws).await?;

        let runs = self.cluster.list_runs(namespace, name).await?;
        status.queue = queue::rebuild(&status.queue, &runs);
        status.conditions.set(condition::RECONCILED, ConditionStatus::True, now);

        if ws.status.as_ref() != Some(&status) {
            tracing::info!(
                namespace,
                workspace = name,
                queue_len = status.queue.len(),
                healthy,
                "updating workspace status"
            );
            ws.status = Some(status);
            self.cluster.update_workspace_status(&ws).await?;
        }

        Ok(())
    }

    async fn references_exist(
        &self,
        namespace: &str,
        ws: &Workspace,
    ) -> Result<bool, ClusterError> {
        if let Some(secret) = ws.spec.secret_name.as_deref().filter(|s| !s.is_empty()) {
            if !self.cluster.secret_exists(namespace, secret).await? {
                return Ok(false);
            }
        }
        if let Some(account) = ws.spec.service_account_name.as_deref().filter(|s| !s.is_empty()) {
            if !self.cluster.service_account_exists(namespace, account).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Create whichever dependents are absent. Existing ones are left
    /// untouched: pods in particular are immutable once running.
    async fn ensure_dependents(
        &self,
        namespace: &str,
        ws: &Workspace,
    ) -> Result<(), ClusterError> {
        let dependent = ws.dependent_name();

        if self.cluster.get_config_map(namespace, &dependent).await?.is_none() {
            tracing::info!(namespace, config_map = %dependent, "creating backend config map");
            self.cluster.create_config_map(namespace, &builders::config_map(ws)).await?;
        }

        if self.cluster.get_pvc(namespace, &dependent).await?.is_none() {
            tracing::info!(namespace, pvc = %dependent, "creating cache volume claim");
            self.cluster.create_pvc(namespace, &builders::pvc(ws)).await?;
        }

        if self.cluster.get_pod(namespace, &dependent).await?.is_none() {
            tracing::info!(namespace, pod = %dependent, "creating workspace pod");
            self.cluster.create_pod(namespace, &builders::pod(ws)).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
