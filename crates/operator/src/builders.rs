// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource synthesis — pure functions from a workspace spec to the desired
//! dependent resources. No I/O here; the reconciler decides what to create.

use crate::backend;
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, EnvFromSource, EnvVar, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, Pod, PodSpec, SecretEnvSource,
    SecretVolumeSource, Volume, VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeMap;
use terrace_core::{labels, Workspace};

pub use terrace_core::workspace::RUNNER_CONTAINER;

/// Runner image; `terraformVersion` in the spec overrides the tag.
pub const DEFAULT_IMAGE: &str = "terrace/runner:latest";

/// Secret key holding a GCP credentials file, translated to
/// `GOOGLE_APPLICATION_CREDENTIALS` inside the pod.
pub const GOOGLE_CREDENTIALS_KEY: &str = "google-credentials.json";
const CREDENTIALS_MOUNT_PATH: &str = "/credentials";

fn owner_reference(ws: &Workspace) -> OwnerReference {
    OwnerReference {
        api_version: "terrace.dev/v1alpha1".to_string(),
        kind: "Workspace".to_string(),
        name: ws.metadata.name.clone().unwrap_or_default(),
        uid: ws.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Metadata shared by every dependent: deterministic name, the workspace's
/// namespace, common labels, and an owner reference so deleting the
/// workspace garbage-collects the dependent.
fn metadata(ws: &Workspace) -> ObjectMeta {
    ObjectMeta {
        name: Some(ws.dependent_name()),
        namespace: ws.metadata.namespace.clone(),
        labels: Some(labels::common(
            ws.metadata.name.as_deref().unwrap_or_default(),
            labels::COMPONENT_WORKSPACE,
        )),
        owner_references: Some(vec![owner_reference(ws)]),
        ..Default::default()
    }
}

/// Backend configuration for the workspace.
pub fn config_map(ws: &Workspace) -> ConfigMap {
    ConfigMap {
        metadata: metadata(ws),
        data: Some(BTreeMap::from([
            (backend::BACKEND_TF_KEY.to_string(), backend::render_template(&ws.spec.backend)),
            (backend::BACKEND_INI_KEY.to_string(), backend::render_ini(&ws.spec.backend)),
        ])),
        ..Default::default()
    }
}

/// Cache volume claim. Size defaults to 1Gi; a `None` storage class is left
/// unset so the cluster provisioner default applies.
pub fn pvc(ws: &Workspace) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: metadata(ws),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: ws.spec.cache.storage_class.clone(),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(ws.spec.cache.size_or_default().to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Runner container arguments: `--kind Workspace --name <name> --namespace
/// <ns> --timeout <client-timeout> --v <verbosity> -- <tool flags>`.
pub fn runner_args(ws: &Workspace) -> Vec<String> {
    let mut args = vec![
        "--kind".to_string(),
        "Workspace".to_string(),
        "--name".to_string(),
        ws.metadata.name.clone().unwrap_or_default(),
        "--namespace".to_string(),
        ws.metadata.namespace.clone().unwrap_or_else(|| "default".to_string()),
        "--timeout".to_string(),
        ws.spec.timeout_client.clone(),
        "--v".to_string(),
        ws.spec.verbosity.to_string(),
        "--".to_string(),
    ];
    for var in ws.spec.variables.iter().filter(|v| !v.environment_variable) {
        args.push("-var".to_string());
        args.push(format!("{}={}", var.key, var.value));
    }
    args
}

fn image(ws: &Workspace) -> String {
    match &ws.spec.terraform_version {
        Some(version) => format!("terrace/runner:{}", version),
        None => DEFAULT_IMAGE.to_string(),
    }
}

/// The workspace's execution pod. Created once and never patched: pods are
/// immutable once running, so changes to the spec only take effect through
/// pod recreation.
pub fn pod(ws: &Workspace) -> Pod {
    let mut env: Vec<EnvVar> = ws
        .spec
        .variables
        .iter()
        .filter(|v| v.environment_variable)
        .map(|v| EnvVar { name: v.key.clone(), value: Some(v.value.clone()), ..Default::default() })
        .collect();

    let mut env_from = None;
    let mut volumes = vec![
        Volume {
            name: "cache".to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: ws.dependent_name(),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: "backend-config".to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: ws.dependent_name(),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];
    let mut volume_mounts = vec![
        VolumeMount {
            name: "cache".to_string(),
            mount_path: "/cache".to_string(),
            ..Default::default()
        },
        VolumeMount {
            name: "backend-config".to_string(),
            mount_path: "/backend".to_string(),
            read_only: Some(true),
            ..Default::default()
        },
    ];

    if let Some(secret) = ws.spec.secret_name.as_deref().filter(|s| !s.is_empty()) {
        // Bulk-inject every key, and surface the credentials file through
        // the well-known variable terraform's GCP provider reads.
        env_from = Some(vec![EnvFromSource {
            secret_ref: Some(SecretEnvSource {
                name: secret.to_string(),
                optional: Some(true),
            }),
            ..Default::default()
        }]);
        env.push(EnvVar {
            name: "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            value: Some(format!("{}/{}", CREDENTIALS_MOUNT_PATH, GOOGLE_CREDENTIALS_KEY)),
            ..Default::default()
        });
        volumes.push(Volume {
            name: "credentials".to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        volume_mounts.push(VolumeMount {
            name: "credentials".to_string(),
            mount_path: CREDENTIALS_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        });
    }

    let container = Container {
        name: RUNNER_CONTAINER.to_string(),
        image: Some(image(ws)),
        args: Some(runner_args(ws)),
        env: Some(env),
        env_from,
        volume_mounts: Some(volume_mounts),
        working_dir: Some("/workspace".to_string()),
        ..Default::default()
    };

    Pod {
        metadata: metadata(ws),
        spec: Some(PodSpec {
            containers: vec![container],
            volumes: Some(volumes),
            restart_policy: Some("Never".to_string()),
            service_account_name: ws
                .spec
                .service_account_name
                .clone()
                .filter(|s| !s.is_empty()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "builders_tests.rs"]
mod tests;
