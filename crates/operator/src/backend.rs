// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend configuration rendering.
//!
//! Two blobs go into the workspace's generated config map: `backend.tf`, a
//! terraform block naming the backend type, and `backend.ini`, the backend's
//! key/value settings rendered one `key<TAB>= value` line per key in sorted
//! key order. The runner pod turns the ini blob into `-backend-config`
//! flags at init time.

use terrace_core::BackendSpec;

/// Config map key holding the terraform backend block.
pub const BACKEND_TF_KEY: &str = "backend.tf";
/// Config map key holding the backend settings.
pub const BACKEND_INI_KEY: &str = "backend.ini";

/// Render the terraform block naming the backend type. An unset type falls
/// back to `local`, which is still a valid configuration.
pub fn render_template(backend: &BackendSpec) -> String {
    let backend_type = if backend.backend_type.is_empty() {
        "local"
    } else {
        &backend.backend_type
    };
    format!("terraform {{\n  backend \"{}\" {{}}\n}}\n", backend_type)
}

/// Render the backend settings, one tab-separated line per key, sorted by
/// key. Empty string when there are no settings.
pub fn render_ini(backend: &BackendSpec) -> String {
    backend
        .config
        .iter()
        .map(|(k, v)| format!("{}\t= {}\n", k, v))
        .collect()
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
