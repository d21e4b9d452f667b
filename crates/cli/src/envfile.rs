// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `.terrace/env` pointer file.
//!
//! Records which `namespace/workspace` subsequent commands run against, so
//! `terrace run` works without flags after `terrace workspace new`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const ENV_DIR: &str = ".terrace";
const ENV_FILE: &str = "env";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Env {
    pub namespace: String,
    pub workspace: String,
}

impl Env {
    pub fn new(namespace: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), workspace: workspace.into() }
    }

    fn path(root: &Path) -> PathBuf {
        root.join(ENV_DIR).join(ENV_FILE)
    }

    /// Write the pointer under `root`, creating `.terrace/` if needed.
    pub fn write(&self, root: &Path) -> io::Result<()> {
        fs::create_dir_all(root.join(ENV_DIR))?;
        fs::write(Self::path(root), format!("{self}\n"))
    }

    /// Read the pointer under `root`; `Ok(None)` when none was written.
    pub fn read(root: &Path) -> io::Result<Option<Self>> {
        let contents = match fs::read_to_string(Self::path(root)) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let trimmed = contents.trim();
        let (namespace, workspace) = trimmed.split_once('/').ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed environment file, expected namespace/workspace: {trimmed:?}"),
            )
        })?;
        if namespace.is_empty() || workspace.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed environment file, expected namespace/workspace: {trimmed:?}"),
            ));
        }
        Ok(Some(Self::new(namespace, workspace)))
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.workspace)
    }
}

#[cfg(test)]
#[path = "envfile_tests.rs"]
mod tests;
