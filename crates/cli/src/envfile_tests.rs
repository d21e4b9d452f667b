// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn round_trips_through_the_pointer_file() {
    let dir = tempfile::tempdir().unwrap();
    let env = Env::new("dev", "networking");
    env.write(dir.path()).unwrap();

    let got = Env::read(dir.path()).unwrap();
    assert_eq!(got, Some(env));
}

#[test]
fn missing_file_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Env::read(dir.path()).unwrap(), None);
}

#[test]
fn write_creates_the_dot_directory() {
    let dir = tempfile::tempdir().unwrap();
    Env::new("dev", "ws").write(dir.path()).unwrap();
    assert!(dir.path().join(".terrace").join("env").is_file());
}

#[test]
fn rewriting_replaces_the_previous_pointer() {
    let dir = tempfile::tempdir().unwrap();
    Env::new("dev", "old").write(dir.path()).unwrap();
    Env::new("dev", "new").write(dir.path()).unwrap();
    assert_eq!(Env::read(dir.path()).unwrap(), Some(Env::new("dev", "new")));
}

#[yare::parameterized(
    no_slash        = { "no-slash-here\n" },
    empty_namespace = { "/ws\n" },
    empty_workspace = { "dev/\n" },
)]
fn malformed_contents_are_an_error(contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".terrace")).unwrap();
    std::fs::write(dir.path().join(".terrace/env"), contents).unwrap();
    assert!(Env::read(dir.path()).is_err());
}

#[test]
fn displays_as_namespace_slash_workspace() {
    assert_eq!(Env::new("dev", "ws").to_string(), "dev/ws");
}
