//! CLI smoke tests driving the `apiscope` binary as a subprocess.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[test]
fn no_plugins_reports_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("apiscope").unwrap();
    cmd.arg(dir.path()).arg("--no-plugins");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"routes\""))
        .stdout(predicate::str::contains("\"schemas\""));
}

#[test]
fn express_project_reports_routes_as_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), r#"{"dependencies":{"express":"^4.18.0"}}"#).unwrap();
    fs::write(
        dir.path().join("app.js"),
        "const express = require('express'); const app = express(); app.get('/health', h);",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("apiscope").unwrap();
    cmd.arg(dir.path()).arg("--plugins").arg("express").arg("--format").arg("json");
    cmd.assert().success().stdout(predicate::str::contains("/health"));
}

#[test]
fn missing_root_fails_with_nonzero_exit() {
    let mut cmd = Command::cargo_bin("apiscope").unwrap();
    cmd.arg("/nonexistent/apiscope-test-root-xyz");
    cmd.assert().failure();
}
