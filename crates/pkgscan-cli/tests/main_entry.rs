//! Integration tests for the `pkgscan` binary entry point.
//!
//! Covers configuration flags and environment variables reaching the
//! subcommands, and the exit statuses seen by callers.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const EMPTY_PARSER: &str = "cat >/dev/null\nprintf '[]'\n";

fn write_parser(dir: &TempDir, body: &str) -> String {
    let script = dir.path().join("parser.sh");
    fs::write(&script, body).expect("write parser script");
    script.to_string_lossy().into_owned()
}

#[test]
fn parse_uses_the_parser_from_command_line_flags() {
    let dir = TempDir::new().expect("temp dir");
    let script = write_parser(&dir, EMPTY_PARSER);

    let mut command = cargo_bin_cmd!("pkgscan");
    command
        .args(["--parser-program", "/bin/sh", "--parser-script", &script, "parse"])
        .write_stdin("module.exports = {};");
    command
        .assert()
        .success()
        .stdout(contains("\"valid\": true"));
}

#[test]
fn parse_uses_the_parser_from_the_environment() {
    let dir = TempDir::new().expect("temp dir");
    let script = write_parser(&dir, "cat >/dev/null\nexit 33\n");

    let mut command = cargo_bin_cmd!("pkgscan");
    command
        .env("PKGSCAN_PARSER_PROGRAM", "/bin/sh")
        .env("PKGSCAN_PARSER_SCRIPT", &script)
        .arg("parse")
        .write_stdin("<?php echo 1; ?>");
    command
        .assert()
        .code(2)
        .stdout(contains("\"valid\": false"));
}

#[test]
fn logs_stay_off_stdout() {
    let dir = TempDir::new().expect("temp dir");
    let script = write_parser(&dir, EMPTY_PARSER);

    let mut command = cargo_bin_cmd!("pkgscan");
    command
        .args([
            "--log-filter",
            "trace",
            "--log-format",
            "compact",
            "--parser-program",
            "/bin/sh",
            "--parser-script",
            &script,
            "parse",
        ])
        .write_stdin("1");
    command
        .assert()
        .success()
        .stdout(contains("TRACE").not().and(contains("DEBUG").not()));
}

#[test]
fn bare_parse_runs_with_built_in_defaults() {
    let home = TempDir::new().expect("home dir");
    let bin = TempDir::new().expect("bin dir");
    let node = bin.path().join("node");
    fs::write(&node, format!("#!/bin/sh\n{EMPTY_PARSER}")).expect("write node stand-in");
    fs::set_permissions(&node, fs::Permissions::from_mode(0o755)).expect("chmod node stand-in");
    let path = format!("{}:/usr/bin:/bin", bin.path().display());

    let mut command = cargo_bin_cmd!("pkgscan");
    command
        .env_clear()
        .env("HOME", home.path())
        .env("PATH", path)
        .current_dir(home.path())
        .arg("parse")
        .write_stdin("var a");
    command
        .assert()
        .success()
        .stdout(contains("\"valid\": true"))
        .stderr(contains("failed to load configuration").not());
}

#[test]
fn missing_parser_exits_with_failure() {
    let mut command = cargo_bin_cmd!("pkgscan");
    command
        .args(["--parser-program", "/nonexistent/node", "parse"])
        .write_stdin("1");
    command
        .assert()
        .failure()
        .stderr(contains("failed to start parser"));
}

#[test]
fn missing_subcommand_exits_with_failure() {
    let mut command = cargo_bin_cmd!("pkgscan");
    command.assert().failure().stderr(contains("Usage: pkgscan"));
}
