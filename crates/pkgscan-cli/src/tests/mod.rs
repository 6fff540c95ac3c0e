//! Unit tests for the CLI runtime.

use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

use crate::commands::{INVALID_SOURCE_EXIT, parser_command};
use crate::config::{ConfigLoader, OrthoConfigLoader};
use crate::errors::AppError;
use crate::{IoStreams, run_with_loader};
use pkgscan_config::Config;

/// Loader that hands back a fixed configuration.
struct StubLoader(Config);

impl ConfigLoader for StubLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.0.clone())
    }
}

/// Loader that proves configuration is never consulted.
struct PanickingLoader;

impl ConfigLoader for PanickingLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        panic!("configuration must not be loaded");
    }
}

struct Captured {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

impl Captured {
    fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).expect("stdout is JSON")
    }
}

fn invoke(args: &[&str], stdin: &str, loader: &impl ConfigLoader) -> Captured {
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut io = IoStreams::new(&mut input, &mut stdout, &mut stderr);
    let exit = run_with_loader(args.iter().map(OsString::from), &mut io, loader);
    Captured {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

#[fixture]
fn workdir() -> TempDir {
    TempDir::new().expect("temp dir")
}

/// Configuration that runs `body` as the parser through `/bin/sh`.
fn parser_config(dir: &Path, body: &str) -> StubLoader {
    let script = dir.join("parser.sh");
    fs::write(&script, body).expect("write parser script");
    StubLoader(Config {
        parser_program: Some(PathBuf::from("/bin/sh")),
        parser_script: Some(script),
        ..Config::default()
    })
}

#[rstest]
fn parse_prints_symbols_from_stdin(workdir: TempDir) {
    let loader = parser_config(
        workdir.path(),
        "cat >/dev/null\n\
         printf '%s' '[{\"type\":\"Identifier\",\"subtype\":\"Variable\",\"data\":\"url\",\"pos\":[1,6]}]'\n",
    );

    let captured = invoke(&["pkgscan", "parse"], "const url = 1;", &loader);

    assert_eq!(captured.exit, ExitCode::SUCCESS, "stderr: {}", captured.stderr);
    let json = captured.json();
    assert_eq!(json["valid"], Value::Bool(true));
    assert_eq!(json["identifiers"][0]["name"], "url");
}

#[rstest]
fn parse_passes_the_file_to_the_parser(workdir: TempDir) {
    let loader = parser_config(
        workdir.path(),
        "printf '[{\"type\":\"Comment\",\"subtype\":\"Line\",\"data\":\"%s\",\"pos\":[1,0]}]' \"$1\"\n",
    );
    let source = workdir.path().join("index.js");
    fs::write(&source, "// hi").expect("write source");
    let source_arg = source.to_string_lossy().into_owned();

    let captured = invoke(&["pkgscan", "parse", "--file", &source_arg], "", &loader);

    assert_eq!(captured.exit, ExitCode::SUCCESS, "stderr: {}", captured.stderr);
    assert_eq!(captured.json()["comments"][0]["text"], source_arg.as_str());
}

#[rstest]
fn syntax_error_prints_an_invalid_result(workdir: TempDir) {
    let loader = parser_config(workdir.path(), "cat >/dev/null\nexit 33\n");

    let captured = invoke(&["pkgscan", "parse"], "<html>", &loader);

    assert_eq!(captured.exit, ExitCode::from(INVALID_SOURCE_EXIT));
    let json = captured.json();
    assert_eq!(json["valid"], Value::Bool(false));
    assert_eq!(json["literals"], Value::Array(Vec::new()));
}

#[rstest]
fn parser_failure_reports_its_stderr(workdir: TempDir) {
    let loader = parser_config(
        workdir.path(),
        "cat >/dev/null\necho 'heap out of memory' >&2\nexit 134\n",
    );

    let captured = invoke(&["pkgscan", "parse"], "x", &loader);

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stdout.is_empty());
    assert!(
        captured.stderr.contains("status 134") && captured.stderr.contains("heap out of memory"),
        "stderr: {}",
        captured.stderr
    );
}

#[test]
fn parser_command_appends_the_configured_script() {
    let config = Config {
        parser_program: Some(PathBuf::from("/usr/bin/node")),
        parser_script: Some(PathBuf::from("/opt/pkgscan/parser.js")),
        ..Config::default()
    };

    let command = parser_command(&config);

    assert_eq!(command.program(), Path::new("/usr/bin/node"));
    assert_eq!(command.args(), [OsString::from("/opt/pkgscan/parser.js")]);
    assert!(parser_command(&Config::default()).args().is_empty());
}

#[rstest]
fn dynamic_with_an_empty_plan_succeeds(workdir: TempDir) {
    let plan = workdir.path().join("plan.json");
    fs::write(&plan, r#"{"name": "left-pad", "phases": []}"#).expect("write plan");
    let plan_arg = plan.to_string_lossy().into_owned();

    let captured = invoke(
        &["pkgscan", "dynamic", "--plan", &plan_arg],
        "",
        &StubLoader(Config::default()),
    );

    assert_eq!(captured.exit, ExitCode::SUCCESS, "stderr: {}", captured.stderr);
    let json = captured.json();
    assert_eq!(json["results"], Value::Object(serde_json::Map::new()));
    assert!(json["last_phase"].is_null());
    assert!(json["error"].is_null());
}

#[rstest]
fn dynamic_infrastructure_error_fails_after_printing_the_report(workdir: TempDir) {
    let plan = workdir.path().join("plan.json");
    fs::write(
        &plan,
        r#"{"name": "left-pad", "phases": [{"phase": "install", "program": "npm"}]}"#,
    )
    .expect("write plan");
    let plan_arg = plan.to_string_lossy().into_owned();

    let captured = invoke(
        &["pkgscan", "dynamic", "--plan", &plan_arg],
        "",
        &StubLoader(Config::default()),
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    let json = captured.json();
    assert_eq!(json["last_phase"], "install");
    assert!(json["last_status"].is_null());
    assert!(json["error"].is_string());
    assert!(
        captured.stderr.contains("dynamic analysis of left-pad aborted"),
        "stderr: {}",
        captured.stderr
    );
}

#[test]
fn missing_plan_is_reported() {
    let captured = invoke(
        &["pkgscan", "dynamic", "--plan", "/nonexistent/plan.json"],
        "",
        &StubLoader(Config::default()),
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(
        captured.stderr.contains("failed to load package plan"),
        "stderr: {}",
        captured.stderr
    );
}

#[rstest]
#[case::missing_subcommand(&["pkgscan"])]
#[case::unknown_subcommand(&["pkgscan", "scan"])]
#[case::config_flag_after_subcommand(&["pkgscan", "parse", "--log-filter", "debug"])]
fn usage_errors_fail_before_loading_configuration(#[case] args: &[&str]) {
    let captured = invoke(args, "", &PanickingLoader);

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stdout.is_empty());
    assert!(captured.stderr.contains("Usage: pkgscan"), "stderr: {}", captured.stderr);
}

#[test]
fn help_is_printed_to_stdout() {
    let captured = invoke(&["pkgscan", "--help"], "", &PanickingLoader);

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    assert!(captured.stdout.contains("dynamic"));
    assert!(captured.stderr.is_empty());
}

#[test]
fn malformed_configuration_value_is_reported() {
    let captured = invoke(
        &["pkgscan", "--phase-timeout-secs", "soon", "parse"],
        "",
        &OrthoConfigLoader,
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(
        captured.stderr.contains("failed to load configuration"),
        "stderr: {}",
        captured.stderr
    );
}
