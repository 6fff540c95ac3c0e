//! Crate-level integration and BDD tests.

use std::collections::BTreeMap;
use std::io::Write;

use tempfile::NamedTempFile;

use crate::error::{DynamicError, PlanError};
use crate::orchestrator::run_dynamic_analysis;
use crate::outcome::{
    CommandRecord, FileAccess, FileWrite, FileWrites, PhaseOutcome, SocketAccess, Status,
    SyscallSummary,
};
use crate::package::{PackageDescriptor, PackagePlan, PhaseCommand};
use crate::phase::RunPhase;
use crate::report::TracingReporter;
use crate::runner::SandboxRunner;


/// Runner that answers by program path and completes anything unscripted.
#[derive(Default)]
struct ScriptedRunner {
    statuses: BTreeMap<String, Status>,
    failing: Option<String>,
}

impl ScriptedRunner {
    fn key(command: &PhaseCommand) -> String {
        command.program().display().to_string()
    }
}

impl SandboxRunner for ScriptedRunner {
    fn run(&self, command: &PhaseCommand) -> Result<PhaseOutcome, DynamicError> {
        let key = Self::key(command);
        if self.failing.as_deref() == Some(key.as_str()) {
            return Err(DynamicError::Io {
                program: command.program().to_path_buf(),
                action: "wait for",
                source: std::sync::Arc::new(std::io::Error::other("sandbox crashed")),
            });
        }
        let status = self.statuses.get(&key).copied().unwrap_or(Status::Completed);
        Ok(PhaseOutcome::new(
            SyscallSummary::new(status),
            FileWrites::default(),
        ))
    }
}

const PLAN: &str = r#"{
    "name": "typosquat",
    "ecosystem": "npm",
    "version": "0.0.1",
    "phases": [
        {"phase": "install", "program": "/usr/bin/npm", "args": ["install", "--ignore-scripts=false"],
         "working_dir": "/tmp/typosquat", "env": {"npm_config_cache": "/tmp/typosquat/.npm"}},
        {"phase": "import", "program": "/usr/bin/node", "args": ["-e", "require('typosquat')"],
         "allow_network": true}
    ]
}"#;

#[test]
fn plan_file_drives_the_walk() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(PLAN.as_bytes()).expect("write plan");
    let plan = PackagePlan::from_path(file.path()).expect("load plan");

    assert_eq!(plan.ecosystem(), Some("npm"));
    assert_eq!(plan.version(), Some("0.0.1"));
    let install = plan.command(RunPhase::Install).expect("install command");
    assert_eq!(
        install.envs().get("npm_config_cache").map(String::as_str),
        Some("/tmp/typosquat/.npm")
    );
    assert!(!install.allows_network());
    assert!(plan.command(RunPhase::Import).is_some_and(|c| c.allows_network()));
    assert!(plan.command(RunPhase::Execute).is_none());

    let runner = ScriptedRunner {
        statuses: BTreeMap::from([(String::from("/usr/bin/node"), Status::ErrorUnknown)]),
        failing: None,
    };
    let report = run_dynamic_analysis(&runner, &plan, &TracingReporter);

    assert_eq!(report.results().len(), 2);
    assert_eq!(report.last_phase(), Some(RunPhase::Import));
    assert_eq!(report.last_status(), Some(Status::ErrorUnknown));
}

#[test]
fn duplicate_phases_are_rejected() {
    let err = PackagePlan::from_json(
        r#"{"name": "x", "phases": [
            {"phase": "install", "program": "/bin/true"},
            {"phase": "install", "program": "/bin/false"}
        ]}"#,
    )
    .expect_err("duplicate phase");

    assert!(matches!(err, PlanError::DuplicatePhase(RunPhase::Install)));
}

#[test]
fn unknown_phase_names_are_rejected() {
    let err = PackagePlan::from_json(
        r#"{"name": "x", "phases": [{"phase": "postinstall", "program": "/bin/true"}]}"#,
    )
    .expect_err("unknown phase");

    assert!(matches!(err, PlanError::Decode(_)));
}

#[test]
fn unreadable_plan_is_a_read_error() {
    let err = PackagePlan::from_path(std::path::Path::new("/definitely/missing/plan.json"))
        .expect_err("missing plan");

    assert!(matches!(err, PlanError::Read { .. }));
}

/// Runner standing in for a tracing sandbox that saw the import phase read
/// a credentials file and phone home.
struct ObservingRunner;

impl SandboxRunner for ObservingRunner {
    fn run(&self, command: &PhaseCommand) -> Result<PhaseOutcome, DynamicError> {
        let summary = SyscallSummary::new(Status::Completed)
            .with_command(CommandRecord::new(command.argv(), Vec::new()))
            .with_file(FileAccess {
                path: "/root/.npmrc".into(),
                read: true,
                write: false,
                delete: false,
            })
            .with_socket(SocketAccess {
                address: String::from("203.0.113.7"),
                port: 443,
                hostnames: vec![String::from("exfil.example")],
            });
        let writes = [FileWrite::new("/tmp/typosquat/stolen.txt", 42)]
            .into_iter()
            .collect();
        Ok(PhaseOutcome::new(summary, writes))
    }
}

#[test]
fn observed_file_and_socket_activity_reaches_the_report() {
    let plan = PackagePlan::from_json(PLAN).expect("parse plan");

    let report = run_dynamic_analysis(&ObservingRunner, &plan, &TracingReporter);

    let import = report.results().get(RunPhase::Import).expect("import outcome");
    let summary = import.syscall_summary();
    assert_eq!(summary.files().len(), 1);
    assert_eq!(summary.sockets().first().map(|socket| socket.port), Some(443));
    assert_eq!(import.file_writes().total_bytes(), 42);

    let json = serde_json::to_value(&report).expect("serialise report");
    let import_json = &json["results"]["import"];
    assert_eq!(
        import_json["syscall_summary"]["files"][0],
        serde_json::json!({"path": "/root/.npmrc", "read": true, "write": false, "delete": false})
    );
    assert_eq!(
        import_json["syscall_summary"]["sockets"][0],
        serde_json::json!({"address": "203.0.113.7", "port": 443, "hostnames": ["exfil.example"]})
    );
    assert_eq!(
        import_json["syscall_summary"]["commands"][0]["command"],
        serde_json::json!(["/usr/bin/node", "-e", "require('typosquat')"])
    );
    assert_eq!(
        import_json["file_writes"],
        serde_json::json!([{"path": "/tmp/typosquat/stolen.txt", "bytes_written": 42}])
    );
}
