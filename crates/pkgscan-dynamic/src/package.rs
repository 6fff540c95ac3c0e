//! Packages under analysis and the commands their phases run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::phase::RunPhase;

/// Command run for one phase.
///
/// ```
/// use pkgscan_dynamic::PhaseCommand;
///
/// let command = PhaseCommand::new("/usr/bin/npm")
///     .arg("install")
///     .env("npm_config_ignore_scripts", "false")
///     .working_dir("/tmp/pkg");
/// assert_eq!(command.argv(), ["/usr/bin/npm", "install"]);
/// assert!(!command.allows_network());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCommand {
    program: PathBuf,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    working_dir: Option<PathBuf>,
    #[serde(default)]
    allow_network: bool,
}

impl PhaseCommand {
    /// Creates a command running `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            allow_network: false,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets an environment variable for the command.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the directory the command runs in. It is the only writable
    /// location inside the sandbox.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Lets the command reach the network.
    #[must_use]
    pub fn allow_network(mut self) -> Self {
        self.allow_network = true;
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments after the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Explicit environment variables.
    #[must_use]
    pub const fn envs(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Working directory, when one is set.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Whether networking is permitted.
    #[must_use]
    pub const fn allows_network(&self) -> bool {
        self.allow_network
    }

    /// Program and arguments as display strings.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// A package whose lifecycle can be walked phase by phase.
pub trait PackageDescriptor {
    /// Package name used in reports.
    fn name(&self) -> &str;

    /// Phases to run, in order.
    fn run_phases(&self) -> Vec<RunPhase>;

    /// Command for `phase`, or `None` when the package has none.
    fn command(&self, phase: RunPhase) -> Option<PhaseCommand>;
}

/// One phase entry of a [`PackagePlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPhase {
    phase: RunPhase,
    #[serde(flatten)]
    command: PhaseCommand,
}

impl PlannedPhase {
    /// Pairs a phase with its command.
    #[must_use]
    pub const fn new(phase: RunPhase, command: PhaseCommand) -> Self {
        Self { phase, command }
    }

    /// The phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The command it runs.
    #[must_use]
    pub const fn command(&self) -> &PhaseCommand {
        &self.command
    }
}

/// A package described by a JSON plan.
///
/// ```
/// use pkgscan_dynamic::{PackageDescriptor, PackagePlan, RunPhase};
///
/// let plan = PackagePlan::from_json(r#"{
///     "name": "left-pad",
///     "ecosystem": "npm",
///     "version": "1.3.0",
///     "phases": [
///         {"phase": "install", "program": "/usr/bin/npm", "args": ["install"]},
///         {"phase": "import", "program": "/usr/bin/node", "args": ["-e", "require('left-pad')"]}
///     ]
/// }"#).unwrap();
/// assert_eq!(plan.name(), "left-pad");
/// assert_eq!(plan.run_phases(), [RunPhase::Install, RunPhase::Import]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePlan {
    name: String,
    #[serde(default)]
    ecosystem: Option<String>,
    #[serde(default)]
    version: Option<String>,
    phases: Vec<PlannedPhase>,
}

impl PackagePlan {
    /// Creates a plan from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicatePhase`] when a phase is listed twice.
    pub fn new(name: impl Into<String>, phases: Vec<PlannedPhase>) -> Result<Self, PlanError> {
        let plan = Self {
            name: name.into(),
            ecosystem: None,
            version: None,
            phases,
        };
        plan.validate()
    }

    /// Parses a plan from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Decode`] for malformed JSON and
    /// [`PlanError::DuplicatePhase`] when a phase is listed twice.
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_json::from_str(text).map_err(PlanError::Decode)?;
        plan.validate()
    }

    /// Reads and parses a plan file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Read`] when the file cannot be read, otherwise
    /// as for [`from_json`](Self::from_json).
    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::from_json(&text)
    }

    /// Ecosystem the package belongs to, such as `npm`.
    #[must_use]
    pub fn ecosystem(&self) -> Option<&str> {
        self.ecosystem.as_deref()
    }

    /// Package version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Planned phases in run order.
    #[must_use]
    pub fn phases(&self) -> &[PlannedPhase] {
        &self.phases
    }

    fn validate(self) -> Result<Self, PlanError> {
        let mut seen = BTreeSet::new();
        for planned in &self.phases {
            if !seen.insert(planned.phase) {
                return Err(PlanError::DuplicatePhase(planned.phase));
            }
        }
        Ok(self)
    }
}

impl PackageDescriptor for PackagePlan {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_phases(&self) -> Vec<RunPhase> {
        self.phases.iter().map(PlannedPhase::phase).collect()
    }

    fn command(&self, phase: RunPhase) -> Option<PhaseCommand> {
        self.phases
            .iter()
            .find(|planned| planned.phase == phase)
            .map(|planned| planned.command.clone())
    }
}
