//! Resource policy for a sandboxed phase command.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::runtime::linux_runtime_roots;

/// How much of the parent environment reaches the sandboxed command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnvironmentPolicy {
    /// Start the command with an empty environment.
    #[default]
    Isolated,
    /// Pass through only the named variables.
    AllowList(BTreeSet<String>),
    /// Pass through the whole environment.
    InheritAll,
}

impl EnvironmentPolicy {
    fn with_allowed(self, key: String) -> Self {
        match self {
            Self::Isolated => Self::AllowList(BTreeSet::from([key])),
            Self::AllowList(mut keys) => {
                let _ = keys.insert(key);
                Self::AllowList(keys)
            }
            Self::InheritAll => Self::InheritAll,
        }
    }

    pub(crate) fn exceptions(&self) -> Vec<birdcage::Exception> {
        match self {
            Self::Isolated => Vec::new(),
            Self::AllowList(keys) => keys
                .iter()
                .cloned()
                .map(birdcage::Exception::Environment)
                .collect(),
            Self::InheritAll => vec![birdcage::Exception::FullEnvironment],
        }
    }
}

/// Whether the sandboxed command may reach the network.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NetworkPolicy {
    /// Run in a private network namespace.
    #[default]
    Deny,
    /// Share the host network.
    Allow,
}

impl NetworkPolicy {
    /// Returns true when networking is denied.
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Deny)
    }
}

/// Paths, environment, and network access granted to one phase command.
///
/// A fresh profile only grants read access to the Linux runtime library
/// roots. Package analysis typically adds the package manager executable and
/// a writable work directory; the writable roots are also what
/// [`WriteSnapshot`](crate::WriteSnapshot) inspects to attribute file writes.
#[derive(Debug, Clone)]
pub struct SandboxProfile {
    read_only_paths: Vec<PathBuf>,
    read_write_paths: Vec<PathBuf>,
    executable_paths: Vec<PathBuf>,
    environment: EnvironmentPolicy,
    network: NetworkPolicy,
}

impl SandboxProfile {
    /// Creates a deny-by-default profile with runtime libraries readable.
    ///
    /// ```
    /// use pkgscan_sandbox::SandboxProfile;
    ///
    /// let profile = SandboxProfile::new()
    ///     .allow_executable("/usr/bin/pip")
    ///     .allow_read_write_path("/tmp/pkg-work");
    /// assert!(profile.network_policy().is_denied());
    /// assert_eq!(profile.read_write_paths().len(), 1);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            read_only_paths: linux_runtime_roots(),
            read_write_paths: Vec::new(),
            executable_paths: Vec::new(),
            environment: EnvironmentPolicy::default(),
            network: NetworkPolicy::default(),
        }
    }

    /// Grants execute and read access to `path`.
    #[must_use]
    pub fn allow_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_paths.push(path.into());
        self
    }

    /// Grants read access to `path`.
    #[must_use]
    pub fn allow_read_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.read_only_paths.push(path.into());
        self
    }

    /// Grants read and write access to `path`.
    #[must_use]
    pub fn allow_read_write_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.read_write_paths.push(path.into());
        self
    }

    /// Passes `key` through from the parent environment.
    ///
    /// Has no effect once the full environment is inherited.
    #[must_use]
    pub fn allow_environment_variable(mut self, key: impl Into<String>) -> Self {
        self.environment = self.environment.with_allowed(key.into());
        self
    }

    /// Passes the full parent environment through.
    #[must_use]
    pub fn allow_full_environment(mut self) -> Self {
        self.environment = EnvironmentPolicy::InheritAll;
        self
    }

    /// Lets the command use the host network.
    #[must_use]
    pub fn allow_networking(mut self) -> Self {
        self.network = NetworkPolicy::Allow;
        self
    }

    /// Paths granted read-only access.
    #[must_use]
    pub fn read_only_paths(&self) -> &[PathBuf] {
        &self.read_only_paths
    }

    /// Paths granted read-write access.
    #[must_use]
    pub fn read_write_paths(&self) -> &[PathBuf] {
        &self.read_write_paths
    }

    /// Paths granted execute access.
    #[must_use]
    pub fn executable_paths(&self) -> &[PathBuf] {
        &self.executable_paths
    }

    /// The configured environment policy.
    #[must_use]
    pub const fn environment_policy(&self) -> &EnvironmentPolicy {
        &self.environment
    }

    /// The configured network policy.
    #[must_use]
    pub const fn network_policy(&self) -> NetworkPolicy {
        self.network
    }
}

impl Default for SandboxProfile {
    fn default() -> Self {
        Self::new()
    }
}
