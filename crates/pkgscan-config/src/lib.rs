//! Layered configuration for the `pkgscan` tools.
//!
//! [`Config`] is loaded with [`ortho_config`]. Each field can be set, from
//! lowest to highest precedence, by:
//!
//! 1. the built-in defaults in [`defaults`];
//! 2. a TOML file named by `--config-path` or `PKGSCAN_CONFIG_PATH`, or
//!    `.pkgscan.toml` in the working or home directory;
//! 3. `PKGSCAN_*` environment variables, such as `PKGSCAN_LOG_FILTER`;
//! 4. command-line flags, such as `--log-filter`.
//!
//! Fields are optional so that an unset layer never masks a lower one; the
//! accessors apply the defaults. The phase timeout and log filter also seed
//! the defaults layer, so loading succeeds when every other layer is empty.
//!
//! ```
//! use pkgscan_config::{Config, LogFormat};
//! use ortho_config::OrthoConfig;
//!
//! let config = Config::load_from_iter(["pkgscan", "--log-format", "compact"]).unwrap();
//! assert_eq!(config.log_format(), LogFormat::Compact);
//! assert_eq!(config.phase_timeout().as_secs(), 900);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PARSER_PROGRAM, DEFAULT_PHASE_TIMEOUT_SECS, default_log_filter,
    default_log_format, default_parser_program,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Settings shared by the `pkgscan` subcommands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PKGSCAN")]
#[serde(default)]
pub struct Config {
    /// `tracing` filter directive, e.g. `info` or `pkgscan_dynamic=debug`.
    #[ortho_config(default = String::from(DEFAULT_LOG_FILTER))]
    pub log_filter: Option<String>,
    /// Log line layout.
    pub log_format: Option<LogFormat>,
    /// Executable that runs the source parser.
    pub parser_program: Option<PathBuf>,
    /// Script passed to the parser executable as its first argument.
    pub parser_script: Option<PathBuf>,
    /// Seconds a sandboxed phase may run before it is killed.
    #[ortho_config(default = DEFAULT_PHASE_TIMEOUT_SECS)]
    pub phase_timeout_secs: Option<u64>,
}

impl Config {
    /// Effective log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Effective log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Effective parser executable.
    #[must_use]
    pub fn parser_program(&self) -> &Path {
        self.parser_program
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PARSER_PROGRAM))
    }

    /// Parser script, when one is configured.
    #[must_use]
    pub fn parser_script(&self) -> Option<&Path> {
        self.parser_script.as_deref()
    }

    /// Effective per-phase time limit.
    #[must_use]
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(
            self.phase_timeout_secs
                .unwrap_or(DEFAULT_PHASE_TIMEOUT_SECS),
        )
    }
}
