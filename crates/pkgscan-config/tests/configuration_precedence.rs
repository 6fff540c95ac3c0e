//! Behaviour tests for configuration precedence across defaults, files,
//! environment variables, and command-line flags.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use pkgscan_config::{
    Config, DEFAULT_PHASE_TIMEOUT_SECS, default_log_filter, default_log_format,
    default_parser_program,
};

/// Serialises scenarios that mutate `PKGSCAN_*` variables.
static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_lock: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_lock = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("pkgscan")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_lock: env_lock,
        }
    }

    fn write_config(&self, body: &str) {
        let path = self.temp_dir.path().join("pkgscan.toml");
        if let Err(error) = fs::write(&path, body) {
            panic!("failed to write configuration: {error}");
        }

        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024. `Drop` restores
        // every override while the mutex is still held.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            if let Some(os_value) = value {
                unsafe { std::env::set_var(&key, os_value) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }
}

fn parse_secs(text: &str) -> u64 {
    match text.parse() {
        Ok(secs) => secs,
        Err(error) => panic!("invalid timeout '{text}': {error}"),
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the phase timeout to \"{secs}\"")]
fn given_configuration_file(harness: &Harness, secs: String) {
    harness.write_config(&format!("phase_timeout_secs = {}\n", parse_secs(&secs)));
}

#[given("the environment overrides the phase timeout to \"{secs}\"")]
fn given_environment_timeout(harness: &Harness, secs: String) {
    harness.set_env("PKGSCAN_PHASE_TIMEOUT_SECS", &secs);
}

#[given("the environment overrides the log format to \"{format}\"")]
fn given_environment_log_format(harness: &Harness, format: String) {
    harness.set_env("PKGSCAN_LOG_FORMAT", &format);
}

#[when("the CLI sets the phase timeout to \"{secs}\"")]
fn when_cli_override(harness: &Harness, secs: String) {
    harness.push_cli_arg("--phase-timeout-secs");
    harness.push_cli_arg(secs);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the phase timeout to \"{secs}\"")]
fn then_resolved_timeout(harness: &Harness, secs: String) {
    let config = harness.config();
    assert_eq!(
        config.phase_timeout(),
        Duration::from_secs(parse_secs(&secs))
    );
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();

    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.parser_program(), default_parser_program());
    assert_eq!(config.parser_script(), None);
    assert_eq!(
        config.phase_timeout(),
        Duration::from_secs(DEFAULT_PHASE_TIMEOUT_SECS)
    );
}

#[then("loading the configuration fails")]
fn then_loading_fails(harness: &Harness) {
    harness.load();
    assert!(
        harness.error.borrow().is_some(),
        "expected loading to fail, got {:?}",
        harness.loaded.borrow()
    );
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Built-in defaults apply when nothing is configured"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "A configuration file overrides the defaults"
)]
fn file_overrides_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The command line overrides the environment"
)]
fn cli_overrides_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "An unknown log format is rejected"
)]
fn unknown_log_format_fails(#[from(harness)] harness: Harness) {
    let _ = harness;
}
