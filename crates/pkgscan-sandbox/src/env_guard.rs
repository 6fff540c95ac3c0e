//! Puts the parent environment back after `birdcage` activation.

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;

/// Snapshot of the parent environment, restored on drop.
///
/// `birdcage` clears variables in the calling process when it applies the
/// environment exceptions, so the analysis process would otherwise lose its
/// own configuration after the first phase.
#[derive(Debug)]
pub(crate) struct EnvGuard {
    saved: HashMap<OsString, OsString>,
}

impl EnvGuard {
    pub(crate) fn capture() -> Self {
        Self {
            saved: env::vars_os().collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        let stray: Vec<OsString> = env::vars_os()
            .map(|(key, _)| key)
            .filter(|key| !self.saved.contains_key(key))
            .collect();
        // Environment mutation is `unsafe` in edition 2024; the sandbox only
        // runs from a single-threaded process.
        for key in stray {
            unsafe { env::remove_var(key) };
        }
        for (key, value) in &self.saved {
            unsafe { env::set_var(key, value) };
        }
    }
}
