//! Host checks used by the sandbox preflight.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
const RUNTIME_LIBRARY_ROOTS: [&str; 6] = [
    "/lib",
    "/lib64",
    "/usr/lib",
    "/usr/lib64",
    "/lib/x86_64-linux-gnu",
    "/usr/lib/x86_64-linux-gnu",
];

/// Library roots that dynamically linked package managers need.
///
/// Paths are kept as spelled so that symlinked roots such as `/lib64` on a
/// merged-`/usr` host are recreated inside the sandbox.
#[must_use]
pub(crate) fn linux_runtime_roots() -> Vec<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        RUNTIME_LIBRARY_ROOTS
            .iter()
            .map(Path::new)
            .filter(|root| root.exists())
            .map(Path::to_path_buf)
            .collect()
    }

    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

/// Number of threads in the current process, read from `/proc/self/status`.
pub(crate) fn thread_count() -> io::Result<usize> {
    #[cfg(target_os = "linux")]
    {
        parse_thread_count(&fs::read_to_string("/proc/self/status")?)
    }

    #[cfg(not(target_os = "linux"))]
    {
        Ok(1)
    }
}

pub(crate) fn parse_thread_count(status: &str) -> io::Result<usize> {
    let value = status
        .lines()
        .find_map(|line| line.strip_prefix("Threads:"))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing thread count"))?;
    value
        .trim()
        .parse::<usize>()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}
