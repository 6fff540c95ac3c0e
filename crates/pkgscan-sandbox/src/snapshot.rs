//! Before/after views of the writable roots of a sandbox.
//!
//! Without a syscall tracer the only durable evidence of what a phase wrote
//! is the state of the paths it was allowed to write. [`WriteSnapshot`]
//! records size and modification time for every regular file under those
//! roots; comparing two snapshots yields the files the phase wrote.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::SandboxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileState {
    len: u64,
    modified: Option<SystemTime>,
}

/// A file written between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    path: PathBuf,
    bytes_written: u64,
}

impl WrittenFile {
    /// Path of the written file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes attributed to the write.
    ///
    /// New and rewritten files report their full size; files that only grew
    /// report the growth.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consumes the record, returning the path and byte count.
    #[must_use]
    pub fn into_parts(self) -> (PathBuf, u64) {
        (self.path, self.bytes_written)
    }
}

/// Regular files under a set of roots at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSnapshot {
    files: BTreeMap<PathBuf, FileState>,
}

impl WriteSnapshot {
    /// Walks `roots` recursively, recording every regular file.
    ///
    /// Symbolic links are recorded as they are and never followed. Roots
    /// that do not exist yet are treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Snapshot`] when a directory or file cannot be
    /// inspected.
    pub fn capture(roots: &[PathBuf]) -> Result<Self, SandboxError> {
        let mut files = BTreeMap::new();
        for root in roots {
            if root.exists() {
                walk(root, &mut files)?;
            }
        }
        Ok(Self { files })
    }

    /// Number of files recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true when no files were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files written between `self` and the later snapshot `after`, sorted
    /// by path.
    ///
    /// Deleted files are not reported.
    #[must_use]
    pub fn writes_until(&self, after: &Self) -> Vec<WrittenFile> {
        after
            .files
            .iter()
            .filter_map(|(path, now)| {
                let bytes_written = match self.files.get(path) {
                    None => now.len,
                    Some(before) if before == now => return None,
                    Some(before) if now.len > before.len && before.modified <= now.modified => {
                        now.len - before.len
                    }
                    Some(_) => now.len,
                };
                Some(WrittenFile {
                    path: path.clone(),
                    bytes_written,
                })
            })
            .collect()
    }
}

fn walk(dir: &Path, files: &mut BTreeMap<PathBuf, FileState>) -> Result<(), SandboxError> {
    let snapshot_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SandboxError::Snapshot { path, source }
    };

    let metadata = fs::symlink_metadata(dir).map_err(snapshot_error(dir))?;
    if !metadata.is_dir() {
        record(dir, &metadata, files);
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(snapshot_error(dir))? {
        let entry = entry.map_err(snapshot_error(dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(snapshot_error(&path))?;
        if file_type.is_dir() {
            walk(&path, files)?;
        } else {
            let entry_metadata = entry.metadata().map_err(snapshot_error(&path))?;
            record(&path, &entry_metadata, files);
        }
    }
    Ok(())
}

fn record(path: &Path, metadata: &fs::Metadata, files: &mut BTreeMap<PathBuf, FileState>) {
    let _ = files.insert(
        path.to_path_buf(),
        FileState {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        },
    );
}
