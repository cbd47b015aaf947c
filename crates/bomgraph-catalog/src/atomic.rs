//! Crash-durable file writes.
//!
//! Blobs are replaced with write-to-temp, fsync, rename, fsync-directory.
//! Index logs grow by single fsynced appends.

use crate::error::CatalogError;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn io_error(path: &Path, err: std::io::Error) -> CatalogError {
    CatalogError::Io(format!("{}: {err}", path.display()))
}

/// Atomically replace `dst` with `data`, then apply `mode` to it.
///
/// The temp file lives in the destination directory so the rename never
/// crosses a filesystem. The parent directory is fsynced after the rename.
pub fn atomic_write(dst: &Path, data: &[u8], mode: u32) -> Result<(), CatalogError> {
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

    let tmp_path = tmp_write_path(&dir, dst);
    let write_result = (|| -> Result<(), CatalogError> {
        let mut file = File::create(&tmp_path).map_err(|e| io_error(&tmp_path, e))?;
        file.write_all(data).map_err(|e| io_error(&tmp_path, e))?;
        file.sync_all().map_err(|e| io_error(&tmp_path, e))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    // Rename does not replace an existing file on Windows.
    if cfg!(windows) && dst.exists() {
        let _ = fs::remove_file(dst);
    }

    fs::rename(&tmp_path, dst).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CatalogError::Io(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            dst.display()
        ))
    })?;

    set_mode(dst, mode)?;
    sync_dir(&dir)
}

/// Append one line to an index log and fsync it.
pub fn append_line(path: &Path, line: &str) -> Result<(), CatalogError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    writeln!(file, "{line}").map_err(|e| io_error(path, e))?;
    file.sync_all().map_err(|e| io_error(path, e))
}

fn tmp_write_path(dir: &Path, dst: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut name = OsString::from(".tmp-");
    if let Some(file_name) = dst.file_name() {
        name.push(file_name);
    }
    name.push(format!(".{}.{}", std::process::id(), unique));
    dir.join(name)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), CatalogError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| io_error(path, e))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<(), CatalogError> {
    let mut permissions = fs::metadata(path)
        .map_err(|e| io_error(path, e))?
        .permissions();
    permissions.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, permissions).map_err(|e| io_error(path, e))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), CatalogError> {
    let handle = File::open(dir).map_err(|e| io_error(dir, e))?;
    handle.sync_all().map_err(|e| io_error(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), CatalogError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "bomgraph-atomic-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should exist");
        path
    }

    #[test]
    fn atomic_write_creates_missing_directories() {
        let root = temp_dir("mkdir");
        let dst = root.join("objects").join("ab").join("blob");
        atomic_write(&dst, b"payload", 0o644).expect("write should succeed");
        assert_eq!(fs::read(&dst).expect("blob should exist"), b"payload");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn atomic_write_replaces_existing_file_and_leaves_no_temp() {
        let root = temp_dir("replace");
        let dst = root.join("blob");
        atomic_write(&dst, b"first", 0o644).expect("first write");
        atomic_write(&dst, b"second", 0o644).expect("second write");
        assert_eq!(fs::read_to_string(&dst).expect("read"), "second");

        let leftovers: Vec<_> = fs::read_dir(&root)
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
        let _ = fs::remove_dir_all(root);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_applies_mode() {
        use std::os::unix::fs::PermissionsExt;
        let root = temp_dir("mode");
        let dst = root.join("blob");
        atomic_write(&dst, b"x", 0o600).expect("write");
        let mode = fs::metadata(&dst).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn append_line_accumulates_lines() {
        let root = temp_dir("append");
        let log = root.join("index");
        append_line(&log, "a:1").expect("append");
        append_line(&log, "b:2").expect("append");
        assert_eq!(fs::read_to_string(&log).expect("read"), "a:1\nb:2\n");
        let _ = fs::remove_dir_all(root);
    }
}
