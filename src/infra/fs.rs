//! Filesystem utilities for reading and atomically writing files.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// Distinguishes temporary files created by concurrent writers in one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reads the entire contents of a file as bytes.
///
/// # Returns
///
/// `Ok(None)` if the file does not exist, the contents otherwise.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Option<Vec<u8>>> {
    match fs::read(path.as_ref()) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes data to a file atomically.
///
/// The data goes to a uniquely named temporary file in the same directory,
/// which is then renamed over the target. Readers see either the old file
/// or the complete new one.
///
/// # Arguments
///
/// * `path` - The path to write to.
/// * `data` - The data to write.
pub fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = temp_path_for(path);
    if let Err(e) = write_and_sync(&temp_path, data, false) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    // Rename temporary file to target (atomic on most filesystems)
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Creates a file with the given data, failing if it already exists.
///
/// # Returns
///
/// `Ok(true)` if the file was created, `Ok(false)` if something already
/// occupied the path.
pub fn write_file_exclusive<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<bool> {
    let path = path.as_ref();
    ensure_parent(path)?;

    match write_and_sync(path, data, true) {
        Ok(()) => Ok(true),
        Err(crate::Error::Storage(e)) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lists the file names in a directory.
///
/// A missing directory yields an empty list.
pub fn list_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "temp".to_string());
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", file_name, std::process::id(), n))
}

fn write_and_sync(path: &Path, data: &[u8], create_new: bool) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}
