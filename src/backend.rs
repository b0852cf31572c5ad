//! Storage backends for repository data.
//!
//! A [`Backend`] is a flat key/value namespace rooted at the repository
//! root. Keys are `/`-separated relative paths such as `HEAD`,
//! `refs/main` or `objects/ab/cdef…`. The object store and reference store
//! only talk to this trait, so a repository can live on disk
//! ([`FsBackend`]) or entirely in memory ([`MemoryBackend`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::infra::fs::list_dir;
use crate::infra::{read_file, write_file_atomic, write_file_exclusive};

/// Persistence operations the repository core needs.
pub trait Backend: fmt::Debug {
    /// A human-readable description of where the repository lives.
    fn location(&self) -> String;

    /// Returns `true` if the repository root exists.
    fn root_exists(&self) -> Result<bool>;

    /// Claims the repository root.
    ///
    /// Returns `Ok(false)` without touching anything if the root already
    /// exists.
    fn create_root(&self) -> Result<bool>;

    /// Reads the value stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Returns `true` if a value is stored under `key`.
    fn contains(&self, key: &str) -> Result<bool>;

    /// Stores `data` under `key`, atomically replacing any previous value.
    fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Stores `data` under `key` only if nothing is stored there yet.
    ///
    /// Returns `Ok(false)` if the key was already occupied.
    fn create_new(&self, key: &str, data: &[u8]) -> Result<bool>;

    /// Atomically moves the value under `from` to `to`, replacing `to`.
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Removes the value under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists the entry names directly below the `dir` prefix, sorted.
    fn list(&self, dir: &str) -> Result<Vec<String>>;
}

/// A backend storing each key as a file below a root directory.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Creates a backend rooted at `root` (e.g. `<work_dir>/.trackit`).
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsBackend {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl Backend for FsBackend {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn root_exists(&self) -> Result<bool> {
        Ok(self.root.is_dir())
    }

    fn create_root(&self) -> Result<bool> {
        match fs::create_dir(&self.root) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        read_file(self.path(key))
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.path(key).is_file())
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        write_file_atomic(self.path(key), data)
    }

    fn create_new(&self, key: &str, data: &[u8]) -> Result<bool> {
        write_file_exclusive(self.path(key), data)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.path(from), self.path(to))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        list_dir(self.path(dir))
    }
}

/// A backend keeping everything in process memory.
///
/// Useful for tests and for short-lived repositories that never touch disk.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// `None` until the root is created.
    entries: Mutex<Option<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Creates an empty backend with no repository root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys under `dir` (recursively).
    pub fn count(&self, dir: &str) -> usize {
        let prefix = format!("{}/", dir);
        self.lock()
            .as_ref()
            .map(|map| map.keys().filter(|k| k.starts_with(&prefix)).count())
            .unwrap_or(0)
    }

    /// Overwrites a stored value in place, bypassing all invariants.
    ///
    /// Only meant for simulating external corruption.
    pub fn tamper(&self, key: &str, data: &[u8]) {
        if let Some(map) = self.lock().as_mut() {
            map.insert(key.to_string(), data.to_vec());
        }
    }

    /// Deletes a stored value, bypassing all invariants.
    pub fn delete(&self, key: &str) {
        if let Some(map) = self.lock().as_mut() {
            map.remove(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<BTreeMap<String, Vec<u8>>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> T) -> Result<T> {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(map) => Ok(f(map)),
            None => Err(std::io::Error::new(
                ErrorKind::NotFound,
                "in-memory repository root does not exist",
            )
            .into()),
        }
    }
}

impl Backend for MemoryBackend {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn root_exists(&self) -> Result<bool> {
        Ok(self.lock().is_some())
    }

    fn create_root(&self) -> Result<bool> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(BTreeMap::new());
        Ok(true)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_map(|map| map.get(key).cloned())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        self.with_map(|map| map.contains_key(key))
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        self.with_map(|map| {
            map.insert(key.to_string(), data.to_vec());
        })
    }

    fn create_new(&self, key: &str, data: &[u8]) -> Result<bool> {
        self.with_map(|map| {
            if map.contains_key(key) {
                false
            } else {
                map.insert(key.to_string(), data.to_vec());
                true
            }
        })
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let moved = self.with_map(|map| match map.remove(from) {
            Some(data) => {
                map.insert(to.to_string(), data);
                true
            }
            None => false,
        })?;
        if moved {
            Ok(())
        } else {
            Err(std::io::Error::new(ErrorKind::NotFound, format!("no entry at {}", from)).into())
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_map(|map| {
            map.remove(key);
        })
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", dir);
        self.with_map(|map| {
            let names: BTreeSet<&str> = map
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .filter_map(|rest| rest.split('/').next())
                .collect();
            names.into_iter().map(str::to_string).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(backend: &dyn Backend) {
        assert!(!backend.root_exists().unwrap());
        assert!(backend.create_root().unwrap());
        assert!(!backend.create_root().unwrap());
        assert!(backend.root_exists().unwrap());

        assert_eq!(backend.read("HEAD").unwrap(), None);
        backend.write("HEAD", b"ref: refs/main\n").unwrap();
        assert_eq!(backend.read("HEAD").unwrap().unwrap(), b"ref: refs/main\n");

        backend.write("objects/ab/cdef", b"x").unwrap();
        backend.write("objects/ab/0123", b"y").unwrap();
        backend.write("objects/cd/4567", b"z").unwrap();
        assert_eq!(backend.list("objects/ab").unwrap(), vec!["0123", "cdef"]);
        assert_eq!(backend.list("objects").unwrap().len(), 2);
        assert!(backend.list("objects/ff").unwrap().is_empty());
        assert!(backend.contains("objects/ab/cdef").unwrap());
        assert!(!backend.contains("objects/ab/ffff").unwrap());

        assert!(backend.create_new("refs/main.lock", b"1").unwrap());
        assert!(!backend.create_new("refs/main.lock", b"2").unwrap());
        backend.rename("refs/main.lock", "refs/main").unwrap();
        assert_eq!(backend.read("refs/main").unwrap().unwrap(), b"1");
        assert!(!backend.contains("refs/main.lock").unwrap());

        backend.remove("refs/main").unwrap();
        backend.remove("refs/main").unwrap();
        assert_eq!(backend.read("refs/main").unwrap(), None);
    }

    #[test]
    fn test_memory_backend_contract() {
        exercise(&MemoryBackend::new());
    }

    #[test]
    fn test_fs_backend_contract() {
        let temp = TempDir::new().unwrap();
        exercise(&FsBackend::new(temp.path().join(".trackit")));
    }

    #[test]
    fn test_memory_backend_requires_root() {
        let backend = MemoryBackend::new();
        assert!(backend.read("HEAD").is_err());
        assert!(backend.write("HEAD", b"x").is_err());
    }

    #[test]
    fn test_memory_backend_count() {
        let backend = MemoryBackend::new();
        backend.create_root().unwrap();
        backend.write("objects/ab/1", b"").unwrap();
        backend.write("objects/cd/2", b"").unwrap();
        backend.write("HEAD", b"").unwrap();
        assert_eq!(backend.count("objects"), 2);
    }
}
