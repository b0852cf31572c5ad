//! Repository operations.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::backend::{Backend, FsBackend};
use crate::config::{Config, CORE, TRACKED, VERIFY_OBJECTS};
use crate::error::{Error, Result};
use crate::infra::write_file_atomic;
use crate::log::{History, LogOptions};
use crate::objects::{Commit, Digest, ObjectStore};
use crate::refs::{Head, RefStore, DEFAULT_REF, HEAD};
use crate::status::{compute_status, Status};

/// The name of the repository directory inside the work directory.
pub const TRACKIT_DIR: &str = ".trackit";

/// The key of the configuration file.
const CONFIG: &str = "config";

/// A trackit repository.
///
/// This is the main entry point. It owns the storage backend and provides
/// access to the object store, the reference pointer and the history.
///
/// The byte-level operations (`commit_at`, `status_of`, `snapshot`, ...)
/// work on any [`Backend`]. The file-level operations (`commit`, `status`,
/// `revert`) read and write the tracked file and need an [`FsBackend`].
#[derive(Debug)]
pub struct Repository<B: Backend = FsBackend> {
    /// The storage backend holding objects, references and configuration.
    backend: B,
    /// The loaded repository configuration.
    config: Config,
}

impl<B: Backend> Repository<B> {
    /// Creates a new repository in an empty backend.
    ///
    /// Writes the configuration, `HEAD` pointing at `refs/main`, and an
    /// empty `refs/main`.
    ///
    /// # Arguments
    ///
    /// * `backend` - The storage backend; its root must not exist yet.
    /// * `tracked_name` - The name of the tracked content, stored in the config.
    ///
    /// # Errors
    ///
    /// - `Error::AlreadyInitialized` if the backend root already exists.
    /// - `Error::InvalidConfig` if `tracked_name` is empty.
    pub fn initialize(backend: B, tracked_name: &str) -> Result<Self> {
        if tracked_name.trim().is_empty() {
            return Err(Error::InvalidConfig("tracked name is empty".to_string()));
        }

        // Claiming the root first makes a second init fail before touching anything
        if !backend.create_root()? {
            return Err(Error::AlreadyInitialized(backend.location()));
        }

        let mut config = Config::new();
        config.set(CORE, TRACKED, tracked_name);
        config.set(CORE, VERIFY_OBJECTS, "true");
        backend.write(CONFIG, config.to_string().as_bytes())?;

        RefStore::new(&backend).initialize(DEFAULT_REF)?;

        info!(location = %backend.location(), tracked = tracked_name, "initialized repository");
        Ok(Repository { backend, config })
    }

    /// Opens an existing repository in `backend`.
    ///
    /// # Errors
    ///
    /// - `Error::NotInitialized` if the backend holds no repository.
    /// - `Error::InvalidConfig` if the configuration is missing a tracked name.
    pub fn open_backend(backend: B) -> Result<Self> {
        if !backend.root_exists()? || !backend.contains(HEAD)? {
            return Err(Error::NotInitialized(backend.location()));
        }

        let config = match backend.read(CONFIG)? {
            Some(data) => Config::from_bytes(&data)?,
            None => return Err(Error::InvalidConfig("missing config file".to_string())),
        };

        if config.get(CORE, TRACKED).map_or(true, |t| t.trim().is_empty()) {
            return Err(Error::InvalidConfig("core.tracked is not set".to_string()));
        }
        // Surface a malformed flag at open time rather than on first read
        config.get_bool_or(CORE, VERIFY_OBJECTS, true)?;

        debug!(location = %backend.location(), "opened repository");
        Ok(Repository { backend, config })
    }

    /// Returns the storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the repository configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the name of the tracked content.
    pub fn tracked_name(&self) -> &str {
        self.config.get(CORE, TRACKED).unwrap_or_default()
    }

    /// Returns the object store, verifying reads unless the config disables it.
    pub fn objects(&self) -> ObjectStore<'_, B> {
        let verify = self
            .config
            .get_bool_or(CORE, VERIFY_OBJECTS, true)
            .unwrap_or(true);
        ObjectStore::new(&self.backend).verify_reads(verify)
    }

    /// Returns the reference store.
    pub fn refs(&self) -> RefStore<'_, B> {
        RefStore::new(&self.backend)
    }

    /// Returns the current HEAD state.
    pub fn head(&self) -> Result<Head> {
        self.refs().head()
    }

    /// Resolves HEAD to the tip commit, or `None` before the first commit.
    pub fn resolve(&self) -> Result<Option<Digest>> {
        self.refs().resolve()
    }

    /// Records `content` as a new commit with the current time.
    ///
    /// # Returns
    ///
    /// The digest of the new commit record.
    pub fn commit_content(&self, content: &[u8], message: &str) -> Result<Digest> {
        self.commit_at(content, message, Utc::now().timestamp())
    }

    /// Records `content` as a new commit with an explicit timestamp.
    ///
    /// The content and the commit record are fully stored before the
    /// reference is advanced, so a failed write never changes the tip.
    ///
    /// # Arguments
    ///
    /// * `content` - The bytes to record.
    /// * `message` - The commit message.
    /// * `timestamp` - Unix timestamp in seconds.
    ///
    /// # Errors
    ///
    /// - `Error::Storage` if a write fails; the tip is unchanged.
    /// - `Error::RefLocked` or `Error::RefConflict` if another writer
    ///   advanced the tip concurrently.
    pub fn commit_at(&self, content: &[u8], message: &str, timestamp: i64) -> Result<Digest> {
        let parent = self.resolve()?;
        let objects = self.objects();

        let content_digest = objects.put(content)?;
        let commit = Commit::new(content_digest, parent, timestamp, message);
        let digest = objects.put(&commit.encode())?;
        debug_assert_eq!(digest, *commit.digest());

        self.refs().advance(parent.as_ref(), &digest)?;

        info!(
            commit = %digest.short(),
            content = %content_digest.short(),
            parent = ?parent.map(|p| p.short()),
            "created commit"
        );
        Ok(digest)
    }

    /// Reads and decodes a commit record.
    ///
    /// # Errors
    ///
    /// - `Error::CommitNotFound` if nothing is stored under `digest`.
    /// - `Error::InvalidObject` if the object is not a commit record.
    pub fn find_commit(&self, digest: &Digest) -> Result<Commit> {
        let data = self.objects().get(digest).map_err(|e| match e {
            Error::ObjectNotFound(_) => Error::CommitNotFound(digest.to_hex()),
            other => other,
        })?;
        Commit::decode(*digest, &data)
    }

    /// Resolves a full or abbreviated digest to a stored commit.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDigest` if the string is not a valid (prefix of a) digest.
    /// - `Error::CommitNotFound` if nothing matches.
    /// - `Error::AmbiguousDigest` if several objects match.
    /// - `Error::InvalidObject` if the match is not a commit record.
    pub fn resolve_commit(&self, spec: &str) -> Result<Digest> {
        let digest = self.objects().resolve_prefix(spec).map_err(|e| match e {
            Error::ObjectNotFound(_) => Error::CommitNotFound(spec.to_string()),
            other => other,
        })?;
        self.find_commit(&digest)?;
        Ok(digest)
    }

    /// Returns the content recorded by a commit.
    ///
    /// Nothing is written: no commit is created and the tip does not move.
    pub fn snapshot(&self, target: &Digest) -> Result<Vec<u8>> {
        let commit = self.find_commit(target)?;
        self.objects().get(commit.content())
    }

    /// Compares `content` with the content of the tip commit.
    ///
    /// Without any history the result is always `Status::Dirty`.
    pub fn status_of(&self, content: &[u8]) -> Result<Status> {
        let committed = match self.resolve()? {
            Some(tip) => Some(*self.find_commit(&tip)?.content()),
            None => None,
        };
        Ok(compute_status(committed.as_ref(), content))
    }

    /// Returns an iterator over the history, newest first.
    pub fn log(&self) -> Result<History<'_, B>> {
        self.log_with_options(LogOptions::default())
    }

    /// Returns an iterator over the history with filtering options.
    ///
    /// # Errors
    ///
    /// - `Error::CommitNotFound` if `options` starts from a commit that does
    ///   not exist.
    pub fn log_with_options(&self, options: LogOptions) -> Result<History<'_, B>> {
        if let Some(from) = options.get_from() {
            if !self.objects().contains(from)? {
                return Err(Error::CommitNotFound(from.to_hex()));
            }
        }
        let tip = self.resolve()?;
        Ok(History::with_options(self.objects(), tip, options))
    }

    /// Verifies the whole history.
    ///
    /// Every commit record and every content blob is re-hashed, regardless
    /// of the `core.verifyObjects` setting.
    ///
    /// # Returns
    ///
    /// The number of verified commits, or the first `Error::BrokenHistory`.
    pub fn verify(&self) -> Result<usize> {
        let objects = ObjectStore::new(&self.backend);
        let mut count = 0;

        for commit in History::new(ObjectStore::new(&self.backend), self.resolve()?) {
            let commit = commit?;
            objects.get(commit.content()).map_err(|e| Error::BrokenHistory {
                digest: commit.digest().to_hex(),
                reason: format!("content {}: {}", commit.content().short(), e),
            })?;
            count += 1;
        }

        debug!(commits = count, "verified history");
        Ok(count)
    }
}

impl Repository<FsBackend> {
    /// Creates a new repository in `work_dir/.trackit`.
    ///
    /// # Arguments
    ///
    /// * `work_dir` - The directory holding the tracked file.
    /// * `tracked_name` - The tracked file path, relative to `work_dir`.
    ///
    /// # Errors
    ///
    /// - `Error::AlreadyInitialized` if `.trackit` already exists.
    /// - `Error::InvalidConfig` if `tracked_name` is absolute, leaves
    ///   `work_dir` or points into `.trackit`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use trackit::Repository;
    ///
    /// let repo = Repository::init(".", "notes.txt").unwrap();
    /// ```
    pub fn init<P: AsRef<Path>>(work_dir: P, tracked_name: &str) -> Result<Self> {
        let work_dir = work_dir.as_ref().canonicalize()?;

        check_tracked_path(tracked_name)?;
        Self::initialize(FsBackend::new(work_dir.join(TRACKIT_DIR)), tracked_name)
    }

    /// Opens an existing repository rooted at `work_dir`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use trackit::Repository;
    ///
    /// let repo = Repository::open("path/to/project").unwrap();
    /// println!("tracking {}", repo.tracked_path().display());
    /// ```
    pub fn open<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let path = work_dir.as_ref();
        let work_dir = path
            .canonicalize()
            .map_err(|_| Error::NotInitialized(path.display().to_string()))?;
        Self::open_root(work_dir.join(TRACKIT_DIR))
    }

    fn open_root(root: PathBuf) -> Result<Self> {
        let repo = Self::open_backend(FsBackend::new(root))?;
        check_tracked_path(repo.tracked_name())?;
        Ok(repo)
    }

    /// Discovers a repository by searching upward from the given path.
    ///
    /// Starting from `path`, this walks up the directory tree looking for a
    /// `.trackit` directory until it finds one or reaches the filesystem root.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut current = path
            .canonicalize()
            .map_err(|_| Error::NotInitialized(path.display().to_string()))?;

        loop {
            if current.join(TRACKIT_DIR).is_dir() {
                return Self::open_root(current.join(TRACKIT_DIR));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(Error::NotInitialized(path.display().to_string())),
            }
        }
    }

    /// Returns the work directory (the parent of `.trackit`).
    pub fn work_dir(&self) -> &Path {
        let root = self.backend.root();
        root.parent().unwrap_or(root)
    }

    /// Returns the absolute path of the tracked file.
    pub fn tracked_path(&self) -> PathBuf {
        self.work_dir().join(self.tracked_name())
    }

    /// Reads the current contents of the tracked file.
    pub fn read_tracked(&self) -> Result<Vec<u8>> {
        let path = self.tracked_path();
        fs::read(&path).map_err(|source| Error::SourceUnreadable { path, source })
    }

    /// Commits the current contents of the tracked file.
    ///
    /// The file is read before anything is stored; an unreadable file
    /// leaves the repository untouched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use trackit::Repository;
    ///
    /// let repo = Repository::open(".").unwrap();
    /// let digest = repo.commit("first").unwrap();
    /// println!("committed {}", digest.short());
    /// ```
    pub fn commit(&self, message: &str) -> Result<Digest> {
        let content = self.read_tracked()?;
        self.commit_content(&content, message)
    }

    /// Compares the tracked file with the latest commit.
    pub fn status(&self) -> Result<Status> {
        let content = self.read_tracked()?;
        self.status_of(&content)
    }

    /// Restores the tracked file to its contents at `target`.
    ///
    /// The file is replaced atomically. No commit is created; committing
    /// afterwards records the restored content as a new commit.
    ///
    /// # Returns
    ///
    /// The restored bytes.
    pub fn revert(&self, target: &Digest) -> Result<Vec<u8>> {
        let content = self.snapshot(target)?;
        write_file_atomic(self.tracked_path(), &content)?;
        info!(commit = %target.short(), file = %self.tracked_path().display(), "restored tracked file");
        Ok(content)
    }
}

/// Rejects tracked paths that leave the work directory or point into `.trackit`.
fn check_tracked_path(tracked_name: &str) -> Result<()> {
    let path = Path::new(tracked_name);
    let inside = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !inside {
        return Err(Error::InvalidConfig(format!(
            "tracked file must be a relative path inside the work directory: {}",
            tracked_name
        )));
    }

    let metadata = path
        .components()
        .find(|c| matches!(c, Component::Normal(_)))
        .is_some_and(|c| c.as_os_str() == TRACKIT_DIR);
    if metadata {
        return Err(Error::InvalidConfig(format!(
            "tracked file cannot live inside {}: {}",
            TRACKIT_DIR, tracked_name
        )));
    }

    Ok(())
}
