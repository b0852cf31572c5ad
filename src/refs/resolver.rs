//! Reference storage, resolution, and compare-and-swap updates.

use tracing::{debug, warn};

use super::head::Head;
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::objects::Digest;

/// The key of the HEAD reference.
pub const HEAD: &str = "HEAD";

/// The name of the ref HEAD points at in a fresh repository.
pub const DEFAULT_REF: &str = "refs/main";

/// The contents of a single reference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    /// A direct reference to a commit digest.
    Direct(Digest),
    /// A symbolic reference to a named ref (e.g., HEAD -> refs/main).
    Symbolic(String),
    /// A named ref that exists but has no commit yet.
    Unborn,
}

/// A store for reading and advancing references.
///
/// HEAD is stored as `ref: <name>` (symbolic) or a bare digest (direct).
/// Named refs hold a digest, or nothing before the first commit.
#[derive(Debug)]
pub struct RefStore<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> RefStore<'a, B> {
    /// Creates a RefStore over the given backend.
    pub fn new(backend: &'a B) -> Self {
        RefStore { backend }
    }

    /// Writes HEAD and an empty named ref for a new repository.
    ///
    /// # Arguments
    ///
    /// * `name` - The named ref HEAD should point at (e.g. `refs/main`).
    pub fn initialize(&self, name: &str) -> Result<()> {
        validate_ref_name(name)?;
        self.backend.write(name, b"")?;
        self.backend.write(HEAD, format!("ref: {}\n", name).as_bytes())?;
        debug!(head = name, "initialized references");
        Ok(())
    }

    /// Reads and parses a reference file.
    ///
    /// A missing named ref reads as `RefValue::Unborn`; a missing HEAD is an
    /// error.
    pub fn read_ref_file(&self, name: &str) -> Result<RefValue> {
        let data = match self.backend.read(name)? {
            Some(data) => data,
            None if name == HEAD => {
                return Err(Error::InvalidRef {
                    name: name.to_string(),
                    reason: "missing".to_string(),
                })
            }
            None => return Ok(RefValue::Unborn),
        };

        let content = std::str::from_utf8(&data).map_err(|_| Error::InvalidRef {
            name: name.to_string(),
            reason: "not UTF-8".to_string(),
        })?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(RefValue::Unborn);
        }

        // Check if it's a symbolic reference
        if let Some(target) = content.strip_prefix("ref: ") {
            return Ok(RefValue::Symbolic(target.trim().to_string()));
        }

        let digest = Digest::from_hex(content).map_err(|_| Error::InvalidRef {
            name: name.to_string(),
            reason: format!("not a digest: {}", content),
        })?;
        Ok(RefValue::Direct(digest))
    }

    /// Returns the current HEAD state.
    ///
    /// Follows at most one level of symbolic indirection.
    pub fn head(&self) -> Result<Head> {
        match self.read_ref_file(HEAD)? {
            RefValue::Direct(digest) => Ok(Head::detached(digest)),
            RefValue::Unborn => Err(Error::InvalidRef {
                name: HEAD.to_string(),
                reason: "empty".to_string(),
            }),
            RefValue::Symbolic(target) => {
                validate_ref_name(&target)?;
                match self.read_ref_file(&target)? {
                    RefValue::Direct(digest) => Ok(Head::named(target, Some(digest))),
                    RefValue::Unborn => Ok(Head::named(target, None)),
                    RefValue::Symbolic(_) => Err(Error::InvalidRef {
                        name: target,
                        reason: "nested symbolic reference".to_string(),
                    }),
                }
            }
        }
    }

    /// Resolves HEAD to the tip commit digest.
    ///
    /// # Returns
    ///
    /// `None` when no commit has been made yet.
    pub fn resolve(&self) -> Result<Option<Digest>> {
        Ok(self.head()?.tip().copied())
    }

    /// Moves the tip from `expected` to `new`.
    ///
    /// The update takes `<ref>.lock` with an exclusive create, checks that
    /// the ref still holds `expected`, then renames the lock over the ref.
    ///
    /// # Errors
    ///
    /// - `Error::RefLocked` if another writer holds the lock.
    /// - `Error::RefConflict` if the ref no longer holds `expected`.
    pub fn advance(&self, expected: Option<&Digest>, new: &Digest) -> Result<()> {
        let name = self.head()?.reference_name();
        let lock = format!("{}.lock", name);

        if !self
            .backend
            .create_new(&lock, format!("{}\n", new.to_hex()).as_bytes())?
        {
            warn!(reference = %name, "reference is locked by another writer");
            return Err(Error::RefLocked(name));
        }

        let result = self.swap_locked(&name, &lock, expected);
        if result.is_err() {
            if let Err(e) = self.backend.remove(&lock) {
                warn!(reference = %name, error = %e, "failed to release reference lock");
            }
        }
        result?;

        debug!(reference = %name, tip = %new.short(), "advanced reference");
        Ok(())
    }

    fn swap_locked(&self, name: &str, lock: &str, expected: Option<&Digest>) -> Result<()> {
        let current = match self.read_ref_file(name)? {
            RefValue::Direct(digest) => Some(digest),
            RefValue::Unborn => None,
            RefValue::Symbolic(_) => {
                return Err(Error::InvalidRef {
                    name: name.to_string(),
                    reason: "nested symbolic reference".to_string(),
                })
            }
        };

        if current.as_ref() != expected {
            warn!(reference = %name, "reference moved during update");
            return Err(Error::RefConflict {
                name: name.to_string(),
                expected: describe(expected),
                actual: describe(current.as_ref()),
            });
        }

        self.backend.rename(lock, name)
    }
}

fn describe(digest: Option<&Digest>) -> String {
    digest
        .map(Digest::to_hex)
        .unwrap_or_else(|| "(no commit)".to_string())
}

/// Validates a named ref: `refs/` followed by one or more simple components.
fn validate_ref_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidRef {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let rest = name
        .strip_prefix("refs/")
        .ok_or_else(|| invalid("must start with refs/"))?;

    for component in rest.split('/') {
        if component.is_empty() || component.starts_with('.') || component.ends_with(".lock") {
            return Err(invalid("bad path component"));
        }
        if !component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid("unsupported character"));
        }
    }

    Ok(())
}
