//! Repository configuration file parsing and access.
//!
//! The configuration lives at `.trackit/config` and uses an INI-like
//! format:
//!
//! ```text
//! [core]
//!     tracked = notes.txt
//!     verifyObjects = true
//! ```
//!
//! # Example
//!
//! ```
//! use trackit::config::Config;
//!
//! let config: Config = "[core]\ntracked = notes.txt\n".parse().unwrap();
//! assert_eq!(config.get("core", "tracked"), Some("notes.txt"));
//! assert!(config.get_bool_or("core", "verifyObjects", true).unwrap());
//! ```

mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The section holding the repository settings.
pub const CORE: &str = "core";

/// Key of the tracked file path, relative to the work directory.
pub const TRACKED: &str = "tracked";

/// Key of the object read verification switch.
pub const VERIFY_OBJECTS: &str = "verifyObjects";

/// A parsed repository configuration.
///
/// Section and key lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Configuration entries stored as section -> key -> value.
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Config {
            entries: BTreeMap::new(),
        }
    }

    /// Parses configuration from raw file bytes.
    pub fn from_bytes(content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(content).map_err(|_| Error::InvalidUtf8)?;
        parser::parse(text)
    }

    /// Gets a configuration value.
    ///
    /// # Arguments
    ///
    /// * `section` - The section name (e.g., "core").
    /// * `key` - The key name (e.g., "tracked").
    ///
    /// # Returns
    ///
    /// The value if found, or `None` if the key doesn't exist.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&section.to_lowercase())
            .and_then(|keys| keys.get(&key.to_lowercase()))
            .map(|s| s.as_str())
    }

    /// Gets a configuration value as a boolean.
    ///
    /// Accepts `true`, `yes`, `on`, `1` and `false`, `no`, `off`, `0`, or
    /// an empty value, case-insensitively.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the key doesn't exist, `Err` if the value is not a
    /// valid boolean.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        self.get(section, key).map(parse_bool).transpose()
    }

    /// Gets a boolean value, falling back to `default` when it is unset.
    pub fn get_bool_or(&self, section: &str, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_bool(section, key)?.unwrap_or(default))
    }

    /// Returns all section names in the configuration.
    pub fn sections(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Sets a configuration value, replacing any previous one.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.entries
            .entry(section.to_lowercase())
            .or_default()
            .insert(key.to_lowercase(), value.to_string());
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        parser::parse(content)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (section, keys) in &self.entries {
            writeln!(f, "[{}]", section)?;
            for (key, value) in keys {
                writeln!(f, "\t{} = {}", key, parser::escape_value(value))?;
            }
        }
        Ok(())
    }
}

/// Parses a string as a boolean value.
fn parse_bool(value: &str) -> Result<bool> {
    let lower = value.trim().to_lowercase();
    match lower.as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(Error::InvalidConfig(format!(
            "invalid boolean value: {}",
            value
        ))),
    }
}
