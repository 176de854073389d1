//! PathPolicy - how relative paths are compared across the two snapshots

use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Key under which a relative path is stored in a snapshot.
///
/// Two relative paths are the same entry iff their keys are equal.
pub type PathKey = OsString;

/// Path-equality policy applied to both snapshots of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PathPolicy {
    /// Byte-exact comparison
    Sensitive,

    /// Case-folded comparison (Windows, macOS default volumes)
    Insensitive,
}

impl PathPolicy {
    /// Policy matching the platform's usual filesystem
    pub fn platform() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            PathPolicy::Insensitive
        } else {
            PathPolicy::Sensitive
        }
    }

    /// Compute the comparison key for a relative path
    ///
    /// Insensitive keys lowercase each component that is valid UTF-8. Other
    /// components keep their exact bytes, so distinct names never merge.
    pub fn key(self, relative: &Path) -> PathKey {
        match self {
            PathPolicy::Sensitive => relative.as_os_str().to_os_string(),
            PathPolicy::Insensitive => {
                let mut key = PathBuf::new();
                for component in relative.components() {
                    let raw = component.as_os_str();
                    match raw.to_str() {
                        Some(text) => key.push(text.to_lowercase()),
                        None => key.push(raw),
                    }
                }
                key.into_os_string()
            }
        }
    }

    pub fn same_path(self, a: &Path, b: &Path) -> bool {
        self.key(a) == self.key(b)
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::platform()
    }
}
