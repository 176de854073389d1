//! Root - a canonical, existing directory designated as source or replica

use super::SyncError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Absolute, canonicalized directory path. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root(PathBuf);

impl Root {
    /// Resolve `path` to its canonical absolute form.
    ///
    /// Fails with `SyncError::Config` if the path is empty, missing, or not a
    /// directory. This is a startup error, never a per-item one.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SyncError::Config("Directory path is empty".to_string()));
        }

        let canonical = std::fs::canonicalize(path).map_err(|e| {
            SyncError::Config(format!(
                "Directory does not exist: {} ({})",
                path.display(),
                e
            ))
        })?;

        if !canonical.is_dir() {
            return Err(SyncError::Config(format!(
                "Not a directory: {}",
                path.display()
            )));
        }

        Ok(Self(canonical))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Absolute path of a root-relative path
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.0.join(relative)
    }

    /// Is `other` this root or somewhere beneath it?
    pub fn contains(&self, other: &Path) -> bool {
        other.starts_with(&self.0)
    }
}

impl AsRef<Path> for Root {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
