//! Recursive tree walker

use crate::logging::Logger;
use crate::types::SyncError;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};

/// Everything the walker found beneath a root, as absolute paths
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkOutput {
    pub files: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
}

/// Enumerates files and directories beneath a root.
///
/// Directories are always listed; `pattern` filters files by name only.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    /// `None` matches every file name
    matcher: Option<GlobMatcher>,
    recursive: bool,
}

impl TreeWalker {
    /// Build a walker for `pattern` ("*" matches everything)
    ///
    /// # Errors
    /// * Invalid glob patterns return `SyncError::Config`
    pub fn new(pattern: &str, recursive: bool) -> Result<Self, SyncError> {
        let matcher = match pattern {
            "" | "*" => None,
            _ => Some(
                Glob::new(pattern)
                    .map_err(|e| {
                        SyncError::Config(format!("Invalid pattern '{}': {}", pattern, e))
                    })?
                    .compile_matcher(),
            ),
        };
        Ok(Self { matcher, recursive })
    }

    /// Walker that lists everything, recursively
    pub fn match_all() -> Self {
        Self {
            matcher: None,
            recursive: true,
        }
    }

    fn accepts(&self, file_name: &std::ffi::OsStr) -> bool {
        self.matcher
            .as_ref()
            .map_or(true, |matcher| matcher.is_match(file_name))
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Walk `root`, returning every file and directory found beneath it.
    ///
    /// Access and IO errors on individual entries are logged as warnings and
    /// the walk continues; whatever could be listed is returned. Symbolic
    /// links are skipped and the root itself is not listed.
    pub fn walk(&self, root: &Path, logger: &Logger) -> WalkOutput {
        let mut output = WalkOutput::default();

        // Mirror everything: no hidden-file, .gitignore or .ignore filtering
        let walker = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(if self.recursive { None } else { Some(1) })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    logger.warn(format!(
                        "Cannot list entry during walk of {}: {}",
                        root.display(),
                        e
                    ));
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = match entry.file_type() {
                Some(ft) => ft,
                None => continue,
            };

            if file_type.is_dir() {
                output.directories.push(entry.into_path());
            } else if file_type.is_file() && self.accepts(entry.file_name()) {
                output.files.push(entry.into_path());
            }
            // Symlinks, pipes, sockets and devices are not mirrored
        }

        output
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::match_all()
    }
}
