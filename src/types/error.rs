//! Error types for treemirror

use super::Operation;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for mirroring operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path vanished or never existed
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// A single per-item filesystem operation failed
    #[error("{op} failed for {path}: {source}")]
    Operation {
        op: Operation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Classify an IO error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            ErrorKind::NotFound => SyncError::NotFound { path },
            ErrorKind::PermissionDenied => SyncError::PermissionDenied { path },
            _ => SyncError::Io(error),
        }
    }

    /// Wrap an IO error as a failed per-item operation.
    pub fn operation(op: Operation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Operation {
            op,
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }

    /// Check if this error means the path is gone
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::NotFound { .. } => true,
            SyncError::Io(e) | SyncError::Operation { source: e, .. } => {
                e.kind() == ErrorKind::NotFound
            }
            _ => false,
        }
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        match self {
            SyncError::PermissionDenied { .. } => true,
            SyncError::Io(e) | SyncError::Operation { source: e, .. } => {
                e.kind() == ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(error: tokio::task::JoinError) -> Self {
        SyncError::Task(error.to_string())
    }
}
