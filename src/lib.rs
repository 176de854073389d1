//! # treemirror - One-way directory mirroring
//!
//! Keeps a replica directory identical to a source directory: structure,
//! contents and modification times. Each pass snapshots both trees, diffs
//! them by relative path and applies the minimal set of creates, copies,
//! updates and deletes. Passes repeat on a fixed interval until cancelled.

// Module declarations
pub mod commands;
pub mod config;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod logging;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use commands::{PassReport, Synchronizer};
pub use config::Config;
pub use logging::{Level, Logger};
pub use types::{Operation, PathPolicy, Root, Snapshot, SyncError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
