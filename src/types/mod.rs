//! Core type definitions for treemirror

mod action;
mod error;
mod policy;
mod root;
mod snapshot;

pub use action::Operation;
pub use error::SyncError;
pub use policy::{PathKey, PathPolicy};
pub use root::Root;
pub use snapshot::{Snapshot, SnapshotEntry};
