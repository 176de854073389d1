//! Diff result computation

use crate::types::{PathKey, Snapshot, SnapshotEntry};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Classification of every relative path seen in a pass
///
/// Each list is sorted by policy key. Directory lists are reordered by
/// depth before they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// In source, not in replica
    pub dirs_to_create: Vec<PathBuf>,

    /// In replica, not in source
    pub dirs_to_delete: Vec<PathBuf>,

    /// Files in source, not in replica
    pub files_to_copy: Vec<PathBuf>,

    /// Files in replica, not in source
    pub files_to_delete: Vec<PathBuf>,

    /// Files on both sides; the change detector decides
    pub files_to_check: Vec<PathBuf>,
}

impl DiffResult {
    /// No structural work and nothing to copy or delete.
    ///
    /// Update candidates do not count: they only become work when the
    /// change detector flags them.
    pub fn is_empty(&self) -> bool {
        self.dirs_to_create.is_empty()
            && self.dirs_to_delete.is_empty()
            && self.files_to_copy.is_empty()
            && self.files_to_delete.is_empty()
    }

    /// Number of create/copy/delete operations (update candidates excluded)
    pub fn pending_operations(&self) -> usize {
        self.dirs_to_create.len()
            + self.dirs_to_delete.len()
            + self.files_to_copy.len()
            + self.files_to_delete.len()
    }
}

/// Compare two snapshots by key-set algebra.
///
/// Pure and total: never touches the filesystem. Paths to create or copy
/// keep the source's spelling, paths to delete keep the replica's, so the
/// operations name what actually exists on each side.
pub fn compute_diff(source: &Snapshot, replica: &Snapshot) -> DiffResult {
    DiffResult {
        dirs_to_create: difference(source.directory_map(), replica.directory_map()),
        dirs_to_delete: difference(replica.directory_map(), source.directory_map()),
        files_to_copy: difference(source.file_map(), replica.file_map()),
        files_to_delete: difference(replica.file_map(), source.file_map()),
        files_to_check: intersection(source.file_map(), replica.file_map()),
    }
}

fn difference(
    left: &BTreeMap<PathKey, SnapshotEntry>,
    right: &BTreeMap<PathKey, SnapshotEntry>,
) -> Vec<PathBuf> {
    left.iter()
        .filter(|(key, _)| !right.contains_key(*key))
        .map(|(_, entry)| entry.relative.clone())
        .collect()
}

fn intersection(
    left: &BTreeMap<PathKey, SnapshotEntry>,
    right: &BTreeMap<PathKey, SnapshotEntry>,
) -> Vec<PathBuf> {
    left.iter()
        .filter(|(key, _)| right.contains_key(*key))
        .map(|(_, entry)| entry.relative.clone())
        .collect()
}

/// Number of components in a relative path
pub fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Order parents before children (ascending depth, stable)
pub fn sort_shallowest_first(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| depth(p));
}

/// Order children before parents (descending depth, stable)
pub fn sort_deepest_first(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| std::cmp::Reverse(depth(p)));
}
