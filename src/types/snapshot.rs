//! Snapshot - point-in-time view of one root

use super::{PathKey, PathPolicy};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One snapshot entry: root-relative path plus its absolute location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub relative: PathBuf,
    pub absolute: PathBuf,
}

/// Files and directories found beneath a single root
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Root this snapshot was taken from
    pub root_path: PathBuf,

    /// Key policy shared by both maps
    pub policy: PathPolicy,

    /// Map: policy key → regular file
    files: BTreeMap<PathKey, SnapshotEntry>,

    /// Map: policy key → directory
    directories: BTreeMap<PathKey, SnapshotEntry>,

    /// Scan metadata
    pub scan_duration: Duration,
}

impl Snapshot {
    /// Create a new empty Snapshot
    pub fn new(root_path: PathBuf, policy: PathPolicy) -> Self {
        Self {
            root_path,
            policy,
            files: BTreeMap::new(),
            directories: BTreeMap::new(),
            scan_duration: Duration::from_secs(0),
        }
    }

    /// Insert a regular file.
    ///
    /// If two paths fold to the same key, the later one replaces the earlier.
    pub fn insert_file(&mut self, relative: PathBuf, absolute: PathBuf) {
        let key = self.policy.key(&relative);
        self.files.insert(key, SnapshotEntry { relative, absolute });
    }

    /// Insert a directory
    pub fn insert_directory(&mut self, relative: PathBuf, absolute: PathBuf) {
        let key = self.policy.key(&relative);
        self.directories
            .insert(key, SnapshotEntry { relative, absolute });
    }

    pub fn file(&self, relative: &Path) -> Option<&SnapshotEntry> {
        self.files.get(&self.policy.key(relative))
    }

    pub fn directory(&self, relative: &Path) -> Option<&SnapshotEntry> {
        self.directories.get(&self.policy.key(relative))
    }

    pub fn contains_file(&self, relative: &Path) -> bool {
        self.file(relative).is_some()
    }

    pub fn contains_directory(&self, relative: &Path) -> bool {
        self.directory(relative).is_some()
    }

    /// Iterator over file entries, in key order
    pub fn files(&self) -> impl Iterator<Item = (&PathKey, &SnapshotEntry)> {
        self.files.iter()
    }

    /// Iterator over directory entries, in key order
    pub fn directories(&self) -> impl Iterator<Item = (&PathKey, &SnapshotEntry)> {
        self.directories.iter()
    }

    pub(crate) fn file_map(&self) -> &BTreeMap<PathKey, SnapshotEntry> {
        &self.files
    }

    pub(crate) fn directory_map(&self) -> &BTreeMap<PathKey, SnapshotEntry> {
        &self.directories
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    /// Set the scan duration after scanning completes
    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(policy: PathPolicy) -> Snapshot {
        Snapshot::new(PathBuf::from("/root"), policy)
    }

    #[test]
    fn test_new_snapshot() {
        let snap = snapshot(PathPolicy::Sensitive);
        assert!(snap.is_empty());
        assert_eq!(snap.file_count(), 0);
        assert_eq!(snap.directory_count(), 0);
        assert_eq!(snap.scan_duration, Duration::from_secs(0));
    }

    #[test]
    fn test_files_and_directories_are_separate() {
        let mut snap = snapshot(PathPolicy::Sensitive);
        snap.insert_directory(PathBuf::from("a"), PathBuf::from("/root/a"));
        snap.insert_file(PathBuf::from("a/b.txt"), PathBuf::from("/root/a/b.txt"));

        assert!(snap.contains_directory(Path::new("a")));
        assert!(!snap.contains_file(Path::new("a")));
        assert!(snap.contains_file(Path::new("a/b.txt")));
        assert_eq!(
            snap.file(Path::new("a/b.txt")).map(|e| e.absolute.clone()),
            Some(PathBuf::from("/root/a/b.txt"))
        );
    }

    #[test]
    fn test_insensitive_lookup() {
        let mut snap = snapshot(PathPolicy::Insensitive);
        snap.insert_file(PathBuf::from("Docs/Readme.MD"), PathBuf::from("/root/Docs/Readme.MD"));

        assert!(snap.contains_file(Path::new("docs/readme.md")));
        let entry = snap.file(Path::new("DOCS/README.MD")).expect("entry");
        assert_eq!(entry.relative, PathBuf::from("Docs/Readme.MD"));
    }

    #[test]
    fn test_sensitive_keeps_case_variants_apart() {
        let mut snap = snapshot(PathPolicy::Sensitive);
        snap.insert_file(PathBuf::from("a.txt"), PathBuf::from("/root/a.txt"));
        snap.insert_file(PathBuf::from("A.txt"), PathBuf::from("/root/A.txt"));

        assert_eq!(snap.file_count(), 2);
    }

    #[test]
    fn test_duplicate_key_replaces() {
        let mut snap = snapshot(PathPolicy::Insensitive);
        snap.insert_file(PathBuf::from("a.txt"), PathBuf::from("/root/a.txt"));
        snap.insert_file(PathBuf::from("A.TXT"), PathBuf::from("/root/A.TXT"));

        assert_eq!(snap.file_count(), 1);
        assert_eq!(
            snap.file(Path::new("a.txt")).map(|e| e.relative.clone()),
            Some(PathBuf::from("A.TXT"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_insensitive_keeps_distinct_raw_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut snap = snapshot(PathPolicy::Insensitive);
        for raw in [&b"caf\xe9"[..], &b"caf\xc9"[..]] {
            let relative = PathBuf::from(OsStr::from_bytes(raw));
            snap.insert_file(relative.clone(), PathBuf::from("/root").join(relative));
        }

        assert_eq!(snap.file_count(), 2);
    }

    #[test]
    fn test_iteration_is_ordered() {
        let mut snap = snapshot(PathPolicy::Sensitive);
        for name in ["c", "a", "b"] {
            snap.insert_directory(PathBuf::from(name), PathBuf::from("/root").join(name));
        }

        let names: Vec<_> = snap
            .directories()
            .map(|(_, e)| e.relative.display().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
