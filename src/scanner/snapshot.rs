//! Snapshot builder

use crate::logging::Logger;
use crate::scanner::TreeWalker;
use crate::types::{PathPolicy, Root, Snapshot};
use std::path::Path;
use std::time::Instant;

/// Walk `root` once and index everything found by root-relative path.
///
/// Paths that cannot be made relative to the root are logged and skipped;
/// they can only appear if the tree changed shape mid-walk.
pub fn build_snapshot(
    root: &Root,
    walker: &TreeWalker,
    policy: PathPolicy,
    logger: &Logger,
) -> Snapshot {
    let start_time = Instant::now();
    let mut snapshot = Snapshot::new(root.path().to_path_buf(), policy);

    let output = walker.walk(root.path(), logger);

    for absolute in output.directories {
        match relative_to(root.path(), &absolute) {
            Some(relative) => snapshot.insert_directory(relative, absolute),
            None => logger.warn(format!(
                "Skipping directory outside root {}: {}",
                root,
                absolute.display()
            )),
        }
    }

    for absolute in output.files {
        match relative_to(root.path(), &absolute) {
            Some(relative) => snapshot.insert_file(relative, absolute),
            None => logger.warn(format!(
                "Skipping file outside root {}: {}",
                root,
                absolute.display()
            )),
        }
    }

    snapshot.set_scan_duration(start_time.elapsed());
    snapshot
}

fn relative_to(root: &Path, absolute: &Path) -> Option<std::path::PathBuf> {
    absolute
        .strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
