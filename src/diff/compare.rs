//! Change detection for files present on both sides

use crate::hash::compute_hash;
use crate::types::SyncError;
use std::fs;
use std::path::Path;

/// Outcome of comparing a source file with its replica counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCheck {
    /// Same size and modification time
    Identical,

    /// Sizes differ; no hashing needed
    SizeDiffers,

    /// Same size, different timestamp, different digest
    ContentDiffers,

    /// Same size, different timestamp, same digest
    ContentMatches,

    /// Either side vanished since the snapshot was taken
    Missing,
}

impl ChangeCheck {
    /// Must the source content be copied over the replica?
    pub fn needs_copy(self) -> bool {
        matches!(self, ChangeCheck::SizeDiffers | ChangeCheck::ContentDiffers)
    }

    /// Were digests computed to reach this verdict?
    pub fn was_hashed(self) -> bool {
        matches!(
            self,
            ChangeCheck::ContentDiffers | ChangeCheck::ContentMatches
        )
    }

    /// Content is equal but the replica timestamp lags behind the source
    pub fn needs_timestamp(self) -> bool {
        self == ChangeCheck::ContentMatches
    }
}

/// Decide whether `replica` must be refreshed from `source`.
///
/// Tier 1 compares size and modification time. Tier 2 settles a size
/// mismatch without reading content. Tier 3 streams both files through the
/// digest, reached only for equal sizes with differing timestamps.
///
/// A file missing on either side is reported as `Missing`, never as an error.
pub fn detect_change(source: &Path, replica: &Path) -> Result<ChangeCheck, SyncError> {
    let (src_meta, dst_meta) = match (fs::metadata(source), fs::metadata(replica)) {
        (Ok(s), Ok(d)) => (s, d),
        (Err(e), _) | (_, Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ChangeCheck::Missing)
        }
        (Err(e), _) => return Err(SyncError::from_io(source, e)),
        (_, Err(e)) => return Err(SyncError::from_io(replica, e)),
    };

    let src_mtime = src_meta.modified()?;
    let dst_mtime = dst_meta.modified()?;

    if src_meta.len() == dst_meta.len() && src_mtime == dst_mtime {
        return Ok(ChangeCheck::Identical);
    }

    if src_meta.len() != dst_meta.len() {
        return Ok(ChangeCheck::SizeDiffers);
    }

    let digests = compute_hash(source).and_then(|s| compute_hash(replica).map(|d| (s, d)));
    match digests {
        Ok((s, d)) if s == d => Ok(ChangeCheck::ContentMatches),
        Ok(_) => Ok(ChangeCheck::ContentDiffers),
        Err(e) if e.is_not_found() => Ok(ChangeCheck::Missing),
        Err(e) => Err(e),
    }
}
