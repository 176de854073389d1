//! Atomic file copy implementation

use crate::types::SyncError;
use filetime::FileTime;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Copy buffer size
const BUFFER_SIZE: usize = 128 * 1024;

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Stream into a uniquely named hidden `.part` file next to `dest`
/// 2. Flush and sync to disk
/// 3. Give the staging file the source's permissions and modification time
/// 4. Rename over `dest`, replacing any existing file
///
/// The parent of `dest` must already exist. The staging file belongs to this
/// call alone: on failure only it is removed, and `dest` plus any sibling
/// entries are left untouched.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
/// * `Err(SyncError)` - IO error or other failure
///
/// # Example
/// ```no_run
/// use treemirror::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), treemirror::types::SyncError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut prefix = OsString::from(".");
    prefix.push(dest.file_name().unwrap_or_default());
    prefix.push(".");

    // Dropped (and deleted) on every early return below
    let mut part = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|e| SyncError::from_io(parent, e))?;

    let bytes = write_part(src, part.as_file_mut())?;

    part.persist(dest)
        .map_err(|e| SyncError::from_io(dest, e.error))?;

    Ok(bytes)
}

fn write_part(src: &Path, part_file: &mut File) -> Result<u64, SyncError> {
    let mut src_file = File::open(src).map_err(|e| SyncError::from_io(src, e))?;

    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| SyncError::from_io(src, e))?;

        if bytes_read == 0 {
            break; // EOF
        }

        part_file.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
    }

    part_file.sync_all()?;

    let src_metadata = src_file
        .metadata()
        .map_err(|e| SyncError::from_io(src, e))?;
    // Staging files start out owner-only
    part_file.set_permissions(src_metadata.permissions())?;

    let mtime = src_metadata.modified()?;
    filetime::set_file_handle_times(part_file, None, Some(FileTime::from_system_time(mtime)))?;

    Ok(total_bytes)
}

/// Set `dest`'s modification time to `src`'s
pub fn copy_mtime(src: &Path, dest: &Path) -> Result<(), SyncError> {
    let mtime = fs::metadata(src)
        .and_then(|m| m.modified())
        .map_err(|e| SyncError::from_io(src, e))?;
    filetime::set_file_mtime(dest, FileTime::from_system_time(mtime))
        .map_err(|e| SyncError::from_io(dest, e))
}
