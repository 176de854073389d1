//! Content digests for the strong check

use crate::types::SyncError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer size for hashing
const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the Blake3 digest of a file
///
/// The file is streamed in 64KB chunks, so memory use does not grow with
/// file size.
///
/// # Errors
/// * `SyncError::NotFound` if the file vanished
/// * `SyncError::PermissionDenied` / `SyncError::Io` on read failure
///
/// # Example
/// ```no_run
/// use treemirror::hash::compute_hash;
/// use std::path::Path;
///
/// let digest = compute_hash(Path::new("file.txt"))?;
/// # Ok::<(), treemirror::types::SyncError>(())
/// ```
pub fn compute_hash(file_path: &Path) -> Result<[u8; 32], SyncError> {
    let mut file = File::open(file_path).map_err(|e| SyncError::from_io(file_path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| SyncError::from_io(file_path, e))?;

        if bytes_read == 0 {
            break; // EOF
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(*hasher.finalize().as_bytes())
}
