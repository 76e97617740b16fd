//! File content retrieval.
//!
//! `ContentReader` is the seam the compare service reads through; the
//! file-system implementation enforces an explicit size bound and rejects
//! content that is not valid UTF-8.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{FsError, FsResult};

/// Default upper bound on the size of a file that will be read (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Source of file text for the compare service.
///
/// Implementations must be shareable across worker threads.
pub trait ContentReader: Send + Sync {
    /// Checks that `path` exists and is a regular file, without reading it.
    fn probe(&self, path: &Path) -> FsResult<()>;

    /// Returns the full text at `path`.
    fn read(&self, path: &Path) -> FsResult<String>;
}

/// Reads UTF-8 files from the local file system.
#[derive(Debug, Clone)]
pub struct FsContentReader {
    max_bytes: u64,
}

impl FsContentReader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn file_len(&self, path: &Path) -> FsResult<u64> {
        let metadata = fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(FsError::NotAFile(path.to_path_buf()));
        }
        Ok(metadata.len())
    }
}

impl Default for FsContentReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl ContentReader for FsContentReader {
    fn probe(&self, path: &Path) -> FsResult<()> {
        self.file_len(path).map(|_| ())
    }

    fn read(&self, path: &Path) -> FsResult<String> {
        let size = self.file_len(path)?;
        if size > self.max_bytes {
            return Err(FsError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_bytes,
            });
        }

        // The file may have grown since the stat; never buffer past the limit.
        let bytes = fs::File::open(path)
            .and_then(|file| read_bounded(file, size, self.max_bytes))
            .map_err(|e| FsError::from_io(path, e))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(FsError::TooLarge {
                path: path.to_path_buf(),
                size: bytes.len() as u64,
                limit: self.max_bytes,
            });
        }

        String::from_utf8(bytes).map_err(|_| FsError::NotText(path.to_path_buf()))
    }
}

/// Reads at most `limit + 1` bytes, so an over-limit source is detectable
/// without buffering all of it.
fn read_bounded(source: impl Read, expected: u64, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(expected.min(limit) as usize);
    source.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    Ok(bytes)
}
