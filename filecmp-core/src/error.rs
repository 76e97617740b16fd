use std::path::PathBuf;

use thiserror::Error;

use crate::types::Side;

/// File-system failures surfaced by the tree builder and the content reader.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("File is not a text file: {}", .0.display())]
    NotText(PathBuf),

    #[error("File too large: {} is {size} bytes (limit {limit})", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Maps an I/O error for `path`, keeping `NotFound` distinguishable.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path),
            _ => FsError::Io { path, source },
        }
    }

    /// Stable snake_case identifier used in protocol error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            FsError::NotFound(_) => "not_found",
            FsError::NotADirectory(_) => "not_a_directory",
            FsError::NotAFile(_) => "not_a_file",
            FsError::NotText(_) => "not_text",
            FsError::TooLarge { .. } => "too_large",
            FsError::Io { .. } => "io",
        }
    }

    /// HTTP-style status code for an HTTP binding of the service.
    pub fn status(&self) -> u16 {
        match self {
            FsError::NotFound(_) => 404,
            FsError::NotADirectory(_) | FsError::NotAFile(_) | FsError::NotText(_) => 400,
            FsError::TooLarge { .. } => 413,
            FsError::Io { .. } => 500,
        }
    }
}

/// A comparison failure, tagged with the side whose file caused it.
#[derive(Error, Debug)]
#[error("{side} file: {source}")]
pub struct CompareError {
    pub side: Side,
    #[source]
    pub source: FsError,
}

impl CompareError {
    pub fn new(side: Side, source: FsError) -> Self {
        Self { side, source }
    }

    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }

    pub fn status(&self) -> u16 {
        self.source.status()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type FsResult<T> = Result<T, FsError>;
