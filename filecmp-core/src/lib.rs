//! Core of filecmp: line-level comparison of two text files, directory tree
//! listing and file content retrieval.
//!
//! - `align`: line splitting and the raw edit script (`similar`-backed)
//! - `diff`: normalization of the edit script into `DiffLine` rows
//! - `tree`: filtered, sorted directory listing
//! - `content`: bounded UTF-8 file reads behind the `ContentReader` seam
//! - `service`: `CompareService`, the request-scoped facade over the above
//! - `config`: TOML configuration with defaults for every key

pub mod align;
pub mod config;
pub mod content;
pub mod diff;
pub mod error;
pub mod service;
pub mod tree;
pub mod types;

pub use align::{AlignAlgorithm, RawEditOp};
pub use config::Config;
pub use error::{CompareError, ConfigError, FsError};
pub use service::CompareService;
pub use types::{
    CompareRequest, CompareResponse, DiffKind, DiffLine, DiffStats, FileContent, FileTreeNode,
    Side,
};
