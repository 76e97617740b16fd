//! Configuration for filecmp.
//!
//! Read from `$XDG_CONFIG_HOME/filecmp/config.toml` (or
//! `~/.config/filecmp/config.toml`). Every key is optional:
//!
//! ```toml
//! [limits]
//! max_file_bytes = 10485760
//! request_timeout_secs = 30
//!
//! [tree]
//! excluded = ["node_modules", "__pycache__", "dist", "build"]
//! max_depth = 64
//!
//! [diff]
//! algorithm = "myers"   # myers | patience | lcs
//!
//! [server]
//! workers = 4
//!
//! [log]
//! level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::align::AlignAlgorithm;
use crate::content::DEFAULT_MAX_FILE_BYTES;
use crate::error::ConfigError;
use crate::tree::{DEFAULT_EXCLUDED, DEFAULT_MAX_DEPTH};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Files larger than this are rejected instead of read.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Deadline for a single server request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Entry names skipped in listings, on top of dot-files.
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            excluded: default_excluded(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default)]
    pub algorithm: AlignAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Number of worker threads serving requests.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { workers: default_workers() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED.iter().map(|name| (*name).to_owned()).collect()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_workers() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Returns the path to the filecmp config file.
///
/// Prefers `$XDG_CONFIG_HOME/filecmp/config.toml`; falls back to
/// `~/.config/filecmp/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("filecmp").join("config.toml")
}

impl Config {
    /// Parses a config document and validates it.
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`. A missing or unreadable file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw, path)
    }

    /// Loads the config at `path`, falling back to defaults.
    ///
    /// A missing file silently yields defaults. A file that cannot be read,
    /// parsed or validated also yields defaults, and the error is handed back
    /// so the caller can report it once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "limits.max_file_bytes",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.limits.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "limits.request_timeout_secs",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid {
                key: "server.workers",
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml("", Path::new("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.limits.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.tree.excluded, vec!["node_modules", "__pycache__", "dist", "build"]);
        assert_eq!(config.diff.algorithm, AlignAlgorithm::Myers);
        assert_eq!(config.server.workers, 4);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let raw = r#"
[limits]
max_file_bytes = 1024

[diff]
algorithm = "patience"

[tree]
excluded = ["target"]
"#;
        let config = Config::from_toml(raw, Path::new("config.toml")).unwrap();
        assert_eq!(config.limits.max_file_bytes, 1024);
        assert_eq!(config.limits.request_timeout_secs, 30);
        assert_eq!(config.diff.algorithm, AlignAlgorithm::Patience);
        assert_eq!(config.tree.excluded, vec!["target"]);
        assert_eq!(config.tree.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn unknown_algorithm_is_a_parse_error() {
        let err = Config::from_toml("[diff]\nalgorithm = \"histogram\"\n", Path::new("c.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = Config::from_toml("[server]\nworkers = 0\n", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "server.workers", .. }), "{err:?}");
    }

    #[test]
    fn load_or_default_tolerates_bad_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let (config, err) = Config::load_or_default(&missing);
        assert_eq!(config, Config::default());
        assert!(err.is_none());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[limits\nmax_file_bytes = ").unwrap();
        let (config, err) = Config::load_or_default(&broken);
        assert_eq!(config, Config::default());
        assert!(matches!(err, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nworkers = 2\n[log]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.workers, 2);
        assert_eq!(config.log.level, "debug");
    }
}
