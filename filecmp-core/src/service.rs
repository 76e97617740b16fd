//! The compare service: the three operations exposed to callers.
//!
//! `CompareService` owns its collaborators (content reader, tree builder,
//! alignment strategy) and holds no other state, so one instance can be
//! shared by any number of concurrent requests.

use std::path::Path;

use crate::align::AlignAlgorithm;
use crate::config::Config;
use crate::content::{ContentReader, FsContentReader};
use crate::diff::diff_texts;
use crate::error::{CompareError, FsResult};
use crate::tree::TreeBuilder;
use crate::types::{CompareRequest, CompareResponse, DiffStats, FileContent, FileTreeNode, Side};

pub struct CompareService<R = FsContentReader> {
    reader: R,
    tree: TreeBuilder,
    algorithm: AlignAlgorithm,
}

impl CompareService<FsContentReader> {
    /// Builds a service backed by the local file system.
    pub fn new(config: &Config) -> Self {
        Self::with_reader(
            FsContentReader::new(config.limits.max_file_bytes),
            TreeBuilder::new(config.tree.excluded.clone(), config.tree.max_depth),
            config.diff.algorithm,
        )
    }
}

impl<R: ContentReader> CompareService<R> {
    pub fn with_reader(reader: R, tree: TreeBuilder, algorithm: AlignAlgorithm) -> Self {
        Self { reader, tree, algorithm }
    }

    /// Recursively lists `directory`.
    pub fn list_tree(&self, directory: &str) -> FsResult<FileTreeNode> {
        tracing::debug!(directory, "listing tree");
        let tree = self.tree.build(Path::new(directory)).inspect_err(|e| {
            tracing::warn!(directory, error = %e, "tree listing failed");
        })?;
        tracing::debug!(directory, nodes = tree.node_count(), "tree listed");
        Ok(tree)
    }

    /// Returns the full text of `path`.
    pub fn file_content(&self, path: &str) -> FsResult<FileContent> {
        tracing::debug!(path, "reading file content");
        let content = self.reader.read(Path::new(path)).inspect_err(|e| {
            tracing::warn!(path, error = %e, "file read failed");
        })?;
        Ok(FileContent { content, path: path.to_owned() })
    }

    /// Compares the two files of `request` line by line.
    ///
    /// Both files are probed before either is read, so a missing file is
    /// reported ahead of a decode failure on the other side. Any failure aborts
    /// the comparison; no partial diff is returned.
    pub fn compare(&self, request: &CompareRequest) -> Result<CompareResponse, CompareError> {
        let left_path = Path::new(&request.path_left);
        let right_path = Path::new(&request.path_right);
        tracing::debug!(left = %request.path_left, right = %request.path_right, "comparing");

        let result = self
            .reader
            .probe(left_path)
            .map_err(|e| CompareError::new(Side::Left, e))
            .and_then(|()| {
                self.reader
                    .probe(right_path)
                    .map_err(|e| CompareError::new(Side::Right, e))
            })
            .and_then(|()| {
                let left = self
                    .reader
                    .read(left_path)
                    .map_err(|e| CompareError::new(Side::Left, e))?;
                let right = self
                    .reader
                    .read(right_path)
                    .map_err(|e| CompareError::new(Side::Right, e))?;
                Ok((left, right))
            });

        let (left, right) = result.inspect_err(|e| {
            tracing::warn!(side = %e.side, error = %e.source, "compare failed");
        })?;

        let diff = diff_texts(&left, &right, self.algorithm);
        let stats = DiffStats::from_lines(&diff);
        tracing::info!(
            left = %request.path_left,
            right = %request.path_right,
            algorithm = self.algorithm.as_str(),
            rows = diff.len(),
            inserted = stats.insert,
            deleted = stats.delete,
            replaced = stats.replace,
            "compare finished"
        );

        Ok(CompareResponse {
            file1: request.path_left.clone(),
            file2: request.path_right.clone(),
            diff,
            stats,
        })
    }
}
