//! Directory tree listing.
//!
//! Builds a fresh `FileTreeNode` tree on every call. Hidden entries and a fixed
//! set of build/dependency directory names are skipped, remaining entries are
//! visited in lexicographic order, and a directory that cannot be listed for
//! lack of permission shows up with no children instead of failing the listing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FsError, FsResult};
use crate::types::FileTreeNode;

/// Entry names omitted from every listing, in addition to dot-files.
pub const DEFAULT_EXCLUDED: &[&str] = &["node_modules", "__pycache__", "dist", "build"];

/// Directories at this depth below the root are emitted without children.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct TreeBuilder {
    excluded: Vec<String>,
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXCLUDED.iter().map(|name| (*name).to_owned()).collect(),
            DEFAULT_MAX_DEPTH,
        )
    }
}

impl TreeBuilder {
    pub fn new(excluded: Vec<String>, max_depth: usize) -> Self {
        Self { excluded, max_depth }
    }

    /// True for names that never appear in `children`.
    pub fn is_excluded(&self, name: &str) -> bool {
        name.starts_with('.') || self.excluded.iter().any(|excluded| excluded == name)
    }

    /// Lists `root` recursively.
    ///
    /// # Errors
    ///
    /// `FsError::NotFound` if `root` does not exist, `FsError::NotADirectory` if
    /// it is not a directory, and `FsError::Io` for listing failures other than
    /// permission denials.
    pub fn build(&self, root: &Path) -> FsResult<FileTreeNode> {
        let metadata = fs::metadata(root).map_err(|e| FsError::from_io(root, e))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory(root.to_path_buf()));
        }
        self.build_dir(root, 0, &mut Vec::new())
    }

    /// `ancestors` holds the canonical paths of the directories being listed
    /// above `path`.
    fn build_node(
        &self,
        path: &Path,
        depth: usize,
        ancestors: &mut Vec<PathBuf>,
    ) -> FsResult<FileTreeNode> {
        // Follows symlinks; a dangling link is listed as a file.
        let is_dir = fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            self.build_dir(path, depth, ancestors)
        } else {
            Ok(FileTreeNode::file(node_name(path), display_path(path)))
        }
    }

    fn build_dir(
        &self,
        path: &Path,
        depth: usize,
        ancestors: &mut Vec<PathBuf>,
    ) -> FsResult<FileTreeNode> {
        let name = node_name(path);
        let shown = display_path(path);

        if depth >= self.max_depth {
            tracing::debug!(path = %shown, depth, "max depth reached, not descending");
            return Ok(FileTreeNode::directory(name, shown, Vec::new()));
        }

        // A symlink back into the current branch would otherwise be walked
        // again once per link at every level.
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if ancestors.contains(&canonical) {
            tracing::debug!(path = %shown, "directory cycle, not descending");
            return Ok(FileTreeNode::directory(name, shown, Vec::new()));
        }

        let entries = match self.list_entries(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                tracing::debug!(path = %shown, "permission denied, listing as empty");
                return Ok(FileTreeNode::directory(name, shown, Vec::new()));
            }
            Err(e) => return Err(FsError::from_io(path, e)),
        };

        ancestors.push(canonical);
        let children = entries
            .iter()
            .map(|(_, child)| self.build_node(child, depth + 1, ancestors))
            .collect::<FsResult<Vec<_>>>();
        ancestors.pop();
        let children = children?;

        Ok(FileTreeNode::directory(name, shown, children))
    }

    /// Returns the visible entries of `dir` as `(name, path)`, sorted by name.
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_excluded(&name) {
                continue;
            }
            entries.push((name, dir.join(entry.file_name())));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

fn node_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_path(path))
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
