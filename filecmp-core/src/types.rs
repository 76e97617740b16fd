use serde::{Deserialize, Serialize};

/// Classification of a single normalized diff row.
///
/// Serialized as the lowercase literal tag (`"equal"`, `"insert"`, `"delete"`,
/// `"replace"`) expected by rendering clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// One row of a side-by-side diff.
///
/// Line numbers are 1-based and counted independently per side. Absent sides
/// serialize as `null` rather than being omitted, so positional pairing is
/// preserved for clients that render both columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(rename = "line_number_left")]
    pub left_line_number: Option<u32>,
    #[serde(rename = "line_number_right")]
    pub right_line_number: Option<u32>,
    /// Left line including its trailing newline, if it had one.
    #[serde(rename = "content_left")]
    pub left_content: Option<String>,
    #[serde(rename = "content_right")]
    pub right_content: Option<String>,
}

impl DiffLine {
    pub fn equal(left: u32, right: u32, content: &str) -> Self {
        Self {
            kind: DiffKind::Equal,
            left_line_number: Some(left),
            right_line_number: Some(right),
            left_content: Some(content.to_owned()),
            right_content: Some(content.to_owned()),
        }
    }

    pub fn insert(right: u32, content: &str) -> Self {
        Self {
            kind: DiffKind::Insert,
            left_line_number: None,
            right_line_number: Some(right),
            left_content: None,
            right_content: Some(content.to_owned()),
        }
    }

    pub fn delete(left: u32, content: &str) -> Self {
        Self {
            kind: DiffKind::Delete,
            left_line_number: Some(left),
            right_line_number: None,
            left_content: Some(content.to_owned()),
            right_content: None,
        }
    }

    pub fn replace(left: u32, right: u32, left_content: &str, right_content: &str) -> Self {
        Self {
            kind: DiffKind::Replace,
            left_line_number: Some(left),
            right_line_number: Some(right),
            left_content: Some(left_content.to_owned()),
            right_content: Some(right_content.to_owned()),
        }
    }
}

/// Per-kind row counts for a diff, handy for summaries and status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub equal: usize,
    pub insert: usize,
    pub delete: usize,
    pub replace: usize,
}

impl DiffStats {
    pub fn from_lines(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.kind {
                DiffKind::Equal => stats.equal += 1,
                DiffKind::Insert => stats.insert += 1,
                DiffKind::Delete => stats.delete += 1,
                DiffKind::Replace => stats.replace += 1,
            }
            stats
        })
    }

    /// True when every row is `equal` (including the empty diff).
    pub fn is_identical(&self) -> bool {
        self.insert == 0 && self.delete == 0 && self.replace == 0
    }
}

/// A directory-tree entry. `children` is `Some` iff the entry is a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub children: Option<Vec<FileTreeNode>>,
}

impl FileTreeNode {
    pub fn file(name: String, path: String) -> Self {
        Self { name, path, is_directory: false, children: None }
    }

    pub fn directory(name: String, path: String, children: Vec<FileTreeNode>) -> Self {
        Self { name, path, is_directory: true, children: Some(children) }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(FileTreeNode::node_count)
            .sum::<usize>()
    }
}

/// The two paths to compare. Accepts the `file1_path`/`file2_path` keys used
/// by existing clients as well as `path_left`/`path_right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    #[serde(rename = "file1_path", alias = "path_left")]
    pub path_left: String,
    #[serde(rename = "file2_path", alias = "path_right")]
    pub path_right: String,
}

impl CompareRequest {
    pub fn new(path_left: impl Into<String>, path_right: impl Into<String>) -> Self {
        Self { path_left: path_left.into(), path_right: path_right.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareResponse {
    pub file1: String,
    pub file2: String,
    pub diff: Vec<DiffLine>,
    pub stats: DiffStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
    pub path: String,
}

/// Which input of a comparison an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
