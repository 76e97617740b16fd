//! Line splitting and sequence alignment.
//!
//! The aligner turns two line sequences into a raw edit script: every line of
//! both inputs appears exactly once, tagged as kept, left-only or right-only.
//! Alignment is delegated to `similar`; lines compare by exact string equality,
//! trailing newline included.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag};

/// One entry of the raw edit script, borrowing the line it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEditOp<'a> {
    Keep(&'a str),
    LeftOnly(&'a str),
    RightOnly(&'a str),
}

impl<'a> RawEditOp<'a> {
    pub fn line(&self) -> &'a str {
        match *self {
            RawEditOp::Keep(line) | RawEditOp::LeftOnly(line) | RawEditOp::RightOnly(line) => line,
        }
    }

    pub fn is_left_only(&self) -> bool {
        matches!(self, RawEditOp::LeftOnly(_))
    }

    pub fn is_right_only(&self) -> bool {
        matches!(self, RawEditOp::RightOnly(_))
    }
}

/// Alignment strategies exposed through configuration.
///
/// All of them are deterministic; they differ only in which of several minimal
/// alignments they prefer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl AlignAlgorithm {
    pub const fn to_similar(self) -> Algorithm {
        match self {
            AlignAlgorithm::Myers => Algorithm::Myers,
            AlignAlgorithm::Patience => Algorithm::Patience,
            AlignAlgorithm::Lcs => Algorithm::Lcs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlignAlgorithm::Myers => "myers",
            AlignAlgorithm::Patience => "patience",
            AlignAlgorithm::Lcs => "lcs",
        }
    }
}

impl FromStr for AlignAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "myers" => Ok(AlignAlgorithm::Myers),
            "patience" => Ok(AlignAlgorithm::Patience),
            "lcs" => Ok(AlignAlgorithm::Lcs),
            other => Err(format!(
                "unknown diff algorithm '{other}' (expected myers, patience or lcs)"
            )),
        }
    }
}

/// Splits text into lines, each keeping its trailing `\n`.
///
/// A final line without a newline is returned as-is; empty text yields no lines.
/// `\r\n` endings are not normalized, so `"a\r\n"` and `"a\n"` are different lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Aligns two line sequences into a raw edit script.
///
/// Within a replaced region all left-only lines are emitted before the
/// right-only lines, so a substitution shows up as a delete run directly
/// followed by an insert run.
pub fn align<'a>(
    left: &[&'a str],
    right: &[&'a str],
    algorithm: AlignAlgorithm,
) -> Vec<RawEditOp<'a>> {
    let ops = similar::capture_diff_slices(algorithm.to_similar(), left, right);
    let mut script = Vec::with_capacity(left.len().max(right.len()));

    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                script.extend(left[old_range].iter().copied().map(RawEditOp::Keep));
            }
            DiffTag::Delete => {
                script.extend(left[old_range].iter().copied().map(RawEditOp::LeftOnly));
            }
            DiffTag::Insert => {
                script.extend(right[new_range].iter().copied().map(RawEditOp::RightOnly));
            }
            DiffTag::Replace => {
                script.extend(left[old_range].iter().copied().map(RawEditOp::LeftOnly));
                script.extend(right[new_range].iter().copied().map(RawEditOp::RightOnly));
            }
        }
    }

    script
}
