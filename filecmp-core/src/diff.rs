//! Diff normalization.
//!
//! Walks a raw edit script and produces the `DiffLine` rows shown to callers:
//! per-side 1-based line numbers plus a `replace` row fusing a deleted line
//! with the inserted line that takes its place.
//!
//! Pairing is greedy and non-chaining. A run of deletions directly followed by
//! a run of insertions yields exactly one `replace` (first deleted line with
//! first inserted line); the rest of the run is emitted as standalone `delete`
//! rows, then standalone `insert` rows.

use crate::align::{align, split_lines, AlignAlgorithm, RawEditOp};
use crate::types::DiffLine;

/// Independent per-side line counters. Each starts at 0 and is bumped before
/// use, so the first consumed line of a side is numbered 1.
#[derive(Debug, Default)]
struct LineCounters {
    left: u32,
    right: u32,
}

impl LineCounters {
    fn next_left(&mut self) -> u32 {
        self.left += 1;
        self.left
    }

    fn next_right(&mut self) -> u32 {
        self.right += 1;
        self.right
    }
}

/// Converts a raw edit script into normalized diff rows.
///
/// Total over every input: an empty script yields no rows, a left-only script
/// yields only `delete` rows, a right-only script only `insert` rows. Rows are
/// emitted in script order except that the first inserted line of a
/// delete/insert run is pulled forward into the `replace` row.
pub fn normalize(ops: &[RawEditOp<'_>]) -> Vec<DiffLine> {
    let mut rows = Vec::with_capacity(ops.len());
    let mut counters = LineCounters::default();
    let mut i = 0;

    while i < ops.len() {
        match ops[i] {
            RawEditOp::Keep(line) => {
                let left = counters.next_left();
                let right = counters.next_right();
                rows.push(DiffLine::equal(left, right, line));
                i += 1;
            }
            RawEditOp::RightOnly(line) => {
                rows.push(DiffLine::insert(counters.next_right(), line));
                i += 1;
            }
            RawEditOp::LeftOnly(_) => {
                let deleted_end = run_end(ops, i, RawEditOp::is_left_only);
                let inserted_end = run_end(ops, deleted_end, RawEditOp::is_right_only);
                emit_change_run(
                    &ops[i..deleted_end],
                    &ops[deleted_end..inserted_end],
                    &mut counters,
                    &mut rows,
                );
                i = inserted_end;
            }
        }
    }

    rows
}

fn run_end<'a>(
    ops: &[RawEditOp<'a>],
    start: usize,
    belongs: impl Fn(&RawEditOp<'a>) -> bool,
) -> usize {
    ops[start..]
        .iter()
        .position(|op| !belongs(op))
        .map_or(ops.len(), |offset| start + offset)
}

/// `deleted` is non-empty; `inserted` may be empty.
fn emit_change_run(
    deleted: &[RawEditOp<'_>],
    inserted: &[RawEditOp<'_>],
    counters: &mut LineCounters,
    rows: &mut Vec<DiffLine>,
) {
    let (deleted_rest, inserted_rest) = match (deleted.split_first(), inserted.split_first()) {
        (Some((old, deleted_rest)), Some((new, inserted_rest))) => {
            let left = counters.next_left();
            let right = counters.next_right();
            rows.push(DiffLine::replace(left, right, old.line(), new.line()));
            (deleted_rest, inserted_rest)
        }
        _ => (deleted, inserted),
    };

    for op in deleted_rest {
        rows.push(DiffLine::delete(counters.next_left(), op.line()));
    }
    for op in inserted_rest {
        rows.push(DiffLine::insert(counters.next_right(), op.line()));
    }
}

/// Aligns and normalizes two already-split line sequences.
pub fn diff_lines(left: &[&str], right: &[&str], algorithm: AlignAlgorithm) -> Vec<DiffLine> {
    normalize(&align(left, right, algorithm))
}

/// Splits both texts into lines, then aligns and normalizes them.
pub fn diff_texts(left: &str, right: &str, algorithm: AlignAlgorithm) -> Vec<DiffLine> {
    diff_lines(&split_lines(left), &split_lines(right), algorithm)
}
