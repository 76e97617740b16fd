//! Plain-text side-by-side rendering of a compare result.
//!
//! Each row is `LEFT_NO left-text MARKER RIGHT_NO right-text`, with the
//! marker column using the classic `sdiff` glyphs: blank for equal lines,
//! `|` for replaced, `<` for deleted and `>` for inserted.

use filecmp_core::{DiffKind, DiffLine, DiffStats};

const GUTTER: usize = 5;
/// Two gutters, the marker and the four separating spaces.
const FIXED_COLUMNS: usize = 2 * GUTTER + 5;
const MIN_TEXT_COLUMN: usize = 8;

fn marker(kind: DiffKind) -> char {
    match kind {
        DiffKind::Equal => ' ',
        DiffKind::Replace => '|',
        DiffKind::Delete => '<',
        DiffKind::Insert => '>',
    }
}

/// Width of each text column for a total line width of `width`.
fn text_column(width: usize) -> usize {
    (width.saturating_sub(FIXED_COLUMNS) / 2).max(MIN_TEXT_COLUMN)
}

/// Strips the line terminator, expands tabs and cuts to `max` characters.
fn cell(content: Option<&str>, max: usize) -> String {
    content
        .unwrap_or("")
        .trim_end_matches(['\n', '\r'])
        .replace('\t', "    ")
        .chars()
        .take(max)
        .collect()
}

fn gutter(number: Option<u32>) -> String {
    number.map(|n| n.to_string()).unwrap_or_default()
}

/// Renders `rows` in two columns that fit within `width` characters.
pub fn side_by_side(rows: &[DiffLine], width: usize) -> String {
    let column = text_column(width);
    let mut out = String::new();
    for row in rows {
        let left = cell(row.left_content.as_deref(), column);
        let right = cell(row.right_content.as_deref(), column);
        let line = format!(
            "{:>gutter_width$} {left:<column$} {} {:>gutter_width$} {right}",
            gutter(row.left_line_number),
            marker(row.kind),
            gutter(row.right_line_number),
            gutter_width = GUTTER,
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// One-line summary, e.g. `2 equal, 1 replaced, 0 deleted, 1 inserted`.
pub fn summary(stats: &DiffStats) -> String {
    format!(
        "{} equal, {} replaced, {} deleted, {} inserted",
        stats.equal, stats.replace, stats.delete, stats.insert
    )
}
