//! Row layout and caret arithmetic for the InputBox.
//!
//! The buffer is hard-wrapped at the inner width by display columns, so a
//! byte offset maps to exactly one (row, column) cell. Everything here is pure
//! and takes the buffer explicitly.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible rows before internal scrolling kicks in
pub(super) const MAX_VISIBLE_ROWS: u16 = 5;
/// Offset from area edge to the first content cell (border + padding)
pub(super) const CONTENT_OFFSET_X: u16 = 2;

/// One visual row: a byte range of the buffer, excluding any `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Row {
    pub start: usize,
    pub end: usize,
}

/// Inner content width for an outer area width. 0 when too narrow.
pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Splits `text` into rows of at most `width` display columns.
/// Always returns at least one row; a trailing `\n` yields a final empty row.
pub(super) fn rows(text: &str, width: u16) -> Vec<Row> {
    let width = usize::from(width.max(1));
    let mut out = Vec::new();
    let mut line_start = 0;

    for line in text.split('\n') {
        let mut row_start = line_start;
        let mut row_width = 0;
        for (i, c) in line.char_indices() {
            let w = c.width().unwrap_or(0);
            if row_width + w > width && row_width > 0 {
                out.push(Row {
                    start: row_start,
                    end: line_start + i,
                });
                row_start = line_start + i;
                row_width = 0;
            }
            row_width += w;
        }
        out.push(Row {
            start: row_start,
            end: line_start + line.len(),
        });
        line_start += line.len() + 1;
    }
    out
}

/// Whether `rows[idx]` continues onto the next row without a newline.
pub(super) fn is_soft_wrapped(rows: &[Row], idx: usize) -> bool {
    rows.get(idx + 1)
        .is_some_and(|next| rows.get(idx).is_some_and(|row| next.start == row.end))
}

/// Row index and display column of the caret at byte `pos`.
///
/// A caret at the seam of a soft wrap is shown at the start of the next row.
pub(super) fn caret_cell(text: &str, rows: &[Row], pos: usize) -> (usize, u16) {
    for (idx, row) in rows.iter().enumerate() {
        if pos < row.start || pos > row.end {
            continue;
        }
        if pos == row.end && is_soft_wrapped(rows, idx) {
            continue;
        }
        return (idx, text[row.start..pos].width() as u16);
    }
    (rows.len().saturating_sub(1), 0)
}

/// Byte offset in `row` closest to display column `col` (never past the row end).
pub(super) fn offset_at_column(text: &str, row: Row, col: u16) -> usize {
    let mut acc = 0u16;
    for (i, c) in text[row.start..row.end].char_indices() {
        if acc >= col {
            return row.start + i;
        }
        acc += c.width().unwrap_or(0) as u16;
    }
    row.end
}

pub(super) fn prev_char(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start of the word before `pos`, readline `backward-word` style.
pub(super) fn prev_word(text: &str, pos: usize) -> usize {
    let before = &text[..pos];
    let trimmed = before.trim_end_matches(|c: char| !is_word_char(c));
    trimmed
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

/// End of the word after `pos`, readline `forward-word` style.
pub(super) fn next_word(text: &str, pos: usize) -> usize {
    let after = &text[pos..];
    let skip = after.len() - after.trim_start_matches(|c: char| !is_word_char(c)).len();
    after[skip..]
        .char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, _)| pos + skip + i)
        .unwrap_or(text.len())
}
