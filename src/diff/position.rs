//! Cursor-to-file coordinate mapping.
//!
//! Translates a flat byte offset in rendered diff text into a `(file, row,
//! col)` location in the post-image file, working in two steps: hunk-relative
//! row/col first, then the real b-side row via the running line count. Every
//! step is best-effort; a cursor on a deleted line still produces the most
//! plausible nearby location since "jump to file" must always land somewhere.

use super::Region;
use super::document::{DiffDocument, Hunk};

/// Classification of one hunk content line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Addition,
    Deletion,
}

/// One content line with its running b-side line number.
///
/// The b number does not advance on deletion lines; those have no counterpart
/// in the destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine<'a> {
    pub kind: LineKind,
    pub content: &'a str,
    pub b: u32,
}

/// Where a cursor position lands in the real file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTo {
    pub commit_hash: Option<String>,
    pub filename: String,
    pub row: u32,
    pub col: u32,
}

/// Split a hunk into classified lines with b-side numbers.
///
/// Returns `None` when the hunk header carries no parseable b start.
pub fn counted_lines<'a>(text: &'a str, hunk: &Hunk) -> Option<Vec<HunkLine<'a>>> {
    let mut b = hunk.b_start?;
    let content = hunk.content_region();
    let mut lines = Vec::new();
    for raw in text[content.start..content.end].lines() {
        let (kind, content) = match raw.as_bytes().first() {
            Some(b'-') => (LineKind::Deletion, &raw[1..]),
            Some(b'+') => (LineKind::Addition, &raw[1..]),
            Some(b' ') => (LineKind::Context, &raw[1..]),
            _ => (LineKind::Context, raw),
        };
        lines.push(HunkLine { kind, content, b });
        if kind != LineKind::Deletion {
            b += 1;
        }
    }
    Some(lines)
}

/// Snap an offset back to the nearest char boundary at or before it, so
/// cursors landing mid-way into a multibyte char never split it.
fn clamp_to_char_boundary(text: &str, pt: usize) -> usize {
    let mut pt = pt.min(text.len());
    while !text.is_char_boundary(pt) {
        pt -= 1;
    }
    pt
}

/// 0-based (row, col) of a byte offset in `text`.
pub fn row_col(text: &str, pt: usize) -> (usize, usize) {
    let pt = clamp_to_char_boundary(text, pt);
    let before = &text[..pt];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (before.matches('\n').count(), pt - line_start)
}

/// The line containing `pt`, without its trailing newline.
pub fn line_bounds(text: &str, pt: usize) -> Region {
    let pt = clamp_to_char_boundary(text, pt);
    let start = text[..pt].rfind('\n').map_or(0, |i| i + 1);
    let end = text[pt..].find('\n').map_or(text.len(), |i| pt + i);
    Region::new(start, end)
}

fn line_indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Row/col of `pt` relative to the hunk's header line.
///
/// Column 0 is the diff marker char (`+`/`-`/space) which has no analog in
/// the real file, so the column is pinned to 1.
pub fn relative_rowcol(text: &str, hunk: &Hunk, pt: usize) -> (usize, usize) {
    let (head_row, _) = row_col(text, hunk.region.start);
    let (pt_row, col) = row_col(text, pt);
    (pt_row.saturating_sub(head_row), col.max(1))
}

/// Translate a hunk-relative row/col into a b-side row/col.
pub fn real_rowcol(lines: &[HunkLine<'_>], relative: (usize, usize)) -> Option<(u32, u32)> {
    if lines.is_empty() {
        return None;
    }
    let (mut row, mut col) = relative;

    // On the '@@ ..' header line itself, pretend to be on the first visible
    // line with some content instead.
    if row == 0 {
        row = lines
            .iter()
            .position(|l| l.kind != LineKind::Deletion && !l.content.trim().is_empty())
            .map_or(1, |i| i + 1);
        col = 1;
    }

    let line = lines.get(row - 1)?;

    // Happy path: the cursor is on a line present on the b side.
    if line.kind != LineKind::Deletion {
        return Some((line.b, col as u32));
    }

    // The cursor is on a deleted line we cannot jump to. Pick the next line
    // guaranteed to be available, if any.
    for next in &lines[row..] {
        match next.kind {
            LineKind::Addition => {
                return Some((next.b, col.min(next.content.len() + 1) as u32));
            }
            LineKind::Context => {
                // Only a contextual line follows. Choose this or the previous
                // line depending on the indentation; the latter choice is a
                // heuristic, not a guarantee.
                let indentation = line_indentation(next.content);
                return if indentation == line_indentation(line.content) {
                    Some((next.b, indentation as u32 + 1))
                } else {
                    Some((line.b.saturating_sub(1).max(1), 1))
                };
            }
            LineKind::Deletion => {}
        }
    }
    Some((line.b, 1))
}

/// Map a cursor offset in rendered diff text to a real file location.
///
/// `word_diff_regions` carries the removed-region list of the last render
/// when the view is in word-diff mode; pass `None` for a plain diff.
pub fn map_cursor_to_file_location(
    doc: &DiffDocument<'_>,
    pt: usize,
    word_diff_regions: Option<&[Region]>,
) -> Option<JumpTo> {
    match word_diff_regions {
        Some(removed) => jump_position_word_diff(doc, pt, removed),
        None => jump_position(doc, pt),
    }
}

fn jump_target(doc: &DiffDocument<'_>, hunk: &Hunk, row: u32, col: u32) -> Option<JumpTo> {
    let header = doc.file_header_for(hunk)?;
    let filename = header
        .to_path
        .clone()
        .or_else(|| header.from_path.clone())?;
    let commit_hash = doc.commit_for(hunk).map(|c| c.hash.clone());
    Some(JumpTo {
        commit_hash,
        filename,
        row,
        col,
    })
}

fn jump_position(doc: &DiffDocument<'_>, pt: usize) -> Option<JumpTo> {
    let (_, hunk) = doc.locate(pt)?;
    let lines = counted_lines(doc.text, hunk)?;
    let (row, col) = real_rowcol(&lines, relative_rowcol(doc.text, hunk, pt))?;
    jump_target(doc, hunk, row, col)
}

/// Word-diff variant: deletions are rendered inline, so the b row is the
/// content row minus the count of fully-removed lines before the cursor, and
/// the column shifts left by the removed chars earlier on the same line.
fn jump_position_word_diff(
    doc: &DiffDocument<'_>,
    pt: usize,
    removed_regions: &[Region],
) -> Option<JumpTo> {
    let (_, hunk) = doc.locate(pt)?;
    let content_start = hunk.content_region().start;

    // Removed regions in this hunk up to the cursor; a region the cursor is
    // inside of is shortened up to the cursor.
    let removed_before: Vec<Region> = removed_regions
        .iter()
        .filter(|r| content_start <= r.start && r.start < pt)
        .map(|r| Region::new(r.start, r.end.min(pt)))
        .collect();

    // Completely removed lines, excluding one the cursor sits at the very
    // end of.
    let removed_lines_before = removed_before
        .iter()
        .filter(|r| **r == line_bounds(doc.text, r.start) && r.end != pt)
        .count();

    let line_start = line_bounds(doc.text, pt).start;
    let removed_chars_before: usize = removed_before
        .iter()
        .filter(|r| line_start <= r.start && r.start < pt)
        .map(Region::len)
        .sum();

    let (content_row, _) = row_col(doc.text, content_start);
    let (pt_row, pt_col) = row_col(doc.text, pt);
    // A cursor in the hunk header counts as (0, 0) in the hunk content.
    let (rel_row, col) = if pt_row < content_row {
        (0, 0)
    } else {
        (pt_row - content_row, pt_col)
    };

    let b_start = hunk.b_start?;
    let row = (b_start as i64 + rel_row as i64 - removed_lines_before as i64).max(1) as u32;
    let col = (col as i64 + 1 - removed_chars_before as i64).max(1) as u32;
    jump_target(doc, hunk, row, col)
}
