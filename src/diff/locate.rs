//! Fuzzy re-discovery of a hunk after the buffer was re-rendered.
//!
//! Changing the context-line count reshuffles the surrounding text, but the
//! hunk *content* lines are byte-identical across renders. We first look for
//! the header line verbatim, then fall back to searching the content while
//! symmetrically stripping one line from each end per attempt. What gets
//! reported is the enclosing hunk's header region in the new buffer, since
//! the header line is the stable "jump to here" anchor.

use super::Region;
use super::document::DiffDocument;

/// Re-find a hunk captured from a stale render inside freshly rendered text.
///
/// `header` is the literal `@@ ..` line; `content_lines` are the hunk's
/// content lines without the header.
pub fn locate_hunk_after_rerender(
    buffer: &str,
    header: &str,
    content_lines: &[&str],
) -> Option<Region> {
    find_literal(buffer, header).or_else(|| fuzzy_search_hunk_content(buffer, content_lines))
}

/// Given a verbatim patch (file header + hunk text), search for its first
/// hunk in `buffer`. Returns the region of the hunk's `@@ ..` line.
pub fn find_hunk_in_text(buffer: &str, patch: &str) -> Option<Region> {
    let doc = DiffDocument::parse(patch);
    let hunk = doc.hunks.first()?;
    let content: Vec<&str> = doc.slice(hunk.content_region()).lines().collect();
    locate_hunk_after_rerender(buffer, doc.slice(hunk.header_region()), &content)
}

fn find_literal(buffer: &str, needle: &str) -> Option<Region> {
    if needle.is_empty() {
        return None;
    }
    buffer
        .find(needle)
        .map(|start| Region::new(start, start + needle.len()))
}

/// Search for the hunk content, shrinking the line list symmetrically until
/// something matches or one line (or nothing) remains.
fn fuzzy_search_hunk_content(buffer: &str, lines: &[&str]) -> Option<Region> {
    let mut lines = lines;
    while !lines.is_empty() {
        let needle = lines.join("\n");
        if let Some(region) = find_literal(buffer, &needle) {
            // Report the enclosing hunk's header, not the content match.
            let doc = DiffDocument::parse(buffer);
            let (_, hunk) = doc.locate(region.start)?;
            return Some(hunk.header_region());
        }
        if lines.len() < 3 {
            break;
        }
        lines = &lines[1..lines.len() - 1];
    }
    None
}
