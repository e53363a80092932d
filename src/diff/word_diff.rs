//! Inline word-diff marker stripping.
//!
//! `git diff --word-diff-regex=..` marks changed tokens inline as `{+text+}`
//! and `[-text-]`. For display we strip the markers and keep two region lists
//! for separate styling. Each substitution shortens the text by exactly the
//! four delimiter chars, so recorded offsets shift left by four per prior
//! match, plus the caller-supplied base offset of the rendered text.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Region;

static WORD_DIFF_MARKERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\+(.*?)\+\}|\[-(.*?)-\]").expect("marker pattern is valid"));

/// Replace `{+..+}` / `[-..-]` markers with their bare inner text.
///
/// The returned regions index into the *output* text (shifted by
/// `global_offset`) and are in left-to-right document order.
pub fn postprocess_word_diff(
    text: &str,
    global_offset: usize,
) -> (String, Vec<Region>, Vec<Region>) {
    let mut added_regions = Vec::new();
    let mut removed_regions = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in WORD_DIFF_MARKERS_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let added = caps.get(1);
        let inner = added
            .or_else(|| caps.get(2))
            .map(|g| g.as_str())
            .unwrap_or_default();

        // Match offsets are based on the original input; on each prior match
        // the text got shorter by 4 chars.
        let matches_so_far = added_regions.len() + removed_regions.len();
        let offset = global_offset + m.start() - matches_so_far * 4;
        let region = Region::new(offset, offset + inner.len());
        if added.is_some() {
            added_regions.push(region);
        } else {
            removed_regions.push(region);
        }

        out.push_str(&text[last..m.start()]);
        out.push_str(inner);
        last = m.end();
    }
    out.push_str(&text[last..]);

    (out, added_regions, removed_regions)
}
