//! Structural model of unified-diff text.
//!
//! A [`DiffDocument`] is parsed fresh from the rendered text on every refresh
//! and discarded afterwards; git output is the single source of truth, so the
//! document is never mutated in place. Parsing is total: malformed input
//! degrades to an empty or partial document, and "no hunk under the cursor"
//! is a routine result, not an error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Region;

/// Extracts the b-side start line from a hunk header, e.g. the `686` in
/// `@@ -685,8 +686,14 @@ fn main() {`.
static HUNK_B_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ [^+\n]*\+(\d+)").expect("hunk header pattern is valid"));

/// File references in header form:
/// `--- a/path`, `+++ b/path`, `diff --git a/path b/path`.
static FILE_HEADER_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:--- a/|\+{3} b/|diff .+b/)(\S[^|\n]*?)$")
        .expect("file header pattern is valid")
});

/// File references in diffstat form: ` path/to/file | 3 +--`.
static STAT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s(\S[^|\n]*?)\s+\|\s+\d+\s").expect("stat line pattern is valid")
});

/// Extract the filename a line refers to, if it is one of the clickable
/// textual forms emitted by `git diff`/`git show` (header lines and diffstat
/// summary lines).
pub fn file_reference(line: &str) -> Option<&str> {
    if let Some(caps) = FILE_HEADER_REF_RE.captures(line) {
        return caps.get(1).map(|m| m.as_str());
    }
    STAT_LINE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A `commit <hash>` block in log-style diff output.
///
/// Present only when the diff is rendered in a multi-commit context
/// (`git log -p`, `git show`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHeader {
    pub region: Region,
    pub hash: String,
}

/// The `diff --git` block for one file, up to its first hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub region: Region,
    /// a-side path, `None` for added files (`--- /dev/null`)
    pub from_path: Option<String>,
    /// b-side path, `None` for deleted files (`+++ /dev/null`)
    pub to_path: Option<String>,
}

/// One `@@` header line plus the content lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub region: Region,
    header_end: usize,
    /// b-side starting line number from the header, `None` if unparseable
    pub b_start: Option<u32>,
}

impl Hunk {
    /// The `@@ ...` line, without its trailing newline.
    pub fn header_region(&self) -> Region {
        Region::new(self.region.start, self.header_end)
    }

    /// Everything after the header line, up to the next section boundary.
    pub fn content_region(&self) -> Region {
        Region::new((self.header_end + 1).min(self.region.end), self.region.end)
    }
}

enum BoundaryKind {
    Commit,
    File,
    Hunk,
}

/// Queryable tree of commit headers, file headers and hunks over one piece
/// of diff text. Borrows the text; build, query, discard.
#[derive(Debug)]
pub struct DiffDocument<'a> {
    pub text: &'a str,
    pub commits: Vec<CommitHeader>,
    pub file_headers: Vec<FileHeader>,
    pub hunks: Vec<Hunk>,
}

impl<'a> DiffDocument<'a> {
    /// Split diff text into sections.
    ///
    /// Boundary lines are recognized in document order: `commit `, `diff `
    /// and `@@ `. A section spans from its boundary line to the next boundary
    /// line of any kind, or to the end of the input.
    pub fn parse(text: &'a str) -> Self {
        let mut boundaries: Vec<(usize, usize, BoundaryKind)> = Vec::new();
        let mut pos = 0;
        for line in text.split_inclusive('\n') {
            let start = pos;
            pos += line.len();
            let body = line.strip_suffix('\n').unwrap_or(line);
            let kind = if body.starts_with("commit ") {
                BoundaryKind::Commit
            } else if body.starts_with("diff ") {
                BoundaryKind::File
            } else if body.starts_with("@@ ") {
                BoundaryKind::Hunk
            } else {
                continue;
            };
            boundaries.push((start, start + body.len(), kind));
        }

        let mut commits = Vec::new();
        let mut file_headers = Vec::new();
        let mut hunks = Vec::new();

        for (i, (start, line_end, kind)) in boundaries.iter().enumerate() {
            let end = boundaries.get(i + 1).map_or(text.len(), |next| next.0);
            let region = Region::new(*start, end);
            let line = &text[*start..*line_end];
            match kind {
                BoundaryKind::Commit => {
                    let hash = line
                        .trim_start_matches("commit ")
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    commits.push(CommitHeader { region, hash });
                }
                BoundaryKind::File => {
                    let (from_path, to_path) = parse_paths(&text[*start..end]);
                    file_headers.push(FileHeader {
                        region,
                        from_path,
                        to_path,
                    });
                }
                BoundaryKind::Hunk => {
                    let b_start = HUNK_B_START_RE
                        .captures(line)
                        .and_then(|caps| caps.get(1))
                        .and_then(|m| m.as_str().parse().ok());
                    hunks.push(Hunk {
                        region,
                        header_end: *line_end,
                        b_start,
                    });
                }
            }
        }

        DiffDocument {
            text,
            commits,
            file_headers,
            hunks,
        }
    }

    /// The innermost (file header, hunk) pair whose hunk contains `pt`.
    ///
    /// `None` when `pt` falls outside any hunk, e.g. on a file header line or
    /// a blank separator. Callers treat that as "not within a hunk".
    pub fn locate(&self, pt: usize) -> Option<(&FileHeader, &Hunk)> {
        let hunk = self.hunks.iter().find(|h| h.region.contains(pt))?;
        let header = self.file_header_for(hunk)?;
        Some((header, hunk))
    }

    /// The file header a hunk belongs to.
    pub fn file_header_for(&self, hunk: &Hunk) -> Option<&FileHeader> {
        self.file_headers
            .iter()
            .rev()
            .find(|h| h.region.end <= hunk.region.start)
    }

    /// The commit header a hunk belongs to, in log-style input.
    pub fn commit_for(&self, hunk: &Hunk) -> Option<&CommitHeader> {
        self.commits
            .iter()
            .rev()
            .find(|c| c.region.start <= hunk.region.start)
    }

    pub fn slice(&self, region: Region) -> &'a str {
        &self.text[region.start..region.end]
    }
}

/// Pull the a-side and b-side paths out of a file header block.
/// `/dev/null` maps to `None`.
fn parse_paths(block: &str) -> (Option<String>, Option<String>) {
    let mut from_path = None;
    let mut to_path = None;
    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("--- ") {
            from_path = rest.strip_prefix("a/").map(str::to_string);
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            to_path = rest.strip_prefix("b/").map(str::to_string);
        }
    }
    (from_path, to_path)
}
