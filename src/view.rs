//! Render-side configuration and state for a diff view.
//!
//! The view parameters live in an immutable [`DiffViewConfig`] passed into
//! every render; the small mutable remainder (undo history, last cursors,
//! last word-diff regions) lives in [`DiffViewState`], owned by the rendering
//! layer and never consulted by the pure diff core.

use crate::diff::Region;
use crate::diff::word_diff::postprocess_word_diff;

/// Word-diff rendering mode, cycling `Off -> Word -> Char -> Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WordDiffMode {
    #[default]
    Off,
    Word,
    Char,
}

impl WordDiffMode {
    /// The `--word-diff-regex` pattern handed to git, if any.
    pub fn pattern(self) -> Option<&'static str> {
        match self {
            WordDiffMode::Off => None,
            WordDiffMode::Word => {
                Some(r"[a-zA-Z_\-\x80-\xff]+|[^[:space:]]|[\xc0-\xff][\x80-\xbf]+")
            }
            WordDiffMode::Char => Some("."),
        }
    }

    pub fn cycled(self) -> Self {
        match self {
            WordDiffMode::Off => WordDiffMode::Word,
            WordDiffMode::Word => WordDiffMode::Char,
            WordDiffMode::Char => WordDiffMode::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self != WordDiffMode::Off
    }
}

/// Immutable parameters of one diff view.
///
/// Replaced wholesale on every change (toggle, zoom); never mutated while a
/// render is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffViewConfig {
    /// Limit the diff to a single file
    pub file_path: Option<String>,
    /// Show the index instead of the working tree
    pub in_cached_mode: bool,
    pub ignore_whitespace: bool,
    pub word_diff: WordDiffMode,
    /// `--unified=<N>` context line count
    pub context_lines: u32,
    pub base_commit: Option<String>,
    pub target_commit: Option<String>,
    pub show_diffstat: bool,
    /// Read-only views (commit ranges) cannot stage
    pub disable_stage: bool,
}

impl Default for DiffViewConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            in_cached_mode: false,
            ignore_whitespace: false,
            word_diff: WordDiffMode::Off,
            context_lines: 3,
            base_commit: None,
            target_commit: None,
            show_diffstat: true,
            disable_stage: false,
        }
    }
}

impl DiffViewConfig {
    /// A copy with the context line count changed by `amount`, floored at 0.
    pub fn zoomed(&self, amount: i32) -> Self {
        let context_lines = (self.context_lines as i32 + amount).max(0) as u32;
        Self {
            context_lines,
            ..self.clone()
        }
    }

    /// View title, e.g. `DIFF: flake.nix (staged)`.
    pub fn title(&self) -> String {
        let mut parts = vec!["DIFF:".to_string()];
        if let Some(file) = &self.file_path {
            parts.push(basename(file).to_string());
        }
        if self.disable_stage {
            if self.in_cached_mode {
                parts.push(format!("{}..INDEX", self.commit_anchor()));
            } else if let (Some(base), Some(target)) = (&self.base_commit, &self.target_commit) {
                parts.push(format!("{base}..{target}"));
            } else if let Some(base) = self.symmetric_range() {
                parts.push(base.to_string());
            } else {
                parts.push(format!("{}..WORKING DIR", self.commit_anchor()));
            }
        } else if self.in_cached_mode {
            parts.push("(staged)".to_string());
        }
        parts.join(" ")
    }

    /// The banner block shown above the diff text, ending in `\n--\n`.
    pub fn prelude(&self) -> String {
        let mut prelude = String::from("\n");
        if let Some(file) = &self.file_path {
            prelude.push_str(&format!("  FILE: {file}\n"));
        }
        if self.disable_stage {
            if self.in_cached_mode {
                prelude.push_str(&format!("  {}..INDEX\n", self.commit_anchor()));
            } else if let (Some(base), Some(target)) = (&self.base_commit, &self.target_commit) {
                prelude.push_str(&format!("  {base}..{target}\n"));
            } else if let Some(base) = self.symmetric_range() {
                prelude.push_str(&format!("  {base}\n"));
            } else {
                prelude.push_str(&format!("  {}..WORKING DIR\n", self.commit_anchor()));
            }
        } else if self.in_cached_mode {
            prelude.push_str("  STAGED CHANGES (Will commit)\n");
        } else {
            prelude.push_str("  UNSTAGED CHANGES\n");
        }
        if let Some(pattern) = self.word_diff.pattern() {
            prelude.push_str(&format!("  WORD REGEX: {pattern}\n"));
        }
        if self.ignore_whitespace {
            prelude.push_str("  IGNORING WHITESPACE\n");
        }
        prelude.push_str("\n--\n");
        prelude
    }

    /// Argument list for the `git diff` invocation backing this view.
    pub fn diff_args(&self) -> Vec<String> {
        let mut args = vec!["diff".to_string()];
        if self.ignore_whitespace {
            args.push("--ignore-all-space".to_string());
        }
        if let Some(pattern) = self.word_diff.pattern() {
            args.push(format!("--word-diff-regex={pattern}"));
        }
        args.push(format!("--unified={}", self.context_lines));
        if self.show_diffstat {
            args.push("--stat".to_string());
        }
        args.push("--patch".to_string());
        args.push("--no-color".to_string());
        if self.in_cached_mode {
            args.push("--cached".to_string());
        }
        if let Some(commit) = &self.base_commit {
            args.push(commit.clone());
        }
        if let Some(commit) = &self.target_commit {
            args.push(commit.clone());
        }
        if let Some(file) = &self.file_path {
            args.push("--".to_string());
            args.push(file.clone());
        }
        args
    }

    fn commit_anchor(&self) -> &str {
        self.base_commit
            .as_deref()
            .or(self.target_commit.as_deref())
            .unwrap_or_default()
    }

    fn symmetric_range(&self) -> Option<&str> {
        self.base_commit.as_deref().filter(|b| b.contains("..."))
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Flags for the `git apply` call behind stage/unstage/reset.
///
/// Three scenarios:
/// 1. non-cached stage: forward, index only
/// 2. non-cached reset: reverse, index and working tree
/// 3. cached unstage: reverse, index only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyFlags {
    pub reverse: bool,
    pub cached: bool,
    pub unidiff_zero: bool,
}

impl ApplyFlags {
    pub fn for_stage_or_reset(config: &DiffViewConfig, reset: bool) -> Self {
        Self {
            reverse: reset || config.in_cached_mode,
            cached: config.in_cached_mode || !reset,
            unidiff_zero: config.context_lines == 0,
        }
    }

    /// The undo form: same patch, reverse flag flipped.
    pub fn inverted(self) -> Self {
        Self {
            reverse: !self.reverse,
            ..self
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["apply".to_string()];
        if self.reverse {
            args.push("-R".to_string());
        }
        if self.cached {
            args.push("--cached".to_string());
        }
        if self.unidiff_zero {
            args.push("--unidiff-zero".to_string());
        }
        args.push("-".to_string());
        args
    }
}

/// One applied patch, recorded for undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    pub flags: ApplyFlags,
    pub patch: String,
    pub cursors: Vec<usize>,
    pub in_cached_mode: bool,
}

impl PatchRecord {
    pub fn inverted(&self) -> Self {
        Self {
            flags: self.flags.inverted(),
            ..self.clone()
        }
    }
}

/// Mutable per-view leftovers owned by the rendering layer.
#[derive(Debug, Clone, Default)]
pub struct DiffViewState {
    pub history: Vec<PatchRecord>,
    pub last_cursors: Vec<usize>,
    /// Patch text of the most recent stage/unstage, for cursor restoration
    pub just_hunked: String,
    pub raw_diff: String,
    pub last_render: String,
    pub added_regions: Vec<Region>,
    pub removed_regions: Vec<Region>,
}

/// Display text plus the word-diff styling regions for one render cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiff {
    pub text: String,
    pub added_regions: Vec<Region>,
    pub removed_regions: Vec<Region>,
}

/// Compose prelude and diff text; in word-diff mode the inline markers are
/// stripped and turned into regions offset by the prelude length.
pub fn render(config: &DiffViewConfig, raw_diff: &str) -> RenderedDiff {
    let prelude = config.prelude();
    if config.word_diff.is_on() {
        let (diff_text, added_regions, removed_regions) =
            postprocess_word_diff(raw_diff, prelude.len());
        RenderedDiff {
            text: prelude + &diff_text,
            added_regions,
            removed_regions,
        }
    } else {
        RenderedDiff {
            text: prelude + raw_diff,
            added_regions: Vec::new(),
            removed_regions: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn default_prelude_shows_unstaged() {
        let config = DiffViewConfig::default();
        assert_eq!(config.prelude(), "\n  UNSTAGED CHANGES\n\n--\n");
        assert_eq!(config.title(), "DIFF:");
    }

    #[test]
    fn cached_prelude_and_title() {
        let config = DiffViewConfig {
            in_cached_mode: true,
            file_path: Some("src/flake.nix".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.prelude(),
            "\n  FILE: src/flake.nix\n  STAGED CHANGES (Will commit)\n\n--\n"
        );
        assert_eq!(config.title(), "DIFF: flake.nix (staged)");
    }

    #[test]
    fn commit_range_prelude() {
        let config = DiffViewConfig {
            disable_stage: true,
            base_commit: Some("abc123".to_string()),
            target_commit: Some("def456".to_string()),
            ..Default::default()
        };
        assert_eq!(config.prelude(), "\n  abc123..def456\n\n--\n");
        assert_eq!(config.title(), "DIFF: abc123..def456");
    }

    #[test]
    fn symmetric_range_prelude() {
        let config = DiffViewConfig {
            disable_stage: true,
            base_commit: Some("main...topic".to_string()),
            ..Default::default()
        };
        assert_eq!(config.prelude(), "\n  main...topic\n\n--\n");
    }

    #[test]
    fn banners_for_word_diff_and_whitespace() {
        let config = DiffViewConfig {
            word_diff: WordDiffMode::Char,
            ignore_whitespace: true,
            ..Default::default()
        };
        let prelude = config.prelude();
        assert!(prelude.contains("  WORD REGEX: .\n"));
        assert!(prelude.contains("  IGNORING WHITESPACE\n"));
        assert!(prelude.ends_with("\n--\n"));
    }

    #[test]
    fn default_diff_args() {
        let config = DiffViewConfig::default();
        insta::assert_snapshot!(
            config.diff_args().join(" "),
            @"diff --unified=3 --stat --patch --no-color"
        );
    }

    #[test]
    fn cached_single_file_diff_args() {
        let config = DiffViewConfig {
            in_cached_mode: true,
            show_diffstat: false,
            context_lines: 0,
            file_path: Some("gtk.nix".to_string()),
            ..Default::default()
        };
        insta::assert_snapshot!(
            config.diff_args().join(" "),
            @"diff --unified=0 --patch --no-color --cached -- gtk.nix"
        );
    }

    #[test]
    fn zoom_floors_at_zero() {
        let config = DiffViewConfig::default();
        assert_eq!(config.zoomed(-5).context_lines, 0);
        assert_eq!(config.zoomed(2).context_lines, 5);
        assert_eq!(config.zoomed(0), config);
    }

    #[test]
    fn word_diff_mode_cycles() {
        let mut mode = WordDiffMode::Off;
        assert!(!mode.is_on());
        mode = mode.cycled();
        assert_eq!(mode, WordDiffMode::Word);
        mode = mode.cycled();
        assert_eq!(mode, WordDiffMode::Char);
        assert_eq!(mode.cycled(), WordDiffMode::Off);
    }

    #[test]
    fn stage_flags_forward_index_only() {
        let config = DiffViewConfig::default();
        let flags = ApplyFlags::for_stage_or_reset(&config, false);
        assert_eq!(flags.args(), vec!["apply", "--cached", "-"]);
    }

    #[test]
    fn reset_flags_reverse_worktree_and_index() {
        let config = DiffViewConfig::default();
        let flags = ApplyFlags::for_stage_or_reset(&config, true);
        assert_eq!(flags.args(), vec!["apply", "-R", "-"]);
    }

    #[test]
    fn unstage_flags_reverse_index_only() {
        let config = DiffViewConfig {
            in_cached_mode: true,
            ..Default::default()
        };
        let flags = ApplyFlags::for_stage_or_reset(&config, false);
        assert_eq!(flags.args(), vec!["apply", "-R", "--cached", "-"]);
    }

    #[test]
    fn zero_context_adds_unidiff_zero() {
        let config = DiffViewConfig {
            context_lines: 0,
            ..Default::default()
        };
        let flags = ApplyFlags::for_stage_or_reset(&config, false);
        assert!(flags.args().contains(&"--unidiff-zero".to_string()));
    }

    #[test]
    fn inverted_record_flips_only_reverse() {
        let record = PatchRecord {
            flags: ApplyFlags {
                reverse: false,
                cached: true,
                unidiff_zero: false,
            },
            patch: "patch".to_string(),
            cursors: vec![42],
            in_cached_mode: false,
        };
        let inverse = record.inverted();
        assert!(inverse.flags.reverse);
        assert!(inverse.flags.cached);
        assert_eq!(inverse.patch, record.patch);
        assert_eq!(inverse.cursors, record.cursors);
        // Flipping twice restores the original.
        assert_eq!(inverse.inverted(), record);
    }

    #[test]
    fn render_plain_diff_keeps_text() {
        let config = DiffViewConfig::default();
        let rendered = render(&config, "diff --git a/f b/f\n");
        assert_eq!(
            rendered.text,
            "\n  UNSTAGED CHANGES\n\n--\ndiff --git a/f b/f\n"
        );
        assert!(rendered.added_regions.is_empty());
    }

    #[test]
    fn render_word_diff_offsets_by_prelude() {
        let config = DiffViewConfig {
            word_diff: WordDiffMode::Word,
            ..Default::default()
        };
        let rendered = render(&config, "say [-hi-]{+bye+}\n");
        let removed = rendered.removed_regions[0];
        let added = rendered.added_regions[0];
        assert_eq!(&rendered.text[removed.start..removed.end], "hi");
        assert_eq!(&rendered.text[added.start..added.end], "bye");
        assert!(rendered.text.ends_with("say hibye\n"));
    }
}
