use error_set::error_set;
use std::process::Command;

pub mod diff;
pub mod view;

pub use diff::document::{CommitHeader, DiffDocument, FileHeader, Hunk, file_reference};
pub use diff::locate::{find_hunk_in_text, locate_hunk_after_rerender};
pub use diff::position::{JumpTo, map_cursor_to_file_location};
pub use diff::word_diff::postprocess_word_diff;
pub use diff::{Region, position};
pub use view::{
    ApplyFlags, DiffViewConfig, DiffViewState, PatchRecord, RenderedDiff, WordDiffMode, render,
};

error_set! {
    /// Top-level error for diff view operations
    DiffViewError := {
        #[display("Not within a hunk")]
        NotWithinHunk,
        #[display("Undo stack is empty")]
        EmptyHistory,
        #[display("You have to be in a clean diff to stage")]
        DirtyDiff,
        #[display("Staging is not available in this view")]
        StagingDisabled,
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git output: {message}")]
        InvalidUtf8 { message: String },
        #[display("Failed to get stdin handle for git apply")]
        ApplyStdinFailed,
        #[display("Failed to write patch to git apply: {message}")]
        ApplyWriteFailed { message: String },
        #[display("Failed to wait for git {command}: {message}")]
        WaitFailed { command: String, message: String },
    }
}

/// One diff view over a repository: render configuration, the text of the
/// last render, and the undo history of applied patches.
pub struct DiffView {
    repo_path: String,
    config: DiffViewConfig,
    state: DiffViewState,
}

impl DiffView {
    pub fn new(repo_path: impl Into<String>, config: DiffViewConfig) -> Self {
        Self {
            repo_path: repo_path.into(),
            config,
            state: DiffViewState::default(),
        }
    }

    pub fn config(&self) -> &DiffViewConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DiffViewConfig {
        &mut self.config
    }

    pub fn state(&self) -> &DiffViewState {
        &self.state
    }

    /// Re-run `git diff` and rebuild the display text.
    ///
    /// # Examples
    /// ```no_run
    /// # use hunkview::{DiffView, DiffViewConfig};
    /// let mut view = DiffView::new(".", DiffViewConfig::default());
    /// let rendered = view.refresh().unwrap();
    /// println!("{}", rendered.text);
    /// ```
    pub fn refresh(&mut self) -> Result<RenderedDiff, GitCommandError> {
        let raw = self.git(&self.config.diff_args(), None)?;
        let rendered = render(&self.config, &raw);
        self.state.raw_diff = raw;
        self.state.last_render = rendered.text.clone();
        self.state.added_regions = rendered.added_regions.clone();
        self.state.removed_regions = rendered.removed_regions.clone();
        Ok(rendered)
    }

    /// Map a cursor offset in the last render to a real file location.
    pub fn jump(&self, pt: usize) -> Option<JumpTo> {
        let doc = DiffDocument::parse(&self.state.last_render);
        let regions = self
            .config
            .word_diff
            .is_on()
            .then_some(self.state.removed_regions.as_slice());
        map_cursor_to_file_location(&doc, pt, regions)
    }

    /// Apply the hunks under `cursors` to the index (stage/unstage) or the
    /// working tree (reset), then re-render.
    pub fn stage_or_reset_hunk(
        &mut self,
        cursors: &[usize],
        reset: bool,
    ) -> Result<RenderedDiff, DiffViewError> {
        if self.config.disable_stage {
            return Err(DiffViewError::StagingDisabled);
        }
        // The rendered text must be a verbatim patch for git apply to accept.
        if self.config.ignore_whitespace || self.config.word_diff.is_on() {
            return Err(DiffViewError::DirtyDiff);
        }

        let doc = DiffDocument::parse(&self.state.last_render);
        let patch = assemble_patch(&doc, cursors).ok_or(DiffViewError::NotWithinHunk)?;
        let flags = ApplyFlags::for_stage_or_reset(&self.config, reset);
        self.git(&flags.args(), Some(&patch))?;

        self.state.history.push(PatchRecord {
            flags,
            patch: patch.clone(),
            cursors: cursors.to_vec(),
            in_cached_mode: self.config.in_cached_mode,
        });
        self.state.just_hunked = patch;
        self.state.last_cursors = cursors.to_vec();
        Ok(self.refresh()?)
    }

    /// Re-apply the most recent patch in reverse.
    ///
    /// Returns the cursors recorded with the patch when the undone action
    /// happened in the same view mode, so the caller can restore them.
    pub fn undo(&mut self) -> Result<(RenderedDiff, Option<Vec<usize>>), DiffViewError> {
        let record = self
            .state
            .history
            .pop()
            .ok_or(DiffViewError::EmptyHistory)?;
        let inverse = record.inverted();
        self.git(&inverse.flags.args(), Some(&inverse.patch))?;
        // The undone hunk is the most recently moved one now.
        self.state.just_hunked = inverse.patch.clone();

        let rendered = self.refresh()?;
        let cursors =
            (record.in_cached_mode == self.config.in_cached_mode).then_some(record.cursors);
        if let Some(cursors) = &cursors {
            self.state.last_cursors = cursors.clone();
        }
        Ok((rendered, cursors))
    }

    /// Flip between the working-tree and index views and re-render.
    ///
    /// When a hunk was just staged or unstaged, it now lives on the other
    /// side of the index; its recorded patch text is consumed to point the
    /// caller at the same hunk in the new render.
    pub fn toggle_cached_mode(
        &mut self,
    ) -> Result<(RenderedDiff, Option<usize>), GitCommandError> {
        self.config.in_cached_mode = !self.config.in_cached_mode;
        let just_hunked = std::mem::take(&mut self.state.just_hunked);
        let rendered = self.refresh()?;

        let cursor = if just_hunked.is_empty() {
            None
        } else {
            find_hunk_in_text(&self.state.last_render, &just_hunked).map(|region| region.start)
        };
        if let Some(pt) = cursor {
            self.state.last_cursors = vec![pt];
        }
        Ok((rendered, cursor))
    }

    /// Change the context line count and relocate the hunks that were under
    /// the cursors in the new render.
    pub fn zoom(
        &mut self,
        amount: i32,
        cursors: &[usize],
    ) -> Result<(RenderedDiff, Vec<usize>), GitCommandError> {
        let doc = DiffDocument::parse(&self.state.last_render);
        let captured: Vec<String> = cursors
            .iter()
            .filter_map(|&pt| {
                let (header, hunk) = doc.locate(pt)?;
                Some(format!(
                    "{}{}",
                    doc.slice(header.region),
                    doc.slice(hunk.region)
                ))
            })
            .collect();

        self.config = self.config.zoomed(amount);
        let rendered = self.refresh()?;

        let mut relocated = Vec::new();
        for patch in &captured {
            if let Some(region) = find_hunk_in_text(&self.state.last_render, patch) {
                if !relocated.contains(&region.start) {
                    relocated.push(region.start);
                }
            }
        }
        self.state.last_cursors = relocated.clone();
        Ok((rendered, relocated))
    }

    /// Full `git show` output for one commit.
    pub fn show_commit(&self, hash: &str) -> Result<String, GitCommandError> {
        let mut args = vec![
            "show".to_string(),
            "--no-color".to_string(),
            "--format=fuller".to_string(),
        ];
        if self.config.show_diffstat {
            args.push("--stat".to_string());
        }
        args.push("--patch".to_string());
        args.push(hash.to_string());
        self.git(&args, None)
    }

    fn git(&self, args: &[String], stdin: Option<&str>) -> Result<String, GitCommandError> {
        let command = args.first().cloned().unwrap_or_default();
        log::debug!("git -C {} {}", self.repo_path, args.join(" "));

        let output = match stdin {
            None => Command::new("git")
                .arg("-C")
                .arg(&self.repo_path)
                .args(args)
                .output()
                .map_err(|e| GitCommandError::SpawnFailed {
                    command: command.clone(),
                    message: e.to_string(),
                })?,
            Some(input) => {
                use std::io::Write;

                let mut child = Command::new("git")
                    .arg("-C")
                    .arg(&self.repo_path)
                    .args(args)
                    .stdin(std::process::Stdio::piped())
                    .stdout(std::process::Stdio::piped())
                    .stderr(std::process::Stdio::piped())
                    .spawn()
                    .map_err(|e| GitCommandError::SpawnFailed {
                        command: command.clone(),
                        message: e.to_string(),
                    })?;

                child
                    .stdin
                    .take()
                    .ok_or(GitCommandError::ApplyStdinFailed)?
                    .write_all(input.as_bytes())
                    .map_err(|e| GitCommandError::ApplyWriteFailed {
                        message: e.to_string(),
                    })?;

                child
                    .wait_with_output()
                    .map_err(|e| GitCommandError::WaitFailed {
                        command: command.clone(),
                        message: e.to_string(),
                    })?
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::ExitError {
                command,
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            message: e.to_string(),
        })
    }
}

/// Build a standalone patch from the hunks under the cursors, in document
/// order, each hunk preceded by its file header. Headers and hunks hit by
/// several cursors appear once. `None` when no cursor is inside a hunk.
fn assemble_patch(doc: &DiffDocument<'_>, cursors: &[usize]) -> Option<String> {
    let mut regions: Vec<Region> = Vec::new();
    for &pt in cursors {
        let Some((header, hunk)) = doc.locate(pt) else {
            continue;
        };
        if !regions.contains(&header.region) {
            regions.push(header.region);
        }
        if !regions.contains(&hunk.region) {
            regions.push(hunk.region);
        }
    }
    if regions.is_empty() {
        return None;
    }
    // Cursors arrive in selection order, but git apply needs the hunks in
    // document order. Headers start before their hunks, so a plain sort
    // keeps each header ahead of its hunks.
    regions.sort_by_key(|r| r.start);

    let mut patch: String = regions.iter().map(|r| doc.slice(*r)).collect();
    if !patch.ends_with('\n') {
        patch.push('\n');
    }
    Some(patch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const TWO_FILE_DIFF: &str = "\
diff --git a/flake.nix b/flake.nix
--- a/flake.nix
+++ b/flake.nix
@@ -1,2 +1,3 @@
 one
+two
 three
@@ -9,2 +10,2 @@
 eight
-nine
+NINE
diff --git a/gtk.nix b/gtk.nix
--- a/gtk.nix
+++ b/gtk.nix
@@ -5 +6 @@
-old
+new
";

    #[test]
    fn patch_for_single_cursor() {
        let doc = DiffDocument::parse(TWO_FILE_DIFF);
        let pt = TWO_FILE_DIFF.find("+two").unwrap();
        let patch = assemble_patch(&doc, &[pt]).unwrap();
        assert_eq!(
            patch,
            "\
diff --git a/flake.nix b/flake.nix
--- a/flake.nix
+++ b/flake.nix
@@ -1,2 +1,3 @@
 one
+two
 three
"
        );
    }

    #[test]
    fn patch_deduplicates_shared_file_header() {
        let doc = DiffDocument::parse(TWO_FILE_DIFF);
        let first = TWO_FILE_DIFF.find("+two").unwrap();
        let second = TWO_FILE_DIFF.find("+NINE").unwrap();
        let patch = assemble_patch(&doc, &[first, second, first]).unwrap();
        assert_eq!(patch.matches("diff --git a/flake.nix").count(), 1);
        assert_eq!(patch.matches("@@ ").count(), 2);
    }

    #[test]
    fn patch_spanning_two_files_keeps_both_headers() {
        let doc = DiffDocument::parse(TWO_FILE_DIFF);
        let first = TWO_FILE_DIFF.find("+NINE").unwrap();
        let second = TWO_FILE_DIFF.find("+new").unwrap();
        let patch = assemble_patch(&doc, &[first, second]).unwrap();
        assert!(patch.contains("diff --git a/flake.nix"));
        assert!(patch.contains("diff --git a/gtk.nix"));
        assert!(patch.ends_with("+new\n"));
    }

    #[test]
    fn patch_orders_hunks_by_document_position() {
        let doc = DiffDocument::parse(TWO_FILE_DIFF);
        let first = TWO_FILE_DIFF.find("+two").unwrap();
        let second = TWO_FILE_DIFF.find("+new").unwrap();
        // Cursors supplied back to front.
        let patch = assemble_patch(&doc, &[second, first]).unwrap();
        let flake = patch.find("diff --git a/flake.nix").unwrap();
        let gtk = patch.find("diff --git a/gtk.nix").unwrap();
        assert!(flake < gtk);
        assert!(gtk < patch.find("@@ -5 +6 @@").unwrap());
    }

    #[test]
    fn no_cursor_in_a_hunk_yields_none() {
        let doc = DiffDocument::parse(TWO_FILE_DIFF);
        // Offset 0 sits on the first file header line.
        assert!(assemble_patch(&doc, &[0]).is_none());
        assert!(assemble_patch(&doc, &[]).is_none());
    }
}
