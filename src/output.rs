//! Progress display, colored status lines, and summary formatting.
//!
//! Everything user-visible goes to stderr, prefixed with the tool tag; a
//! spinner tracks the workflow steps while a run is in flight.

use crate::config::Options;
use crate::constants::{PROGRESS_TICK_MS, TOOL_TAG};
use crate::freshen::{
    FreshenCallbacks, FreshenFailure, FreshenOutcome, FreshenReport, FreshenResult, FreshenStep,
    StashDisposition, Warning,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
/// This is the null object pattern for FreshenCallbacks - use it when
/// you don't need any output or progress tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl FreshenCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &FreshenStep) {}
}

/// Spinner wrapper for a freshen run.
/// Uses `Option` so a hidden spinner costs nothing.
pub struct RunProgress {
    spinner: Option<ProgressBar>,
}

impl RunProgress {
    pub fn update(&self, step: &FreshenStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format_step_message(step));
        }
    }

    pub fn finish_success(&self, duration: Duration) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!(
                "{} repository refreshed in {}",
                "✓".green(),
                format_duration(duration)
            ));
        }
    }

    pub fn finish_failed(&self, failure: &FreshenFailure) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!(
                "{} failed at {:?}: {}",
                "✗".red(),
                failure.step,
                failure.error
            ));
        }
    }
}

/// Callbacks for a freshen run: feeds the spinner and finishes it with a
/// success or failure line.
pub struct RunCallbacks {
    progress: RunProgress,
}

impl RunCallbacks {
    #[must_use]
    pub fn new(progress: RunProgress) -> Self {
        Self { progress }
    }

    pub fn finish(&self, result: &FreshenResult) {
        match &result.outcome {
            FreshenOutcome::Success(_) => self.progress.finish_success(result.duration),
            FreshenOutcome::Failed(failure) => self.progress.finish_failed(failure),
        }
    }
}

impl FreshenCallbacks for RunCallbacks {
    fn on_step(&self, step: &FreshenStep) {
        self.progress.update(step);
    }
}

/// Creates the spinner-based progress tracker for a run.
#[must_use]
pub fn create_run_progress() -> RunProgress {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
    RunProgress {
        spinner: Some(spinner),
    }
}

fn tag() -> colored::ColoredString {
    format!("{TOOL_TAG}:").cyan().bold()
}

/// Prints a tagged status line to stderr.
pub fn notice(message: &str) {
    eprintln!("{} {}", tag(), message);
}

pub fn warn(message: &str) {
    eprintln!("{} {}", format!("{TOOL_TAG}:").yellow().bold(), message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", format!("{TOOL_TAG}:").red().bold(), message.red());
}

pub fn print_run_header(path: &Path, remote: &str, root: &str) {
    eprintln!(
        "{} freshening {} against {} in {}",
        tag(),
        root.white().bold(),
        remote.white().bold(),
        path.display().to_string().dimmed()
    );
}

/// Prints what the run did: stale sets, deletions, pruned tags, the stash
/// disposition, and any warnings.
pub fn print_report(report: &FreshenReport, opts: &Options) {
    if !opts.force_delete {
        if !report.stale_local.is_empty() {
            notice(&format!(
                "stale local branches: {}",
                report.stale_local.join(", ").white().bold()
            ));
        }
        if !report.stale_remote.is_empty() {
            notice(&format!(
                "stale {} branches: {}",
                report.remote,
                report.stale_remote.join(", ").white().bold()
            ));
        }
        if !report.stale_local.is_empty() || !report.stale_remote.is_empty() {
            notice("run again with -f to delete them");
        }
    }

    if !report.deleted_local.is_empty() {
        notice(&format!(
            "deleted local branches: {}",
            report.deleted_local.join(", ")
        ));
    }
    if !report.deleted_remote.is_empty() {
        notice(&format!(
            "deleted {} branches: {}",
            report.remote,
            report.deleted_remote.join(", ")
        ));
    }
    if !report.pruned_tags.is_empty() {
        notice(&format!("pruned tags: {}", report.pruned_tags.join(", ")));
    }

    match &report.stash {
        StashDisposition::None => {}
        StashDisposition::Kept { label, stash_ref } => {
            notice(&format!(
                "your changes are stashed as {label}; restore with `git stash pop {stash_ref}`"
            ));
        }
        StashDisposition::Restored { .. } => notice("stashed changes restored"),
    }

    for warning in &report.warnings {
        warn(&format_warning(warning));
    }
}

fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::FastForwardFailed { remote, root } => {
            format!("could not fast-forward {root} from {remote}; run again with -R to hard-reset")
        }
        Warning::RebaseAndMergeRequested => {
            "both -r and -m were requested; skipping rebase and merge".to_string()
        }
        Warning::OriginalBranchGone { branch } => {
            format!("branch {branch} is gone; staying on the root branch")
        }
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn format_step_message(step: &FreshenStep) -> &'static str {
    match step {
        FreshenStep::Preflight => "Checking repository state...",
        FreshenStep::Stashing => "Stashing work in progress...",
        FreshenStep::SyncingRemote => "Updating and pruning remote refs...",
        FreshenStep::SwitchingToRoot => "Switching to the root branch...",
        FreshenStep::WipingWorkspace => "Removing untracked and ignored files...",
        FreshenStep::ResettingRoot => "Resetting root to its remote counterpart...",
        FreshenStep::FastForwarding => "Fast-forwarding the root branch...",
        FreshenStep::ResolvingStaleBranches => "Resolving stale branches...",
        FreshenStep::CleaningUpstreams => "Dropping gone upstreams...",
        FreshenStep::RestoringBranch => "Returning to the original branch...",
        FreshenStep::Rebasing => "Rebasing onto the root branch...",
        FreshenStep::Merging => "Merging the root branch...",
        FreshenStep::SyncingTags => "Pruning tags missing from the remote...",
        FreshenStep::RestoringStash => "Restoring stashed changes...",
        FreshenStep::Housekeeping => "Running repository housekeeping...",
        FreshenStep::Completed => "Completed",
    }
}
