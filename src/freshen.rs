//! The freshen workflow.
//!
//! Orchestrates one maintenance pass over a repository: stash, remote sync,
//! root switch and fast-forward, stale-branch handling, upstream cleanup,
//! branch reconciliation, tag sync, stash restore, housekeeping. Every
//! mutation is delegated to the git CLI through [`crate::git`]; this module
//! owns only the sequencing and the decisions between steps.

use crate::config::Options;
use crate::constants::STASH_PREFIX;
use crate::git;
use crate::ignore::IgnoreList;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Steps of the workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshenStep {
    Preflight,
    Stashing,
    SyncingRemote,
    SwitchingToRoot,
    WipingWorkspace,
    ResettingRoot,
    FastForwarding,
    ResolvingStaleBranches,
    CleaningUpstreams,
    RestoringBranch,
    Rebasing,
    Merging,
    SyncingTags,
    RestoringStash,
    Housekeeping,
    Completed,
}

/// Where HEAD pointed when the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginalHead {
    Branch(String),
    DetachedAt(String),
}

impl OriginalHead {
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::DetachedAt(_))
    }

    /// Branch name, if the run started on one.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::Branch(name) => Some(name),
            Self::DetachedAt(_) => None,
        }
    }
}

/// What happened to the wrapper's own stash entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashDisposition {
    /// Nothing needed stashing.
    None,
    /// A stash was created and left in place for the user.
    Kept { label: String, stash_ref: String },
    /// A stash was created and popped back at the end of the run.
    Restored { label: String },
}

/// Recoverable conditions surfaced to the user without aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// `git pull --ff-only` refused because histories diverged.
    FastForwardFailed { remote: String, root: String },
    /// `-r` and `-m` were both requested; neither ran.
    RebaseAndMergeRequested,
    /// The branch the run started on no longer exists.
    OriginalBranchGone { branch: String },
}

/// Everything a successful run did, for the end-of-run summary.
#[derive(Debug)]
pub struct FreshenReport {
    pub remote: String,
    pub root: String,
    pub original_head: OriginalHead,
    pub returned_to_original: bool,
    pub stash: StashDisposition,
    pub stale_local: Vec<String>,
    pub stale_remote: Vec<String>,
    pub deleted_local: Vec<String>,
    pub deleted_remote: Vec<String>,
    pub pruned_tags: Vec<String>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug)]
pub struct FreshenFailure {
    pub step: FreshenStep,
    pub error: String,
}

#[derive(Debug)]
pub enum FreshenOutcome {
    Success(FreshenReport),
    Failed(FreshenFailure),
}

#[derive(Debug)]
pub struct FreshenResult {
    pub path: PathBuf,
    pub outcome: FreshenOutcome,
    pub duration: Duration,
}

/// Progress notifications, implemented by the presentation layer.
pub trait FreshenCallbacks {
    fn on_step(&self, step: &FreshenStep);
}

struct StepError {
    step: FreshenStep,
    source: anyhow::Error,
}

fn at_step<T>(step: FreshenStep, result: anyhow::Result<T>) -> Result<T, StepError> {
    result.map_err(|source| StepError { step, source })
}

/// Runs the full workflow against the repository at `path`.
pub fn run<C: FreshenCallbacks>(path: &Path, opts: &Options, callbacks: &C) -> FreshenResult {
    let started = Instant::now();
    let outcome = match do_run(path, opts, callbacks) {
        Ok(report) => FreshenOutcome::Success(report),
        Err(failed) => FreshenOutcome::Failed(FreshenFailure {
            step: failed.step,
            error: format!("{:#}", failed.source),
        }),
    };
    FreshenResult {
        path: path.to_path_buf(),
        outcome,
        duration: started.elapsed(),
    }
}

fn do_run<C: FreshenCallbacks>(
    path: &Path,
    opts: &Options,
    callbacks: &C,
) -> Result<FreshenReport, StepError> {
    let mut warnings = Vec::new();

    callbacks.on_step(&FreshenStep::Preflight);
    let (original_head, ignores) = at_step(FreshenStep::Preflight, preflight(path, opts))?;

    callbacks.on_step(&FreshenStep::Stashing);
    let stash_label = at_step(FreshenStep::Stashing, stash_if_dirty(path))?;

    callbacks.on_step(&FreshenStep::SyncingRemote);
    let has_remote = !at_step(FreshenStep::SyncingRemote, git::list_remotes(path))?.is_empty();
    if has_remote {
        at_step(FreshenStep::SyncingRemote, sync_remote(path, &opts.remote))?;
    }

    callbacks.on_step(&FreshenStep::SwitchingToRoot);
    at_step(FreshenStep::SwitchingToRoot, git::checkout(path, &opts.root))?;

    if opts.wipe_workspace {
        callbacks.on_step(&FreshenStep::WipingWorkspace);
        at_step(FreshenStep::WipingWorkspace, git::clean_workspace(path))?;
    }

    if has_remote {
        if opts.reset_root {
            callbacks.on_step(&FreshenStep::ResettingRoot);
            let target = format!("{}/{}", opts.remote, opts.root);
            at_step(FreshenStep::ResettingRoot, git::reset_hard(path, &target))?;
        }

        callbacks.on_step(&FreshenStep::FastForwarding);
        if git::pull_ff_only(path, &opts.remote, &opts.root).is_err() {
            warnings.push(Warning::FastForwardFailed {
                remote: opts.remote.clone(),
                root: opts.root.clone(),
            });
        }
    }

    callbacks.on_step(&FreshenStep::ResolvingStaleBranches);
    let stale = at_step(
        FreshenStep::ResolvingStaleBranches,
        resolve_stale(path, opts, &ignores),
    )?;
    let mut deleted_local = Vec::new();
    let mut deleted_remote = Vec::new();
    if opts.force_delete {
        for branch in &stale.local {
            // `git branch -d` refuses branches it does not consider fully
            // merged; those are skipped, not fatal.
            if git::delete_branch(path, branch).is_ok() {
                deleted_local.push(branch.clone());
            }
        }
        if !opts.local_only {
            for branch in &stale.remote {
                at_step(
                    FreshenStep::ResolvingStaleBranches,
                    git::delete_remote_branch(path, &opts.remote, branch),
                )?;
                deleted_remote.push(branch.clone());
            }
        }
    }

    callbacks.on_step(&FreshenStep::CleaningUpstreams);
    let gone = at_step(
        FreshenStep::CleaningUpstreams,
        git::branches_with_gone_upstream(path),
    )?;
    for branch in &gone {
        at_step(
            FreshenStep::CleaningUpstreams,
            git::unset_upstream(path, branch),
        )?;
    }

    callbacks.on_step(&FreshenStep::RestoringBranch);
    let returned_to_original = at_step(
        FreshenStep::RestoringBranch,
        restore_head(path, opts, &original_head, &mut warnings),
    )?;

    if opts.conflicting_reconcile() {
        warnings.push(Warning::RebaseAndMergeRequested);
    } else if has_remote && returned_to_original {
        if let OriginalHead::Branch(branch) = &original_head {
            if branch != &opts.root {
                if opts.rebase_root {
                    callbacks.on_step(&FreshenStep::Rebasing);
                    at_step(FreshenStep::Rebasing, git::rebase(path, &opts.root))?;
                } else if opts.merge_root {
                    callbacks.on_step(&FreshenStep::Merging);
                    at_step(FreshenStep::Merging, git::merge_no_edit(path, &opts.root))?;
                }
            }
        }
    }

    let mut pruned_tags = Vec::new();
    if opts.prune_tags && has_remote {
        callbacks.on_step(&FreshenStep::SyncingTags);
        let on_remote = at_step(FreshenStep::SyncingTags, git::remote_tags(path, &opts.remote))?;
        let local = at_step(FreshenStep::SyncingTags, git::local_tags(path))?;
        for tag in local {
            if !on_remote.contains(&tag) {
                at_step(FreshenStep::SyncingTags, git::delete_tag(path, &tag))?;
                pruned_tags.push(tag);
            }
        }
    }

    callbacks.on_step(&FreshenStep::RestoringStash);
    let stash = at_step(
        FreshenStep::RestoringStash,
        restore_stash(path, stash_label.as_deref(), opts.apply_stash),
    )?;

    callbacks.on_step(&FreshenStep::Housekeeping);
    if git::gc(path).is_err() {
        housekeeping_fallback(path);
    }

    callbacks.on_step(&FreshenStep::Completed);

    Ok(FreshenReport {
        remote: opts.remote.clone(),
        root: opts.root.clone(),
        original_head,
        returned_to_original,
        stash,
        stale_local: stale.local,
        stale_remote: stale.remote,
        deleted_local,
        deleted_remote,
        pruned_tags,
        warnings,
    })
}

/// Guard checks that must hold before anything is mutated.
///
/// Establishes the original head for later restoration and loads the
/// effective ignore list; a run started on an ignored branch aborts here.
fn preflight(path: &Path, opts: &Options) -> anyhow::Result<(OriginalHead, IgnoreList)> {
    if !git::is_inside_work_tree(path)? {
        anyhow::bail!("not a git repository");
    }

    let head = match git::current_branch(path) {
        Ok(name) if name == "HEAD" => OriginalHead::DetachedAt(git::head_commit(path)?),
        Ok(name) => OriginalHead::Branch(name),
        // Unborn HEAD: usable only if the requested root can be checked out.
        Err(_) => {
            git::checkout(path, &opts.root).map_err(|_| {
                anyhow::anyhow!(
                    "no local branches and '{}' cannot be checked out",
                    opts.root
                )
            })?;
            OriginalHead::Branch(opts.root.clone())
        }
    };

    let toplevel = git::toplevel(path)?;
    let ignores = IgnoreList::load(&toplevel)?;
    if let Some(branch) = head.branch() {
        if ignores.contains(branch) {
            anyhow::bail!("current branch '{branch}' is in the ignore list");
        }
    }

    Ok((head, ignores))
}

/// Stashes modified tracked files under a time-derived label. Untracked
/// files never trigger a stash.
fn stash_if_dirty(path: &Path) -> anyhow::Result<Option<String>> {
    if !git::has_uncommitted_tracked_changes(path)? {
        return Ok(None);
    }
    let label = stash_label();
    git::stash_push(path, &label)?;
    Ok(Some(label))
}

fn stash_label() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!("{STASH_PREFIX}-{seconds}")
}

/// Prunes, updates, and prunes again so refs removed during the update are
/// also dropped.
fn sync_remote(path: &Path, remote: &str) -> anyhow::Result<()> {
    git::remote_prune(path, remote)?;
    git::remote_update(path, remote)?;
    git::remote_prune(path, remote)
}

struct StaleBranches {
    local: Vec<String>,
    remote: Vec<String>,
}

/// Branches fully merged into root, minus root itself, minus ignored names.
///
/// Remote-tracking candidates are restricted to the selected remote; the
/// leading `<remote>/` prefix is stripped exactly once, and the symbolic
/// HEAD pointer is skipped.
fn resolve_stale(
    path: &Path,
    opts: &Options,
    ignores: &IgnoreList,
) -> anyhow::Result<StaleBranches> {
    let local = git::merged_branches(path, &opts.root)?
        .into_iter()
        .filter(|name| name != &opts.root)
        .collect();

    let prefix = format!("{}/", opts.remote);
    let head_marker = format!("{}/HEAD", opts.remote);
    let remote = git::merged_remote_branches(path, &opts.root)?
        .into_iter()
        .filter(|name| name != &head_marker)
        .filter_map(|name| name.strip_prefix(&prefix).map(ToString::to_string))
        .filter(|name| name != &opts.root)
        .collect();

    Ok(StaleBranches {
        local: ignores.filter(local),
        remote: ignores.filter(remote),
    })
}

/// Returns to the original head when it still resolves; a deleted branch
/// leaves the run on root with a warning.
fn restore_head(
    path: &Path,
    opts: &Options,
    original: &OriginalHead,
    warnings: &mut Vec<Warning>,
) -> anyhow::Result<bool> {
    match original {
        OriginalHead::Branch(branch) if branch == &opts.root => Ok(true),
        OriginalHead::Branch(branch) => {
            if git::branch_exists(path, branch)? {
                git::checkout(path, branch)?;
                Ok(true)
            } else {
                warnings.push(Warning::OriginalBranchGone {
                    branch: branch.clone(),
                });
                Ok(false)
            }
        }
        OriginalHead::DetachedAt(commit) => {
            git::checkout(path, commit)?;
            Ok(true)
        }
    }
}

/// Finds the run's own stash entry by label and pops or reports it. A label
/// that no longer matches anything is treated as if no stash was made.
fn restore_stash(
    path: &Path,
    label: Option<&str>,
    apply: bool,
) -> anyhow::Result<StashDisposition> {
    let Some(label) = label else {
        return Ok(StashDisposition::None);
    };
    let Some(stash_ref) = git::find_stash(path, label)? else {
        return Ok(StashDisposition::None);
    };
    if apply {
        git::stash_pop(path, &stash_ref)?;
        Ok(StashDisposition::Restored {
            label: label.to_string(),
        })
    } else {
        Ok(StashDisposition::Kept {
            label: label.to_string(),
            stash_ref,
        })
    }
}

fn housekeeping_fallback(path: &Path) {
    // A stale gc.log makes the next gc refuse to run; drop it first.
    if let Ok(git_dir) = git::git_dir(path) {
        let _ = std::fs::remove_file(git_dir.join("gc.log"));
    }
    let _ = git::prune_unreachable(path);
}
