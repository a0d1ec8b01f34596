//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands, one function
//! per operation the freshen workflow performs. Every repository mutation in
//! this crate goes through here; the workflow itself never spawns processes.

use anyhow::Context;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Runs a git command in `repo`, returning trimmed stdout on success.
///
/// Exported so the integration tests can drive real repositories with the
/// same plumbing the crate uses.
pub fn run_git(repo: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .context("Failed to spawn git command")?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim())
    }
}

/// Runs a git command whose non-zero exit is an expected answer rather than
/// an error. Returns whether the command succeeded.
fn git_succeeds(repo: &Path, args: &[&str]) -> anyhow::Result<bool> {
    let status = std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .context("Failed to spawn git command")?;
    Ok(status.success())
}

fn validate_ref_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name.starts_with('-') || name.contains('\0') || name.contains('\n') {
        anyhow::bail!("Invalid ref name: {:?}", name);
    }
    Ok(())
}

pub fn is_inside_work_tree(repo: &Path) -> anyhow::Result<bool> {
    git_succeeds(repo, &["rev-parse", "--is-inside-work-tree"])
}

/// Repository toplevel, where the repo-local ignore file lives.
pub fn toplevel(repo: &Path) -> anyhow::Result<PathBuf> {
    run_git(repo, &["rev-parse", "--show-toplevel"])
        .map(PathBuf::from)
        .context("Failed to locate repository toplevel")
}

/// The repository's git directory, resolved against `repo` when relative.
pub fn git_dir(repo: &Path) -> anyhow::Result<PathBuf> {
    let dir = run_git(repo, &["rev-parse", "--git-dir"])
        .context("Failed to locate git directory")?;
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(repo.join(path))
    }
}

/// Short name of the current branch; `HEAD` when detached, an error on an
/// unborn HEAD.
pub fn current_branch(repo: &Path) -> anyhow::Result<String> {
    run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"]).context("Failed to get current branch")
}

pub fn head_commit(repo: &Path) -> anyhow::Result<String> {
    run_git(repo, &["rev-parse", "HEAD"]).context("Failed to resolve HEAD")
}

pub fn branch_exists(repo: &Path, branch: &str) -> anyhow::Result<bool> {
    validate_ref_name(branch)?;
    let refname = format!("refs/heads/{branch}");
    git_succeeds(repo, &["rev-parse", "--verify", "--quiet", &refname])
}

/// True when tracked files carry uncommitted modifications. Untracked files
/// do not count; they are never stashed by the workflow.
pub fn has_uncommitted_tracked_changes(repo: &Path) -> anyhow::Result<bool> {
    run_git(repo, &["status", "--porcelain", "--untracked-files=no"])
        .map(|output| !output.is_empty())
        .context("Failed to check for uncommitted changes")
}

pub fn stash_push(repo: &Path, label: &str) -> anyhow::Result<()> {
    run_git(repo, &["stash", "push", "-m", label]).context("Failed to stash changes")?;
    Ok(())
}

/// Finds the stash entry whose message ends with `label` and returns its
/// `stash@{N}` ref. Matching is by message, never by position, so unrelated
/// stashes pushed before or during the run are left alone.
pub fn find_stash(repo: &Path, label: &str) -> anyhow::Result<Option<String>> {
    let listing = run_git(repo, &["stash", "list"]).context("Failed to list stashes")?;
    for line in listing.lines() {
        if let Some((stash_ref, message)) = line.split_once(':') {
            if message.trim_end().ends_with(label) {
                return Ok(Some(stash_ref.to_string()));
            }
        }
    }
    Ok(None)
}

pub fn stash_pop(repo: &Path, stash_ref: &str) -> anyhow::Result<()> {
    run_git(repo, &["stash", "pop", stash_ref])
        .with_context(|| format!("Failed to pop stash {stash_ref}"))?;
    Ok(())
}

pub fn list_remotes(repo: &Path) -> anyhow::Result<Vec<String>> {
    let output = run_git(repo, &["remote"]).context("Failed to list remotes")?;
    Ok(output.lines().map(ToString::to_string).collect())
}

pub fn remote_prune(repo: &Path, remote: &str) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    run_git(repo, &["remote", "prune", remote])
        .with_context(|| format!("Failed to prune remote '{remote}'"))?;
    Ok(())
}

pub fn remote_update(repo: &Path, remote: &str) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    run_git(repo, &["remote", "update", remote])
        .with_context(|| format!("Failed to update remote '{remote}'"))?;
    Ok(())
}

pub fn checkout(repo: &Path, target: &str) -> anyhow::Result<()> {
    validate_ref_name(target)?;
    run_git(repo, &["checkout", target])
        .with_context(|| format!("Failed to checkout '{target}'"))?;
    Ok(())
}

/// Removes untracked and ignored files and directories from the workspace.
pub fn clean_workspace(repo: &Path) -> anyhow::Result<()> {
    run_git(repo, &["clean", "-d", "-f", "-x"]).context("Failed to clean workspace")?;
    Ok(())
}

pub fn reset_hard(repo: &Path, target: &str) -> anyhow::Result<()> {
    validate_ref_name(target)?;
    run_git(repo, &["reset", "--hard", target])
        .with_context(|| format!("Failed to hard-reset to '{target}'"))?;
    Ok(())
}

/// Fast-forward-only pull; refuses when histories have diverged. Callers
/// treat the refusal as recoverable.
pub fn pull_ff_only(repo: &Path, remote: &str, branch: &str) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    run_git(repo, &["pull", "--ff-only", remote, branch])
        .with_context(|| format!("Failed to fast-forward '{branch}' from '{remote}'"))?;
    Ok(())
}

/// Local branches fully merged into `target`, by short name.
pub fn merged_branches(repo: &Path, target: &str) -> anyhow::Result<Vec<String>> {
    validate_ref_name(target)?;
    let output = run_git(
        repo,
        &["branch", "--merged", target, "--format=%(refname:short)"],
    )
    .context("Failed to list merged branches")?;
    Ok(collect_lines(&output))
}

/// Remote-tracking branches fully merged into `target`, by short name
/// (`<remote>/<branch>`).
pub fn merged_remote_branches(repo: &Path, target: &str) -> anyhow::Result<Vec<String>> {
    validate_ref_name(target)?;
    let output = run_git(
        repo,
        &["branch", "-r", "--merged", target, "--format=%(refname:short)"],
    )
    .context("Failed to list merged remote branches")?;
    Ok(collect_lines(&output))
}

/// Soft branch deletion; fails on branches git does not consider fully
/// merged, which callers skip rather than abort on.
pub fn delete_branch(repo: &Path, branch: &str) -> anyhow::Result<()> {
    validate_ref_name(branch)?;
    run_git(repo, &["branch", "-d", branch])
        .with_context(|| format!("Failed to delete branch '{branch}'"))?;
    Ok(())
}

pub fn delete_remote_branch(repo: &Path, remote: &str, branch: &str) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    run_git(repo, &["push", remote, "--delete", branch])
        .with_context(|| format!("Failed to delete '{branch}' from '{remote}'"))?;
    Ok(())
}

/// Local branches whose upstream branch no longer exists.
pub fn branches_with_gone_upstream(repo: &Path) -> anyhow::Result<Vec<String>> {
    let output = run_git(
        repo,
        &[
            "for-each-ref",
            "--format=%(refname:short)|%(upstream:track)",
            "refs/heads",
        ],
    )
    .context("Failed to list branch upstream state")?;
    Ok(output
        .lines()
        .filter_map(|line| line.rsplit_once('|'))
        .filter(|(_, track)| *track == "[gone]")
        .map(|(branch, _)| branch.to_string())
        .collect())
}

pub fn unset_upstream(repo: &Path, branch: &str) -> anyhow::Result<()> {
    validate_ref_name(branch)?;
    run_git(repo, &["branch", "--unset-upstream", branch])
        .with_context(|| format!("Failed to unset upstream of '{branch}'"))?;
    Ok(())
}

pub fn rebase(repo: &Path, onto: &str) -> anyhow::Result<()> {
    validate_ref_name(onto)?;
    run_git(repo, &["rebase", onto]).with_context(|| format!("Failed to rebase onto '{onto}'"))?;
    Ok(())
}

/// Merges `branch` into the current branch without opening an editor.
pub fn merge_no_edit(repo: &Path, branch: &str) -> anyhow::Result<()> {
    validate_ref_name(branch)?;
    run_git(repo, &["merge", "--no-edit", branch])
        .with_context(|| format!("Failed to merge '{branch}'"))?;
    Ok(())
}

pub fn local_tags(repo: &Path) -> anyhow::Result<Vec<String>> {
    let output = run_git(repo, &["tag"]).context("Failed to list local tags")?;
    Ok(collect_lines(&output))
}

/// Tag names present on `remote`, with peeled `^{}` entries dropped.
pub fn remote_tags(repo: &Path, remote: &str) -> anyhow::Result<BTreeSet<String>> {
    validate_ref_name(remote)?;
    let output = run_git(repo, &["ls-remote", "--tags", remote])
        .with_context(|| format!("Failed to list tags on '{remote}'"))?;
    Ok(output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|refname| refname.strip_prefix("refs/tags/"))
        .filter(|name| !name.ends_with("^{}"))
        .map(ToString::to_string)
        .collect())
}

pub fn delete_tag(repo: &Path, tag: &str) -> anyhow::Result<()> {
    validate_ref_name(tag)?;
    run_git(repo, &["tag", "-d", tag]).with_context(|| format!("Failed to delete tag '{tag}'"))?;
    Ok(())
}

/// Garbage collection in automatic, forced mode.
pub fn gc(repo: &Path) -> anyhow::Result<()> {
    run_git(repo, &["gc", "--auto", "--force"]).context("Failed to run garbage collection")?;
    Ok(())
}

/// Lighter fallback when gc refuses to run.
pub fn prune_unreachable(repo: &Path) -> anyhow::Result<()> {
    run_git(repo, &["prune"]).context("Failed to prune unreachable objects")?;
    Ok(())
}

fn collect_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
