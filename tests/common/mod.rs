//! Test infrastructure for git-fresh integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use anyhow::Result;
use git_fresh_rust::config::Options;
use git_fresh_rust::git::run_git;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary git repository for testing.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
    remote: Option<TempDir>,
}

impl TestRepo {
    /// Creates a new test repository with an initial commit on the master branch.
    pub fn new() -> Result<Self> {
        Self::init("master")
    }

    /// Creates a test repository whose `origin` is a bare repository kept
    /// alive for the lifetime of the fixture.
    pub fn with_remote(initial_branch: Option<&str>) -> Result<Self> {
        let branch = initial_branch.unwrap_or("master");
        let mut repo = Self::init(branch)?;

        let remote_dir = TempDir::new()?;
        run_git(remote_dir.path(), &["init", "--bare"])?;
        run_git(
            &repo.path,
            &["remote", "add", "origin", remote_dir.path().to_str().unwrap()],
        )?;
        run_git(&repo.path, &["push", "-u", "origin", branch])?;

        repo.remote = Some(remote_dir);
        Ok(repo)
    }

    fn init(initial_branch: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();

        run_git(&path, &["init", "-b", initial_branch])?;
        run_git(&path, &["config", "user.email", "test@example.com"])?;
        run_git(&path, &["config", "user.name", "Test User"])?;

        std::fs::write(path.join("README.md"), "# Test Repo\n")?;
        run_git(&path, &["add", "README.md"])?;
        run_git(&path, &["commit", "-m", "Initial commit"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            remote: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_path(&self) -> &Path {
        self.remote
            .as_ref()
            .expect("fixture was created without a remote")
            .path()
    }

    /// Drops the backing remote directory, leaving `origin` pointing nowhere.
    pub fn remove_remote(&mut self) {
        self.remote = None;
    }

    /// Creates a branch at the current HEAD without switching to it.
    /// The new branch is fully merged by construction.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["branch", name])?;
        Ok(())
    }

    /// Creates a branch carrying a commit that exists nowhere else.
    /// Leaves the repository on the branch it started on.
    pub fn create_unmerged_branch(&self, name: &str) -> Result<()> {
        let original = self.current_branch()?;
        run_git(&self.path, &["checkout", "-b", name])?;
        let file = format!("{name}.txt");
        std::fs::write(self.path.join(&file), "unmerged\n")?;
        run_git(&self.path, &["add", &file])?;
        run_git(&self.path, &["commit", "-m", &format!("Commit on {name}")])?;
        run_git(&self.path, &["checkout", &original])?;
        Ok(())
    }

    /// Commits a file on the current branch.
    pub fn commit_file(&self, file: &str, contents: &str, message: &str) -> Result<()> {
        std::fs::write(self.path.join(file), contents)?;
        run_git(&self.path, &["add", file])?;
        run_git(&self.path, &["commit", "-m", message])?;
        Ok(())
    }

    /// Modifies a tracked file without committing.
    pub fn make_dirty(&self) -> Result<()> {
        std::fs::write(self.path.join("README.md"), "# Dirty\n")?;
        Ok(())
    }

    /// Adds an untracked file.
    pub fn make_untracked(&self) -> Result<()> {
        std::fs::write(self.path.join("untracked.txt"), "untracked\n")?;
        Ok(())
    }

    pub fn has_stash(&self) -> Result<bool> {
        Ok(self.stash_count()? > 0)
    }

    pub fn stash_count(&self) -> Result<usize> {
        let listing = run_git(&self.path, &["stash", "list"])?;
        Ok(listing.lines().filter(|l| !l.is_empty()).count())
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.path.join(name).exists()
    }

    /// Writes the repo-local ignore file, one branch name per line.
    pub fn write_ignore_file(&self, branches: &[&str]) -> Result<()> {
        let contents = branches.join("\n") + "\n";
        std::fs::write(self.path.join(".git-fresh"), contents)?;
        Ok(())
    }

    pub fn create_tag(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["tag", name])?;
        Ok(())
    }

    pub fn push_tag(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["push", "origin", name])?;
        Ok(())
    }

    /// Pushes a branch and sets its upstream.
    pub fn push_branch(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["push", "-u", "origin", name])?;
        Ok(())
    }

    /// Deletes a branch directly on the bare remote, bypassing the local
    /// remote-tracking refs.
    pub fn delete_branch_on_remote(&self, name: &str) -> Result<()> {
        run_git(self.remote_path(), &["branch", "-D", name])?;
        Ok(())
    }

    pub fn current_branch(&self) -> Result<String> {
        run_git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn head_commit(&self) -> Result<String> {
        run_git(&self.path, &["rev-parse", "HEAD"])
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        let output = run_git(&self.path, &["branch", "--format=%(refname:short)"])?;
        Ok(output.lines().map(ToString::to_string).collect())
    }

    /// Branch names on the bare remote.
    pub fn remote_branches(&self) -> Result<Vec<String>> {
        let output = run_git(self.remote_path(), &["branch", "--format=%(refname:short)"])?;
        Ok(output.lines().map(ToString::to_string).collect())
    }

    pub fn local_tags(&self) -> Result<Vec<String>> {
        let output = run_git(&self.path, &["tag"])?;
        Ok(output.lines().map(ToString::to_string).collect())
    }

    /// True when `ancestor` is reachable from `descendant`.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        run_git(
            &self.path,
            &["merge-base", "--is-ancestor", ancestor, descendant],
        )
        .is_ok()
    }
}

/// Default options for tests: no flags, origin/master.
pub fn test_options() -> Options {
    Options::default()
}
