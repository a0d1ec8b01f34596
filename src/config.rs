//! Invocation options parsed from the command line.

use crate::constants::{DEFAULT_REMOTE, DEFAULT_ROOT};
use clap::{ArgAction, Parser};

/// Flat set of flags controlling a freshen run.
///
/// Built once by the parser and passed by reference into every stage;
/// nothing mutates it afterwards.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "git-fresh",
    version,
    disable_version_flag = true,
    about = "Keep a git repository fresh: prune remotes, fast-forward the root branch,\n\
             and clean up merged branches, gone upstreams, and stale tags"
)]
pub struct Options {
    /// Force-delete stale local and remote branches
    #[arg(short = 'f')]
    pub force_delete: bool,

    /// Merge the root branch into the current branch
    #[arg(short = 'm')]
    pub merge_root: bool,

    /// Rebase the current branch onto the root branch
    #[arg(short = 'r')]
    pub rebase_root: bool,

    /// Delete local tags absent from the remote
    #[arg(short = 't')]
    pub prune_tags: bool,

    /// Hard-reset the local root branch to the remote root
    #[arg(short = 'R')]
    pub reset_root: bool,

    /// Remove untracked and ignored files from the workspace
    #[arg(short = 'W')]
    pub wipe_workspace: bool,

    /// Re-apply stashed changes at the end of the run
    #[arg(short = 's')]
    pub apply_stash: bool,

    /// Restrict forced deletion to local branches only
    #[arg(short = 'l')]
    pub local_only: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Remote to synchronize against
    #[arg(value_name = "REMOTE", default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Root branch treated as the main line
    #[arg(value_name = "ROOT", default_value = DEFAULT_ROOT)]
    pub root: String,
}

impl Options {
    /// True when rebase and merge were both requested; the intent is
    /// ambiguous, so neither runs.
    #[must_use]
    pub fn conflicting_reconcile(&self) -> bool {
        self.rebase_root && self.merge_root
    }
}

impl Default for Options {
    /// Mirrors a flagless `git-fresh` invocation.
    fn default() -> Self {
        Self {
            force_delete: false,
            merge_root: false,
            rebase_root: false,
            prune_tags: false,
            reset_root: false,
            wipe_workspace: false,
            apply_stash: false,
            local_only: false,
            version: None,
            remote: DEFAULT_REMOTE.to_string(),
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_defaults_match_flagless_invocation() {
        let parsed = Options::parse_from(["git-fresh"]);
        assert!(!parsed.force_delete);
        assert!(!parsed.merge_root);
        assert!(!parsed.rebase_root);
        assert!(!parsed.prune_tags);
        assert!(!parsed.reset_root);
        assert!(!parsed.wipe_workspace);
        assert!(!parsed.apply_stash);
        assert!(!parsed.local_only);
        assert_eq!(parsed.remote, "origin");
        assert_eq!(parsed.root, "master");
    }

    #[test]
    fn test_combined_short_flags_and_positionals() {
        let parsed = Options::parse_from(["git-fresh", "-fmrtRWsl", "upstream", "main"]);
        assert!(parsed.force_delete);
        assert!(parsed.merge_root);
        assert!(parsed.rebase_root);
        assert!(parsed.prune_tags);
        assert!(parsed.reset_root);
        assert!(parsed.wipe_workspace);
        assert!(parsed.apply_stash);
        assert!(parsed.local_only);
        assert_eq!(parsed.remote, "upstream");
        assert_eq!(parsed.root, "main");
    }

    #[test]
    fn test_conflicting_reconcile_requires_both_flags() {
        let rebase_only = Options::parse_from(["git-fresh", "-r"]);
        assert!(!rebase_only.conflicting_reconcile());

        let both = Options::parse_from(["git-fresh", "-rm"]);
        assert!(both.conflicting_reconcile());
    }

    #[test]
    fn test_version_flag_short_circuits() {
        let err = Options::try_parse_from(["git-fresh", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_unknown_flag_is_a_usage_error() {
        let err = Options::try_parse_from(["git-fresh", "-x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_default_impl_matches_parsed_defaults() {
        let parsed = Options::parse_from(["git-fresh"]);
        let default = Options::default();
        assert_eq!(parsed.remote, default.remote);
        assert_eq!(parsed.root, default.root);
        assert_eq!(parsed.force_delete, default.force_delete);
        assert_eq!(parsed.apply_stash, default.apply_stash);
    }
}
