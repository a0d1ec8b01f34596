//! Application-wide constants.
//!
//! Centralized names and timings to avoid magic values throughout the codebase.

/// Tag prefixed to every status line written to stderr.
pub const TOOL_TAG: &str = "git-fresh";

/// Name of the ignore file listing exempt branch names.
///
/// Looked up at the repository toplevel first, then in the home directory;
/// only the first file found is consulted.
pub const IGNORE_FILE: &str = ".git-fresh";

/// Default remote to synchronize against.
pub const DEFAULT_REMOTE: &str = "origin";

/// Default root branch treated as the main line.
pub const DEFAULT_ROOT: &str = "master";

/// Prefix for the stash label; the run's unix timestamp is appended so the
/// entry can be found again among unrelated stashes.
pub const STASH_PREFIX: &str = "git-fresh";

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;
