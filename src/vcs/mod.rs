//! Version-control backends.
//!
//! The learner only needs three queries from the underlying tool, captured
//! by [`VersionControl`]. [`git::GitCli`] answers them by running `git`.

pub mod git;

use anyhow::Result;
use camino::Utf8Path;
use std::path::Path;

pub use git::GitCli;

pub trait VersionControl {
    /// Absolute top-level directory of the repository enclosing `dir`.
    /// May be empty if the tool reports nothing.
    fn toplevel(&self, dir: &Path) -> Result<String>;

    /// Commit identifiers matching `filters`, in the order the tool reports
    /// them. An empty `filters` means every reachable commit.
    fn rev_list(&self, root: &Utf8Path, filters: &[String]) -> Result<Vec<String>>;

    /// Paths touched by `commit`, relative to `root`.
    fn changed_files(&self, root: &Utf8Path, commit: &str) -> Result<Vec<String>>;
}
