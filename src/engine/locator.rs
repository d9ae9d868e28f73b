use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::error::LearnError;
use crate::vcs::VersionControl;

/// Name of the version-control metadata directory.
const METADATA_DIR: &str = ".git";

/// Top-level directory of the working tree being learned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRoot(Utf8PathBuf);

impl RepoRoot {
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    /// Resolve `relative` against the root. Absolute paths pass through.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.0.as_std_path().join(relative)
    }
}

/// Truncate `dir` before its first metadata-directory component.
///
/// `rev-parse --show-toplevel` has no answer from inside `.git`, so
/// `/repo/.git/refs/heads` is queried as `/repo`.
pub fn normalize_start_dir(dir: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in dir.components() {
        if matches!(component, Component::Normal(name) if name == METADATA_DIR) {
            break;
        }
        normalized.push(component);
    }
    if normalized.as_os_str().is_empty() {
        return dir.to_path_buf();
    }
    normalized
}

/// Find the repository enclosing `cwd`.
pub fn locate(vcs: &impl VersionControl, cwd: &Path) -> Result<RepoRoot> {
    let start = normalize_start_dir(cwd);
    if start != cwd {
        debug!(from = %cwd.display(), to = %start.display(), "left metadata directory");
    }

    let toplevel = vcs.toplevel(&start)?;
    if toplevel.is_empty() {
        bail!(LearnError::not_a_repository(
            "I can't find the top of your source tree with \
             \"git rev-parse --show-toplevel\", so I can't continue."
        ));
    }

    let root = RepoRoot(Utf8PathBuf::from(toplevel));
    info!("repository root: {}", root.as_path());
    Ok(root)
}
