use anyhow::Result;
use ahash::AHashSet;
use tracing::{debug, info};

use crate::engine::locator::RepoRoot;
use crate::models::correlation::Commit;
use crate::vcs::VersionControl;

/// Commit identifiers to learn from. No filters means every reachable commit.
pub fn list_commits(
    vcs: &impl VersionControl,
    root: &RepoRoot,
    filters: &[String],
) -> Result<Vec<String>> {
    let commits = vcs.rev_list(root.as_path(), filters)?;
    info!(count = commits.len(), ?filters, "listed commits");
    Ok(commits)
}

/// Distinct files touched by `id`, in the order the backend reports them.
pub fn commit_files(vcs: &impl VersionControl, root: &RepoRoot, id: &str) -> Result<Commit> {
    let listed = vcs.changed_files(root.as_path(), id)?;

    let mut seen = AHashSet::with_capacity(listed.len());
    let files: Vec<String> = listed
        .into_iter()
        .filter(|f| seen.insert(f.clone()))
        .collect();

    debug!(commit = id, files = files.len(), "listed commit files");
    Ok(Commit {
        id: id.to_string(),
        files,
    })
}
