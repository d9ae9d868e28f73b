use anyhow::Result;
use camino::Utf8PathBuf;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::artifact::{ArtifactPaths, PendingArtifact};
use crate::engine::correlation::Correlator;
use crate::engine::{history, locator};
use crate::models::summary::LearnSummary;
use crate::vcs::{GitCli, VersionControl};

// ---------------------------------------------------------------------------
// LearnService: one history-to-artifact run
// ---------------------------------------------------------------------------

pub struct LearnService<V> {
    vcs: V,
    config: Config,
}

impl LearnService<GitCli> {
    /// Service backed by the configured `git` binary.
    pub fn from_config(config: Config) -> Self {
        let vcs = GitCli::new(config.git.clone());
        Self::new(vcs, config)
    }
}

impl<V: VersionControl> LearnService<V> {
    pub fn new(vcs: V, config: Config) -> Self {
        Self { vcs, config }
    }

    /// Learn co-change counts for the repository enclosing `cwd`.
    ///
    /// The temporary artifact is claimed before any history is read, so a
    /// leftover from an earlier run is reported up front. Any failure after
    /// that leaves the temporary artifact in place and the final one
    /// untouched.
    pub fn learn(&self, cwd: &Path, filters: &[String]) -> Result<LearnSummary> {
        let root = locator::locate(&self.vcs, cwd)?;
        let mut pending = PendingArtifact::claim(ArtifactPaths::resolve(&root, &self.config))?;

        let commits = history::list_commits(&self.vcs, &root, filters)?;

        let mut correlator = Correlator::new();
        for id in &commits {
            let commit = history::commit_files(&self.vcs, &root, id)?;
            let stats = correlator.fold(&commit.files);
            debug!(
                commit = %commit.id,
                new_files = stats.new_files,
                new_pairs = stats.new_pairs,
                "folded commit"
            );
        }

        let commits_analyzed = correlator.commits();
        let (registry, table) = correlator.into_parts();
        info!(
            commits = commits_analyzed,
            files = registry.len(),
            pairs = table.pair_count(),
            "history folded"
        );

        pending.write(&registry, &table)?;
        let target = pending.promote()?;

        Ok(LearnSummary {
            commits_analyzed,
            files: registry.len(),
            pairs: table.pair_count(),
            artifact: Utf8PathBuf::from_path_buf(target)
                .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::artifact::read_artifact;
    use crate::error::{ErrorCode, LearnError};
    use crate::vcs::fake::FakeVcs;
    use std::fs;

    fn fake_repo(dir: &Path) -> FakeVcs {
        FakeVcs::with_root(dir.to_str().unwrap())
    }

    fn service(vcs: FakeVcs) -> LearnService<FakeVcs> {
        LearnService::new(vcs, Config::default())
    }

    fn error_code(err: &anyhow::Error) -> ErrorCode {
        err.downcast_ref::<LearnError>().unwrap().code
    }

    #[test]
    fn learn_writes_final_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let vcs = fake_repo(dir.path())
            .commit("c3", &["a.txt", "c.txt"])
            .commit("c2", &[])
            .commit("c1", &["a.txt", "b.txt"]);

        let summary = service(vcs).learn(dir.path(), &[]).unwrap();

        assert_eq!(summary.commits_analyzed, 3);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.pairs, 2);

        let paths = ArtifactPaths::resolve(
            &locator::locate(&fake_repo(dir.path()), dir.path()).unwrap(),
            &Config::default(),
        );
        assert!(!paths.temp.exists());
        assert_eq!(summary.artifact.as_std_path(), paths.target);

        let artifact = read_artifact(&paths.target).unwrap();
        assert_eq!(artifact.registry.as_slice(), ["a.txt", "c.txt", "b.txt"]);
        assert_eq!(artifact.table.count("a.txt", "b.txt"), Some(2));
        assert_eq!(artifact.table.count("c.txt", "a.txt"), Some(2));
        assert_eq!(artifact.table.count("b.txt", "c.txt"), None);
    }

    #[test]
    fn learn_from_metadata_dir_uses_working_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        let vcs = fake_repo(dir.path()).commit("c1", &["a.txt"]);
        let svc = service(vcs);

        svc.learn(&dir.path().join(".git").join("refs"), &[]).unwrap();

        assert_eq!(
            svc.vcs.queried_dirs.lock().unwrap().as_slice(),
            [dir.path().to_path_buf()]
        );
    }

    #[test]
    fn learn_forwards_filters() {
        let dir = tempfile::TempDir::new().unwrap();
        let svc = service(fake_repo(dir.path()).commit("c1", &["a.txt"]));
        let filters = vec!["origin/main".to_string(), "--max-count=10".to_string()];

        svc.learn(dir.path(), &filters).unwrap();

        assert_eq!(svc.vcs.seen_filters.lock().unwrap().as_slice(), [filters]);
    }

    #[test]
    fn learn_outside_repository_creates_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let svc = service(FakeVcs::default());

        let err = svc.learn(dir.path(), &[]).unwrap_err();

        assert_eq!(error_code(&err), ErrorCode::ExternalCall);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failing_commit_aborts_without_final_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut vcs = fake_repo(dir.path())
            .commit("c2", &["a.txt", "b.txt"])
            .commit("c1", &["a.txt"]);
        vcs.failing_commit = Some("c1".to_string());
        let config = Config::default();

        let err = LearnService::new(vcs, config.clone())
            .learn(dir.path(), &[])
            .unwrap_err();

        assert_eq!(error_code(&err), ErrorCode::ExternalCall);
        assert!(!dir.path().join(&config.final_artifact).exists());
        assert!(dir.path().join(&config.temp_artifact).exists());
    }

    #[test]
    fn stale_temp_blocks_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::default();
        let temp = dir.path().join(&config.temp_artifact);
        fs::create_dir_all(temp.parent().unwrap()).unwrap();
        fs::write(&temp, b"left over").unwrap();

        let svc = LearnService::new(
            fake_repo(dir.path()).commit("c1", &["a.txt", "b.txt"]),
            config.clone(),
        );
        let err = svc.learn(dir.path(), &[]).unwrap_err();

        assert_eq!(error_code(&err), ErrorCode::PersistenceConflict);
        assert_eq!(fs::read(&temp).unwrap(), b"left over");
        assert!(!dir.path().join(&config.final_artifact).exists());
        assert!(svc.vcs.seen_filters.lock().unwrap().is_empty());
    }

    #[test]
    fn rerun_replaces_previous_artifact() {
        let dir = tempfile::TempDir::new().unwrap();

        service(fake_repo(dir.path()).commit("c1", &["a.txt", "b.txt"]))
            .learn(dir.path(), &[])
            .unwrap();
        let summary = service(
            fake_repo(dir.path())
                .commit("c2", &["x.txt", "y.txt"])
                .commit("c1", &["a.txt", "b.txt"]),
        )
        .learn(dir.path(), &[])
        .unwrap();

        let artifact = read_artifact(summary.artifact.as_std_path()).unwrap();
        assert_eq!(artifact.registry.len(), 4);
        assert_eq!(artifact.table.count("a.txt", "b.txt"), Some(2));
    }
}
