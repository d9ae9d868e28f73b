use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Result, bail};
use camino::Utf8Path;
use tracing::debug;

use crate::error::LearnError;
use crate::vcs::VersionControl;

/// `git` driven as a subprocess.
pub struct GitCli {
    binary: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        debug!(dir = %dir.display(), ?args, "running {}", self.binary);
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| LearnError::external(format!("Failed to run {}: {e}", self.binary), None))?;
        Ok(output)
    }
}

/// Arguments for `git rev-list`; `--all` when no filters are given.
pub fn rev_list_args(filters: &[String]) -> Vec<&str> {
    let mut args = vec!["rev-list"];
    if filters.is_empty() {
        args.push("--all");
    } else {
        args.extend(filters.iter().map(String::as_str));
    }
    args
}

/// Strip the line terminator `git rev-parse` appends.
pub fn parse_toplevel(stdout: &str) -> String {
    stdout.trim_end_matches(['\n', '\r']).to_string()
}

pub fn parse_rev_list(stdout: &str) -> Vec<String> {
    stdout.split_whitespace().map(str::to_string).collect()
}

/// Decode `git show --name-only` output for `commit`.
///
/// File names that are not valid UTF-8 are an error. A lossy decode would
/// fold distinct names into the same replacement string.
pub fn decode_name_only(stdout: Vec<u8>, commit: &str) -> Result<Vec<String>> {
    let text = String::from_utf8(stdout).map_err(|_| {
        LearnError::external(
            format!("git listed a file name that is not UTF-8 in commit {commit}"),
            None,
        )
    })?;
    Ok(parse_name_only(&text))
}

/// Non-blank lines of `git show --name-only` output.
pub fn parse_name_only(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl VersionControl for GitCli {
    fn toplevel(&self, dir: &Path) -> Result<String> {
        let output = self.run(dir, &["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            bail!(LearnError::external(
                format!(
                    "Are you sure we're in a Git repository here? I can't find the \
                     top-level directory, and coach-learn only works in Git.\n{}",
                    stderr_of(&output)
                ),
                output.status.code(),
            ));
        }
        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            LearnError::not_a_repository("git reported a top-level directory that is not UTF-8")
        })?;
        Ok(parse_toplevel(&stdout))
    }

    fn rev_list(&self, root: &Utf8Path, filters: &[String]) -> Result<Vec<String>> {
        let output = self.run(root.as_std_path(), &rev_list_args(filters))?;
        if !output.status.success() {
            bail!(LearnError::external(
                format!(
                    "Are you sure we're in a Git repository here? I can't get any commit hashes.\n{}",
                    stderr_of(&output)
                ),
                output.status.code(),
            ));
        }
        Ok(parse_rev_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn changed_files(&self, root: &Utf8Path, commit: &str) -> Result<Vec<String>> {
        let output = self.run(
            root.as_std_path(),
            &[
                "-c",
                "core.quotePath=false",
                "show",
                "--pretty=format:",
                "--name-only",
                commit,
            ],
        )?;
        if !output.status.success() {
            bail!(LearnError::external(
                format!(
                    "I couldn't get a list of modified files for this commit: {commit}\n{}",
                    stderr_of(&output)
                ),
                output.status.code(),
            ));
        }
        decode_name_only(output.stdout, commit)
    }
}
