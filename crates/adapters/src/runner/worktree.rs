// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Isolated git worktree lifecycle for code-writer runs

use super::RunnerError;
use std::path::{Path, PathBuf};
use std::time::Duration;

const GIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where to carve the worktree from and what to call it.
#[derive(Debug, Clone)]
pub struct WorktreeSpec {
    pub repo_root: PathBuf,
    pub path: PathBuf,
    pub branch: String,
    /// Commit or branch to fork from; HEAD when absent.
    pub start_point: Option<String>,
}

/// A created worktree. Creation failure aborts the run; removal is
/// best-effort on every exit path.
#[derive(Debug)]
pub(super) struct Worktree {
    path: PathBuf,
    repo_root: PathBuf,
    branch: String,
}

impl Worktree {
    pub(super) async fn create(spec: &WorktreeSpec) -> Result<Self, RunnerError> {
        if let Some(parent) = spec.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RunnerError::Workspace(format!("create worktree parent: {e}")))?;
        }

        let start_point = spec.start_point.as_deref().unwrap_or("HEAD");
        let output = git(
            &spec.repo_root,
            &[
                "worktree",
                "add",
                "-b",
                &spec.branch,
                &spec.path.display().to_string(),
                start_point,
            ],
        )
        .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunnerError::Workspace(format!(
                "git worktree add failed: {}",
                stderr.trim()
            )));
        }

        Ok(Self {
            path: spec.path.clone(),
            repo_root: spec.repo_root.clone(),
            branch: spec.branch.clone(),
        })
    }

    /// Remove the worktree, its branch, and any directory remnants.
    /// Failures are logged, never raised.
    pub(super) async fn remove(self) {
        match git(
            &self.repo_root,
            &["worktree", "remove", "--force", &self.path.display().to_string()],
        )
        .await
        {
            Ok(output) if !output.status.success() => {
                tracing::warn!(
                    path = %self.path.display(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "git worktree remove failed (best-effort)"
                );
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "git worktree remove errored");
            }
            Ok(_) => {}
        }

        if let Ok(output) = git(&self.repo_root, &["branch", "-D", &self.branch]).await {
            if !output.status.success() {
                tracing::debug!(
                    branch = %self.branch,
                    "worktree branch delete failed (best-effort)"
                );
            }
        }

        // Sweep remnants in case worktree remove left the directory behind
        if self.path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove worktree directory (best-effort)"
                );
            }
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

async fn git(repo_root: &Path, args: &[&str]) -> Result<std::process::Output, RunnerError> {
    let mut cmd = tokio::process::Command::new("git");
    cmd.arg("-C")
        .arg(repo_root)
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    let output = tokio::time::timeout(GIT_TIMEOUT, cmd.output())
        .await
        .map_err(|_| RunnerError::Workspace(format!("git {} timed out", args.join(" "))))??;
    Ok(output)
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
