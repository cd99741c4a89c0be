// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue workers
//!
//! One worker function per queue, all methods on [`Orchestrator`]. The
//! architect, code-writer and reviewer workers supervise agent subprocesses
//! and report back with `agent:completed`; the orchestrator worker owns
//! every state transition.

mod architect;
mod code_writer;
mod orchestrator;
mod reviewer;

use crate::queue::Queues;
use devloop_adapters::{AgentSpawner, ChatApi, DocsApi, RunnerConfig, ScmApi, TrackerApi};
use devloop_core::DesignId;
use devloop_storage::Store;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Engine knobs, resolved from the environment by the server crate.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root of the per-design filesystem tree.
    pub designs_dir: PathBuf,
    /// Local checkout that code-writer worktrees are carved from.
    pub repo_root: PathBuf,
    /// Issue-tracker project key for parent issues and sub-tasks.
    pub issue_project: String,
    pub max_ci_retries: u32,
    pub max_review_retries: u32,
    pub agent_timeout: Duration,
    pub agent_heartbeat: Duration,
    pub keep_worktrees: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            designs_dir: PathBuf::from("designs"),
            repo_root: PathBuf::from("."),
            issue_project: "DEV".to_string(),
            max_ci_retries: 10,
            max_review_retries: 10,
            agent_timeout: Duration::from_secs(60 * 60),
            agent_heartbeat: Duration::from_secs(10 * 60),
            keep_worktrees: false,
        }
    }
}

/// The pipeline brain plus the shared dependencies every worker needs.
///
/// Workers run on their queue's pool; only the orchestrator worker (pool
/// size one) mutates the store, so no locking discipline is needed inside
/// route handlers.
pub struct Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    pub(crate) chat: C,
    pub(crate) tracker: T,
    pub(crate) docs: D,
    pub(crate) scm: S,
    pub(crate) spawner: R,
    pub(crate) store: Arc<Store>,
    pub(crate) queues: Queues,
    pub(crate) config: EngineConfig,
}

impl<C, T, D, S, R> Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chat: C,
        tracker: T,
        docs: D,
        scm: S,
        spawner: R,
        store: Arc<Store>,
        queues: Queues,
        config: EngineConfig,
    ) -> Self {
        Self { chat, tracker, docs, scm, spawner, store, queues, config }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn queues(&self) -> &Queues {
        &self.queues
    }

    pub(crate) fn design_dir(&self, design_id: &DesignId) -> PathBuf {
        self.config.designs_dir.join(design_id.as_str())
    }

    pub(crate) fn runner_config(
        &self,
        agent: &str,
        prompt: String,
        cwd: PathBuf,
    ) -> RunnerConfig {
        let mut config = RunnerConfig::new(agent, prompt, cwd);
        config.timeout = self.config.agent_timeout;
        config.heartbeat = self.config.agent_heartbeat;
        config.keep_worktree = self.config.keep_worktrees;
        config
    }
}

/// Turn a task title into a branch-safe slug.
pub(crate) fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "task".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
