// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Code-writer queue worker: implementation and fix runs in isolated
//! worktrees

use super::Orchestrator;
use crate::error::EngineError;
use devloop_adapters::{
    run_agent, AgentSpawner, ChatApi, DocsApi, ScmApi, TrackerApi, WorktreeSpec,
};
use devloop_core::{AgentKind, DesignId, Event, TaskKind, TaskTier};
use std::path::PathBuf;

impl<C, T, D, S, R> Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    /// Worker for the code-writer queue.
    pub async fn handle_code_writer_job(&self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::AgentTask {
                agent: AgentKind::CodeWriter,
                task: TaskKind::Implementation,
                design_id,
                issue_key: Some(issue_key),
                branch: Some(branch),
                tier,
                comments,
                ..
            } => {
                self.implement(&design_id, &issue_key, &branch, tier, comments).await
            }
            Event::AgentTask {
                agent: AgentKind::CodeWriter,
                task,
                design_id,
                issue_key,
                pr_number: Some(pr_number),
                branch: Some(branch),
                comments,
                ..
            } if matches!(
                task,
                TaskKind::CiFix | TaskKind::ReviewFix | TaskKind::HumanFeedback
            ) =>
            {
                self.fix(&design_id, task, issue_key, pr_number, &branch, comments).await
            }
            Event::PrChangesRequested { pr_number, branch, comments }
            | Event::PrComment { pr_number, branch, comments } => {
                let Some(pr) = self.store.get_pr(pr_number)? else {
                    tracing::warn!(pr_number, "feedback for unknown pr, dropping");
                    return Ok(());
                };
                // Comment payloads do not always carry the head branch.
                let branch = if branch.is_empty() {
                    match self.scm.pr_branch(pr_number).await? {
                        Some(branch) => branch,
                        None => {
                            tracing::warn!(pr_number, "no branch for pr feedback, dropping");
                            return Ok(());
                        }
                    }
                } else {
                    branch
                };
                self.fix(
                    &pr.design_id.clone(),
                    TaskKind::HumanFeedback,
                    Some(pr.issue_key),
                    pr_number,
                    &branch,
                    comments,
                )
                .await
            }
            other => {
                tracing::warn!(kind = %other.kind(), "code-writer worker ignoring event");
                Ok(())
            }
        }
    }

    /// First implementation pass for an issue: fresh worktree on the task
    /// branch.
    async fn implement(
        &self,
        design_id: &DesignId,
        issue_key: &str,
        branch: &str,
        tier: Option<TaskTier>,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        let tier_dir = match tier {
            Some(TaskTier::Foundation) => "foundation",
            _ => "features",
        };
        let work_dir = self
            .design_dir(design_id)
            .join("implementation")
            .join(tier_dir)
            .join(issue_key);

        let prompt = self.implementation_prompt(design_id, issue_key, branch, &comments)?;
        self.run_code_writer(
            design_id,
            TaskKind::Implementation,
            Some(issue_key.to_string()),
            None,
            branch,
            branch.to_string(),
            None,
            work_dir,
            prompt,
        )
        .await
    }

    /// Follow-up pass on an existing PR branch. The worktree gets its own
    /// throwaway branch name so parallel fixes never collide.
    async fn fix(
        &self,
        design_id: &DesignId,
        task: TaskKind,
        issue_key: Option<String>,
        pr_number: u64,
        branch: &str,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        let work_dir = self
            .design_dir(design_id)
            .join("implementation")
            .join("fixes")
            .join(format!("pr-{pr_number}-{}", nanoid::nanoid!(6)));
        let worktree_branch = format!("{branch}-fix-{}", nanoid::nanoid!(6));

        let mut prompt = format!(
            "Address the following on pull request #{pr_number} (branch {branch}):\n"
        );
        if comments.is_empty() {
            prompt.push_str("- investigate the latest failure and fix it\n");
        }
        for comment in &comments {
            prompt.push_str("- ");
            prompt.push_str(comment);
            prompt.push('\n');
        }

        self.run_code_writer(
            design_id,
            task,
            issue_key,
            Some(pr_number),
            branch,
            worktree_branch,
            Some(branch.to_string()),
            work_dir,
            prompt,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_code_writer(
        &self,
        design_id: &DesignId,
        task: TaskKind,
        issue_key: Option<String>,
        pr_number: Option<u64>,
        branch: &str,
        worktree_branch: String,
        start_point: Option<String>,
        work_dir: PathBuf,
        prompt: String,
    ) -> Result<(), EngineError> {
        let mut config = self.runner_config("code_writer", prompt, work_dir.clone());
        config.worktree = Some(WorktreeSpec {
            repo_root: self.config.repo_root.clone(),
            path: work_dir,
            branch: worktree_branch,
            start_point,
        });

        let completed = match run_agent(&self.spawner, &config).await {
            Ok(run) => Event::AgentCompleted {
                agent: AgentKind::CodeWriter,
                task,
                design_id: design_id.clone(),
                issue_key,
                pr_number,
                branch: Some(branch.to_string()),
                output_key: None,
                output_path: None,
                success: run.success,
                comments: Vec::new(),
            },
            Err(e) => {
                tracing::error!(design_id = %design_id, error = %e, "code-writer run failed");
                Event::AgentCompleted {
                    agent: AgentKind::CodeWriter,
                    task,
                    design_id: design_id.clone(),
                    issue_key,
                    pr_number,
                    branch: Some(branch.to_string()),
                    output_key: None,
                    output_path: None,
                    success: false,
                    comments: vec![e.to_string()],
                }
            }
        };
        self.queues.orchestrator.push(completed);
        Ok(())
    }

    fn implementation_prompt(
        &self,
        design_id: &DesignId,
        issue_key: &str,
        branch: &str,
        comments: &[String],
    ) -> Result<String, EngineError> {
        let doc = self
            .store
            .list_outputs(design_id)?
            .into_iter()
            .filter(|o| o.key.starts_with("design_doc"))
            .next_back();
        let mut prompt = format!(
            "Implement issue {issue_key} on branch {branch} and open a pull request."
        );
        if let Some(doc) = doc {
            prompt.push_str(&format!("\nThe approved design is at {}.", doc.path.display()));
        }
        for comment in comments {
            prompt.push_str("\n- ");
            prompt.push_str(comment);
        }
        Ok(prompt)
    }
}

#[cfg(test)]
#[path = "code_writer_tests.rs"]
mod tests;
