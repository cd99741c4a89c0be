// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reviewer queue worker: automated design and code review gates

use super::Orchestrator;
use crate::error::EngineError;
use devloop_adapters::{run_agent, AgentSpawner, ChatApi, DocsApi, ScmApi, TrackerApi};
use devloop_core::{review_verdict, AgentKind, DesignId, Event, ReviewVerdict, TaskKind};

impl<C, T, D, S, R> Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    /// Worker for the reviewer queue.
    pub async fn handle_reviewer_job(&self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::AgentTask {
                agent: AgentKind::Reviewer,
                task: TaskKind::DesignReview,
                design_id,
                ..
            } => self.review_design(&design_id).await,
            Event::AgentTask {
                agent: AgentKind::Reviewer,
                task: TaskKind::CodeReview,
                design_id,
                pr_number: Some(pr_number),
                branch,
                ..
            } => self.review_code(&design_id, pr_number, branch).await,
            other => {
                tracing::warn!(kind = %other.kind(), "reviewer worker ignoring event");
                Ok(())
            }
        }
    }

    async fn review_design(&self, design_id: &DesignId) -> Result<(), EngineError> {
        let latest = self
            .store
            .list_outputs(design_id)?
            .into_iter()
            .filter(|o| o.key.starts_with("design_doc"))
            .next_back();
        let Some(latest) = latest else {
            tracing::warn!(design_id = %design_id, "no design doc to review");
            return Ok(());
        };

        let prompt = format!(
            "Review the design document at {}. Check completeness, feasibility \
             and the implementation plan. Reply APPROVED on the first line if it \
             passes; otherwise list the required changes.",
            latest.path.display()
        );
        let config =
            self.runner_config("reviewer", prompt, self.design_dir(design_id).join("design"));
        let (success, comments) = self.verdict_of(run_agent(&self.spawner, &config).await);

        self.queues.orchestrator.push(Event::AgentCompleted {
            agent: AgentKind::Reviewer,
            task: TaskKind::DesignReview,
            design_id: design_id.clone(),
            issue_key: None,
            pr_number: None,
            branch: None,
            output_key: Some(latest.key),
            output_path: Some(latest.path),
            success,
            comments,
        });
        Ok(())
    }

    async fn review_code(
        &self,
        design_id: &DesignId,
        pr_number: u64,
        branch: Option<String>,
    ) -> Result<(), EngineError> {
        let prompt = format!(
            "Review pull request #{pr_number}. Reply APPROVED on the first line \
             if it passes; otherwise list the required changes."
        );
        let config =
            self.runner_config("reviewer", prompt, self.config.repo_root.clone());
        let (success, comments) = self.verdict_of(run_agent(&self.spawner, &config).await);

        self.queues.orchestrator.push(Event::AgentCompleted {
            agent: AgentKind::Reviewer,
            task: TaskKind::CodeReview,
            design_id: design_id.clone(),
            issue_key: None,
            pr_number: Some(pr_number),
            branch,
            output_key: None,
            output_path: None,
            success,
            comments,
        });
        Ok(())
    }

    /// Success means the process exited cleanly and the verdict approved.
    fn verdict_of(
        &self,
        run: Result<devloop_adapters::AgentRun, devloop_adapters::RunnerError>,
    ) -> (bool, Vec<String>) {
        match run {
            Ok(run) if run.success => {
                match review_verdict(run.report.result.as_deref().unwrap_or_default()) {
                    ReviewVerdict::Approved => (true, Vec::new()),
                    ReviewVerdict::ChangesRequested(feedback) => (false, feedback),
                }
            }
            Ok(run) => {
                tracing::warn!(heartbeat_expired = run.heartbeat_expired, "reviewer run failed");
                (false, vec!["automated review run failed".to_string()])
            }
            Err(e) => {
                tracing::error!(error = %e, "reviewer run errored");
                (false, vec![format!("automated review errored: {e}")])
            }
        }
    }
}

#[cfg(test)]
#[path = "reviewer_tests.rs"]
mod tests;
