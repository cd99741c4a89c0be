// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator queue worker: the route map and every state transition
//!
//! This worker runs at concurrency one. All design and PR mutations happen
//! here, so the end-to-end transitions of any one design are totally
//! ordered without locks.

use super::{slugify, Orchestrator};
use crate::error::EngineError;
use devloop_adapters::{AgentSpawner, ChatApi, DocsApi, IssueFields, ScmApi, TrackerApi};
use devloop_core::{
    classify_ci_failure, parse_plan, AgentKind, CheckStatus, Design, DesignId, DesignStage,
    DesignStatus, Event, FailureClass, PlanTask, PrStage, TaskKind, TaskTier,
};
use devloop_storage::StoreError;
use std::path::PathBuf;

impl<C, T, D, S, R> Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    /// Worker for the orchestrator queue.
    pub async fn handle_orchestrator_event(&self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::AgentCompleted {
                agent,
                task,
                design_id,
                issue_key,
                pr_number,
                branch,
                output_key,
                output_path,
                success,
                comments,
            } => {
                self.route(
                    agent, task, design_id, issue_key, pr_number, branch, output_key,
                    output_path, success, comments,
                )
                .await
            }
            Event::PageApproved { page_id, design_id } => {
                self.on_page_approved(&page_id, &design_id).await
            }
            Event::StageCompleted { design_id, stage: DesignStage::Design } => {
                self.fan_out_implementation(&design_id).await
            }
            Event::StageCompleted { .. } => Ok(()),
            Event::CiFailed { pr_number, branch, check_run_id } => {
                self.on_ci_failed(pr_number, &branch, check_run_id).await
            }
            Event::CiPassed { pr_number, .. } => self.on_ci_passed(pr_number).await,
            Event::PrApproved { pr_number, .. } => self.on_pr_approved(pr_number).await,
            Event::PrMerged { pr_number, .. } => self.on_pr_merged(pr_number).await,
            other => {
                tracing::warn!(kind = %other.kind(), "orchestrator ignoring event");
                Ok(())
            }
        }
    }

    /// `(agent, task) → next step`. Unknown pairs log and return.
    #[allow(clippy::too_many_arguments)]
    async fn route(
        &self,
        agent: AgentKind,
        task: TaskKind,
        design_id: DesignId,
        issue_key: Option<String>,
        pr_number: Option<u64>,
        branch: Option<String>,
        output_key: Option<String>,
        output_path: Option<PathBuf>,
        success: bool,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        match (agent, task) {
            (AgentKind::Architect, TaskKind::Design)
            | (AgentKind::Architect, TaskKind::Feedback) => {
                self.on_architect_done(&design_id, task, output_key, output_path, success, comments)
                    .await
            }
            (AgentKind::Reviewer, TaskKind::DesignReview) => {
                self.on_design_reviewed(&design_id, output_path, success, comments).await
            }
            (AgentKind::CodeWriter, TaskKind::Implementation) => {
                self.on_implementation_done(&design_id, issue_key, branch, success).await
            }
            (AgentKind::CodeWriter, TaskKind::CiFix) => {
                self.on_ci_fix_done(&design_id, pr_number, branch, success).await
            }
            (AgentKind::CodeWriter, TaskKind::ReviewFix)
            | (AgentKind::CodeWriter, TaskKind::HumanFeedback) => {
                self.on_code_fix_done(&design_id, task, pr_number, branch, success).await
            }
            (AgentKind::Reviewer, TaskKind::CodeReview) => {
                self.on_code_reviewed(&design_id, pr_number, success, comments).await
            }
            (agent, task) => {
                tracing::warn!(agent = %agent, task = %task, "no route for completion");
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // design loop
    // ------------------------------------------------------------------

    async fn on_architect_done(
        &self,
        design_id: &DesignId,
        task: TaskKind,
        output_key: Option<String>,
        output_path: Option<PathBuf>,
        success: bool,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        let design = self.store.get_design(design_id)?;
        if design.status == DesignStatus::Failed {
            tracing::warn!(design_id = %design_id, "ignoring completion for failed design");
            return Ok(());
        }

        if success {
            if let (Some(key), Some(path)) = (output_key, output_path) {
                self.store.record_output(design_id, &key, &path)?;
                self.queues.reviewer.push(Event::AgentTask {
                    agent: AgentKind::Reviewer,
                    task: TaskKind::DesignReview,
                    design_id: design_id.clone(),
                    issue_key: None,
                    pr_number: None,
                    branch: None,
                    tier: None,
                    comments: Vec::new(),
                });
                return Ok(());
            }
            tracing::warn!(design_id = %design_id, "architect succeeded without output");
        }

        self.retry_design_or_fail(design_id, task, comments, "architect run failed").await
    }

    async fn on_design_reviewed(
        &self,
        design_id: &DesignId,
        output_path: Option<PathBuf>,
        success: bool,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        let design = self.store.get_design(design_id)?;
        if design.status == DesignStatus::Failed {
            return Ok(());
        }

        if !success {
            return self
                .retry_design_or_fail(
                    design_id,
                    TaskKind::Feedback,
                    comments,
                    "design review attempts exhausted",
                )
                .await;
        }

        let path = match output_path {
            Some(path) => path,
            None => {
                self.latest_design_doc(design_id)?
                    .ok_or_else(|| EngineError::Invalid("no design doc to publish".to_string()))?
            }
        };
        let content = tokio::fs::read_to_string(&path).await?;
        let title = page_title(&design);

        if let Some(page_id) = design.page_id.clone() {
            // Revision of an already published page: bump the version.
            let version = self
                .docs
                .find_page(&title)
                .await?
                .map(|p| p.version + 1)
                .unwrap_or(2);
            self.docs.update_page(&page_id, &title, &content, version).await?;
            self.docs.set_content_state(&page_id, "content-state", "In Review").await?;
            self.notify_design(design_id, "Design updated, back in review").await;
        } else {
            // findPage before createPage: re-running this route must not
            // publish twice.
            let page_id = match self.docs.find_page(&title).await? {
                Some(page) => page.id,
                None => self.docs.create_page(&title, &content, None).await?,
            };
            self.store.set_design_page_id(design_id, &page_id)?;
            self.docs.set_content_state(&page_id, "content-state", "In Review").await?;
            self.notify_design(
                design_id,
                &format!("Design ready for review: {title} (page {page_id})"),
            )
            .await;
        }
        Ok(())
    }

    /// Shared failure path for the design loop: count the attempt, fail the
    /// design at the cap, re-enqueue the architect otherwise.
    async fn retry_design_or_fail(
        &self,
        design_id: &DesignId,
        task: TaskKind,
        comments: Vec<String>,
        reason: &str,
    ) -> Result<(), EngineError> {
        let design = self.store.get_design(design_id)?;
        if design.review_attempts >= self.config.max_review_retries {
            self.store.update_design_status(design_id, DesignStatus::Failed)?;
            self.notify_design(design_id, &format!("Failed: {reason}")).await;
            return Ok(());
        }
        let attempts = self.store.increment_design_review_attempts(design_id)?;
        tracing::info!(design_id = %design_id, attempts, "re-enqueueing architect");
        self.queues.architect.push(Event::AgentTask {
            agent: AgentKind::Architect,
            task,
            design_id: design_id.clone(),
            issue_key: None,
            pr_number: None,
            branch: None,
            tier: None,
            comments,
        });
        Ok(())
    }

    async fn on_page_approved(
        &self,
        page_id: &str,
        design_id: &DesignId,
    ) -> Result<(), EngineError> {
        let design = match self.store.get_design(design_id) {
            Ok(design) => design,
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(design_id = %design_id, page_id, "approved page for unknown design");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        // Polling re-detects the approved state every tick; only the first
        // observation advances the pipeline.
        if design.stage != DesignStage::Design || design.status != DesignStatus::Running {
            return Ok(());
        }
        self.store.update_design_status(design_id, DesignStatus::Approved)?;
        tracing::info!(design_id = %design_id, page_id, "design approved");
        self.queues.orchestrator.push(Event::StageCompleted {
            design_id: design_id.clone(),
            stage: DesignStage::Design,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // implementation fan-out
    // ------------------------------------------------------------------

    async fn fan_out_implementation(&self, design_id: &DesignId) -> Result<(), EngineError> {
        let design = self.store.get_design(design_id)?;
        if design.stage != DesignStage::Design {
            tracing::warn!(design_id = %design_id, stage = %design.stage, "fan-out already done");
            return Ok(());
        }

        let plan = self.load_plan(design_id).await?;
        if plan.is_empty() {
            self.store.update_design_status(design_id, DesignStatus::Failed)?;
            self.notify_design(design_id, "Failed: approved design has no implementation plan")
                .await;
            return Ok(());
        }

        // getSubTasks before createSubTask: a re-run reuses existing issues
        // by summary match.
        let parent_key = match design.parent_key.clone() {
            Some(key) => key,
            None => {
                let key = self
                    .tracker
                    .create_issue(IssueFields {
                        project: self.config.issue_project.clone(),
                        summary: first_line(&design.description).to_string(),
                        description: design.description.clone(),
                        issue_type: "Task".to_string(),
                    })
                    .await?;
                self.store.set_design_parent_key(design_id, &key)?;
                key
            }
        };

        let existing = self.tracker.get_sub_tasks(&parent_key).await?;
        let mut keyed: Vec<(PlanTask, String)> = Vec::with_capacity(plan.len());
        for task in plan {
            let key = match existing.iter().find(|s| s.summary == task.title) {
                Some(sub) => sub.key.clone(),
                None => {
                    self.tracker
                        .create_sub_task(
                            &parent_key,
                            IssueFields {
                                project: self.config.issue_project.clone(),
                                summary: task.title.clone(),
                                description: task.summary.clone(),
                                issue_type: String::new(),
                            },
                        )
                        .await?
                }
            };
            keyed.push((task, key));
        }

        self.store.advance_design_stage(design_id, DesignStage::Implementation)?;
        self.notify_design(design_id, "Implementation started").await;

        let foundation: Vec<&(PlanTask, String)> =
            keyed.iter().filter(|(t, _)| t.tier == TaskTier::Foundation).collect();
        if let Some((task, key)) = foundation.first() {
            tracing::info!(design_id = %design_id, issue = %key, "starting foundation");
            self.enqueue_implementation(design_id, task, key);
        } else {
            for (task, key) in &keyed {
                self.enqueue_implementation(design_id, task, key);
            }
        }
        Ok(())
    }

    fn enqueue_implementation(&self, design_id: &DesignId, task: &PlanTask, issue_key: &str) {
        let branch =
            format!("feature/{}-{}", issue_key.to_lowercase(), slugify(&task.title));
        self.queues.code_writer.push(Event::AgentTask {
            agent: AgentKind::CodeWriter,
            task: TaskKind::Implementation,
            design_id: design_id.clone(),
            issue_key: Some(issue_key.to_string()),
            pr_number: None,
            branch: Some(branch),
            tier: Some(task.tier),
            comments: Vec::new(),
        });
    }

    async fn on_implementation_done(
        &self,
        design_id: &DesignId,
        issue_key: Option<String>,
        branch: Option<String>,
        success: bool,
    ) -> Result<(), EngineError> {
        let Some(branch) = branch else {
            tracing::warn!(design_id = %design_id, "implementation completed without a branch");
            return Ok(());
        };
        if !success {
            self.notify_design(
                design_id,
                &format!("Failed: implementation on {branch} did not complete"),
            )
            .await;
            return Ok(());
        }

        // Verify the PR actually exists before tracking it.
        let Some(pr) = self.scm.find_pr(&branch).await? else {
            self.notify_design(design_id, &format!("Failed: no pull request on {branch}"))
                .await;
            return Ok(());
        };

        if self.store.get_pr(pr.number)?.is_none() {
            let design = self.store.get_design(design_id)?;
            let issue_key = issue_key
                .or_else(|| devloop_core::issue_key_from_branch(&branch))
                .unwrap_or_default();
            let slug = branch
                .strip_prefix("feature/")
                .and_then(|rest| rest.strip_prefix(&format!("{}-", issue_key.to_lowercase())))
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            self.store.create_pr(
                pr.number,
                design_id,
                &issue_key,
                design.parent_key.as_deref(),
                slug.as_deref(),
            )?;
            tracing::info!(design_id = %design_id, pr_number = pr.number, "tracking new pr");
        }

        // CI starts on push; the automated review gate starts here.
        self.queues.reviewer.push(Event::AgentTask {
            agent: AgentKind::Reviewer,
            task: TaskKind::CodeReview,
            design_id: design_id.clone(),
            issue_key: None,
            pr_number: Some(pr.number),
            branch: Some(branch),
            tier: None,
            comments: Vec::new(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // CI loop
    // ------------------------------------------------------------------

    async fn on_ci_failed(
        &self,
        pr_number: u64,
        branch: &str,
        check_run_id: Option<u64>,
    ) -> Result<(), EngineError> {
        let Some(pr) = self.store.get_pr(pr_number)? else {
            tracing::warn!(pr_number, branch, "ci failure for untracked pr");
            return Ok(());
        };
        if pr.stage.is_terminal() {
            return Ok(());
        }
        self.store.update_ci_status(pr_number, CheckStatus::Failing)?;

        let logs = match check_run_id {
            Some(run_id) => match self.scm.check_run_logs(run_id).await {
                Ok(logs) => logs,
                Err(e) => {
                    tracing::warn!(pr_number, run_id, error = %e, "could not fetch check logs");
                    String::new()
                }
            },
            None => String::new(),
        };
        let class = classify_ci_failure(&logs);
        tracing::info!(pr_number, class = %class, "ci failure triaged");

        match class {
            FailureClass::Environment => {
                self.notify_design(
                    &pr.design_id,
                    &format!("Failed: CI environment problem on PR #{pr_number}, needs a human"),
                )
                .await;
            }
            FailureClass::Flaky => {
                if pr.last_flaky {
                    // Second flaky in a row: escalate instead of retrying.
                    self.notify_design(
                        &pr.design_id,
                        &format!("Failed: CI flaking repeatedly on PR #{pr_number}"),
                    )
                    .await;
                } else {
                    self.store.set_last_flaky(pr_number, true)?;
                    self.enqueue_ci_fix(&pr.design_id, &pr.issue_key, pr_number, branch);
                }
            }
            FailureClass::AgentFixable => {
                if pr.ci_attempts >= self.config.max_ci_retries {
                    self.store.update_pr_stage(pr_number, PrStage::Failed)?;
                    self.notify_design(
                        &pr.design_id,
                        &format!("Failed: CI attempts exhausted on PR #{pr_number}"),
                    )
                    .await;
                } else {
                    self.store.increment_ci_attempts(pr_number)?;
                    self.store.set_last_flaky(pr_number, false)?;
                    self.enqueue_ci_fix(&pr.design_id, &pr.issue_key, pr_number, branch);
                }
            }
        }
        Ok(())
    }

    fn enqueue_ci_fix(
        &self,
        design_id: &DesignId,
        issue_key: &str,
        pr_number: u64,
        branch: &str,
    ) {
        self.queues.code_writer.push(Event::AgentTask {
            agent: AgentKind::CodeWriter,
            task: TaskKind::CiFix,
            design_id: design_id.clone(),
            issue_key: Some(issue_key.to_string()),
            pr_number: Some(pr_number),
            branch: Some(branch.to_string()),
            tier: None,
            comments: Vec::new(),
        });
    }

    async fn on_ci_passed(&self, pr_number: u64) -> Result<(), EngineError> {
        let Some(pr) = self.store.get_pr(pr_number)? else {
            tracing::warn!(pr_number, "ci pass for untracked pr");
            return Ok(());
        };
        if pr.stage.is_terminal() {
            return Ok(());
        }
        self.store.update_ci_status(pr_number, CheckStatus::Passing)?;
        self.store.set_last_flaky(pr_number, false)?;
        self.check_ready_for_human(pr_number).await
    }

    async fn on_ci_fix_done(
        &self,
        design_id: &DesignId,
        pr_number: Option<u64>,
        branch: Option<String>,
        success: bool,
    ) -> Result<(), EngineError> {
        let (Some(pr_number), Some(branch)) = (pr_number, branch) else {
            tracing::warn!(design_id = %design_id, "ci fix completed without pr context");
            return Ok(());
        };
        let Some(pr) = self.store.get_pr(pr_number)? else {
            return Ok(());
        };
        if pr.stage.is_terminal() {
            return Ok(());
        }

        if success {
            // Fresh CI run reports the real outcome.
            self.store.update_ci_status(pr_number, CheckStatus::Pending)?;
            return Ok(());
        }
        if pr.ci_attempts >= self.config.max_ci_retries {
            self.store.update_pr_stage(pr_number, PrStage::Failed)?;
            self.notify_design(
                design_id,
                &format!("Failed: CI attempts exhausted on PR #{pr_number}"),
            )
            .await;
            return Ok(());
        }
        self.store.increment_ci_attempts(pr_number)?;
        self.enqueue_ci_fix(design_id, &pr.issue_key, pr_number, &branch);
        Ok(())
    }

    // ------------------------------------------------------------------
    // review loop
    // ------------------------------------------------------------------

    async fn on_code_reviewed(
        &self,
        design_id: &DesignId,
        pr_number: Option<u64>,
        success: bool,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        let Some(pr_number) = pr_number else {
            tracing::warn!(design_id = %design_id, "code review completed without a pr");
            return Ok(());
        };
        let Some(pr) = self.store.get_pr(pr_number)? else {
            return Ok(());
        };
        if pr.stage.is_terminal() {
            return Ok(());
        }

        if success {
            self.store.update_review_status(pr_number, CheckStatus::Passing)?;
            return self.check_ready_for_human(pr_number).await;
        }

        self.store.update_review_status(pr_number, CheckStatus::Failing)?;
        if pr.review_attempts >= self.config.max_review_retries {
            self.store.update_pr_stage(pr_number, PrStage::Failed)?;
            self.notify_design(
                design_id,
                &format!("Failed: review attempts exhausted on PR #{pr_number}"),
            )
            .await;
            return Ok(());
        }
        self.store.increment_review_attempts(pr_number)?;
        let branch = pr_branch_of(&pr);
        self.queues.code_writer.push(Event::AgentTask {
            agent: AgentKind::CodeWriter,
            task: TaskKind::ReviewFix,
            design_id: design_id.clone(),
            issue_key: Some(pr.issue_key),
            pr_number: Some(pr_number),
            branch: Some(branch),
            tier: None,
            comments,
        });
        Ok(())
    }

    async fn on_code_fix_done(
        &self,
        design_id: &DesignId,
        task: TaskKind,
        pr_number: Option<u64>,
        branch: Option<String>,
        success: bool,
    ) -> Result<(), EngineError> {
        let Some(pr_number) = pr_number else {
            tracing::warn!(design_id = %design_id, task = %task, "fix completed without a pr");
            return Ok(());
        };
        let Some(pr) = self.store.get_pr(pr_number)? else {
            return Ok(());
        };
        if pr.stage.is_terminal() {
            return Ok(());
        }

        if success {
            // Reviewer re-run confirms the fix.
            self.queues.reviewer.push(Event::AgentTask {
                agent: AgentKind::Reviewer,
                task: TaskKind::CodeReview,
                design_id: design_id.clone(),
                issue_key: None,
                pr_number: Some(pr_number),
                branch,
                tier: None,
                comments: Vec::new(),
            });
            return Ok(());
        }

        if pr.review_attempts >= self.config.max_review_retries {
            self.store.update_pr_stage(pr_number, PrStage::Failed)?;
            self.notify_design(
                design_id,
                &format!("Failed: fix attempts exhausted on PR #{pr_number}"),
            )
            .await;
            return Ok(());
        }
        self.store.increment_review_attempts(pr_number)?;
        self.queues.code_writer.push(Event::AgentTask {
            agent: AgentKind::CodeWriter,
            task,
            design_id: design_id.clone(),
            issue_key: Some(pr.issue_key),
            pr_number: Some(pr_number),
            branch,
            tier: None,
            comments: Vec::new(),
        });
        Ok(())
    }

    async fn check_ready_for_human(&self, pr_number: u64) -> Result<(), EngineError> {
        if !self.store.ready_for_human(pr_number)? {
            return Ok(());
        }
        let Some(pr) = self.store.get_pr(pr_number)? else {
            return Ok(());
        };
        if self.store.update_pr_stage(pr_number, PrStage::InReview)? {
            let url = match self.scm.get_pr(pr_number).await {
                Ok(Some(remote)) => remote.url,
                _ => format!("#{pr_number}"),
            };
            self.notify_design(
                &pr.design_id,
                &format!("PR ready for human review: {url}"),
            )
            .await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // merge gate
    // ------------------------------------------------------------------

    async fn on_pr_approved(&self, pr_number: u64) -> Result<(), EngineError> {
        let Some(pr) = self.store.get_pr(pr_number)? else {
            tracing::warn!(pr_number, "approval for untracked pr");
            return Ok(());
        };
        if pr.stage.is_terminal() {
            return Ok(());
        }

        // getPR before mergePR: skip the merge when it already happened.
        match self.scm.get_pr(pr_number).await? {
            Some(remote) if remote.merged => {
                tracing::info!(pr_number, "pr already merged, skipping merge call");
            }
            Some(_) => self.scm.merge_pr(pr_number).await?,
            None => {
                tracing::warn!(pr_number, "approved pr not found in source control");
                return Ok(());
            }
        }
        self.finish_merged_pr(pr_number).await
    }

    async fn on_pr_merged(&self, pr_number: u64) -> Result<(), EngineError> {
        if self.store.get_pr(pr_number)?.is_none() {
            tracing::warn!(pr_number, "merge event for untracked pr");
            return Ok(());
        }
        self.finish_merged_pr(pr_number).await
    }

    /// Mark the PR merged exactly once, transition its sub-task, then fan
    /// out features after a foundation merge and close out the design after
    /// the last one.
    async fn finish_merged_pr(&self, pr_number: u64) -> Result<(), EngineError> {
        // The stage transition is the idempotency gate: approval-driven and
        // webhook-driven merges both land here.
        if !self.store.update_pr_stage(pr_number, PrStage::Merged)? {
            return Ok(());
        }
        let Some(pr) = self.store.get_pr(pr_number)? else {
            return Ok(());
        };

        if let Err(e) = self.tracker.transition(&pr.issue_key, "Done").await {
            tracing::warn!(issue = %pr.issue_key, error = %e, "sub-task transition failed");
        }
        self.notify_design(&pr.design_id, &format!("PR merged: #{pr_number}")).await;

        let design = self.store.get_design(&pr.design_id)?;
        let plan = self.load_plan(&pr.design_id).await.unwrap_or_default();

        // Foundation merged: fan out the feature tasks now.
        if design.stage == DesignStage::Implementation {
            if let Some(parent_key) = design.parent_key.clone() {
                self.fan_out_features_if_foundation(&design, &plan, &parent_key, &pr.issue_key)
                    .await?;
            }
        }

        // Merge gate: every sibling merged and every planned task has a PR.
        let prs = self.store.list_prs_for_design(&pr.design_id)?;
        if self.store.all_siblings_merged(&pr.design_id)?
            && !plan.is_empty()
            && prs.len() >= plan.len()
        {
            if let Some(parent_key) = design.parent_key.as_deref() {
                if let Err(e) = self.tracker.transition(parent_key, "Done").await {
                    tracing::warn!(issue = parent_key, error = %e, "parent transition failed");
                }
            }
            self.store.advance_design_stage(&pr.design_id, DesignStage::Complete)?;
            self.notify_design(&pr.design_id, "All PRs merged, design complete").await;
        }
        Ok(())
    }

    async fn fan_out_features_if_foundation(
        &self,
        design: &Design,
        plan: &[PlanTask],
        parent_key: &str,
        merged_issue_key: &str,
    ) -> Result<(), EngineError> {
        let Some(foundation) = plan.iter().find(|t| t.tier == TaskTier::Foundation) else {
            return Ok(());
        };
        let subtasks = self.tracker.get_sub_tasks(parent_key).await?;
        let foundation_key = subtasks
            .iter()
            .find(|s| s.summary == foundation.title)
            .map(|s| s.key.clone());
        if foundation_key.as_deref() != Some(merged_issue_key) {
            return Ok(());
        }

        tracing::info!(design_id = %design.id, "foundation merged, fanning out features");
        for task in plan.iter().filter(|t| t.tier == TaskTier::Feature) {
            let Some(sub) = subtasks.iter().find(|s| s.summary == task.title) else {
                tracing::warn!(task = %task.title, "feature task has no sub-task issue");
                continue;
            };
            self.enqueue_implementation(&design.id, task, &sub.key);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // shared helpers
    // ------------------------------------------------------------------

    fn latest_design_doc(
        &self,
        design_id: &DesignId,
    ) -> Result<Option<PathBuf>, EngineError> {
        Ok(self
            .store
            .list_outputs(design_id)?
            .into_iter()
            .filter(|o| o.key.starts_with("design_doc"))
            .next_back()
            .map(|o| o.path))
    }

    async fn load_plan(&self, design_id: &DesignId) -> Result<Vec<PlanTask>, EngineError> {
        let Some(path) = self.latest_design_doc(design_id)? else {
            return Ok(Vec::new());
        };
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(parse_plan(&content))
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}

fn page_title(design: &Design) -> String {
    let mut summary = first_line(&design.description).to_string();
    if summary.len() > 80 {
        let mut end = 80;
        while !summary.is_char_boundary(end) {
            end -= 1;
        }
        summary.truncate(end);
    }
    format!("[{}] {}", design.id, summary)
}

fn pr_branch_of(pr: &devloop_core::PrState) -> String {
    let slug = pr.feature_slug.clone().unwrap_or_default();
    if slug.is_empty() {
        format!("feature/{}", pr.issue_key.to_lowercase())
    } else {
        format!("feature/{}-{}", pr.issue_key.to_lowercase(), slug)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
