// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Architect queue worker: design intake and revision runs

use super::Orchestrator;
use crate::error::EngineError;
use devloop_adapters::{run_agent, AgentSpawner, ChatApi, DocsApi, ScmApi, TrackerApi};
use devloop_core::{AgentKind, DesignId, Event, TaskKind};

impl<C, T, D, S, R> Orchestrator<C, T, D, S, R>
where
    C: ChatApi,
    T: TrackerApi,
    D: DocsApi,
    S: ScmApi,
    R: AgentSpawner,
{
    /// Worker for the architect queue.
    pub async fn handle_architect_job(&self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::TaskRequested {
                design_id: None,
                description,
                channel,
                thread_ts,
                sender_id,
                ..
            } => {
                self.intake(description, channel, thread_ts, sender_id).await
            }
            Event::TaskRequested { design_id: Some(design_id), .. } => {
                // Manual re-trigger of an existing design
                self.run_architect(&design_id, TaskKind::Design, Vec::new()).await
            }
            Event::PageComment { design_id, comments, .. } => {
                self.run_architect(&design_id, TaskKind::Feedback, comments).await
            }
            Event::AgentTask {
                agent: AgentKind::Architect,
                task,
                design_id,
                comments,
                ..
            } => self.run_architect(&design_id, task, comments).await,
            other => {
                tracing::warn!(kind = %other.kind(), "architect worker ignoring event");
                Ok(())
            }
        }
    }

    /// Create the design row, ack the requester, then run the first design
    /// pass.
    async fn intake(
        &self,
        description: String,
        channel: String,
        thread_ts: Option<String>,
        sender_id: String,
    ) -> Result<(), EngineError> {
        let design_id = DesignId::generate();
        self.store.create_design(&design_id, &description)?;

        let sender_name = match self.chat.user_name(&sender_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(error = %e, "could not resolve requester name");
                sender_id.clone()
            }
        };
        self.store.record_intake(
            &design_id,
            &channel,
            thread_ts.as_deref(),
            &sender_id,
            &sender_name,
        )?;
        tracing::info!(design_id = %design_id, requester = %sender_name, "design intake");

        if let Err(e) = self
            .chat
            .post_message(&channel, "Got it — starting design", thread_ts.as_deref())
            .await
        {
            tracing::warn!(error = %e, "intake ack failed");
        }

        self.run_architect(&design_id, TaskKind::Design, Vec::new()).await
    }

    /// Supervise one architect run and report the outcome to the
    /// orchestrator queue.
    async fn run_architect(
        &self,
        design_id: &DesignId,
        task: TaskKind,
        comments: Vec<String>,
    ) -> Result<(), EngineError> {
        let design = self.store.get_design(design_id)?;
        let dir = self.design_dir(design_id).join("design");
        tokio::fs::create_dir_all(&dir).await?;

        let revision = self
            .store
            .list_outputs(design_id)?
            .iter()
            .filter(|o| o.key.starts_with("design_doc"))
            .count();
        let key = if revision == 0 {
            "design_doc".to_string()
        } else {
            format!("design_doc.r{revision}")
        };

        let mut prompt = format!(
            "Write a design document for the following request.\n\n{}\n\n\
             End the document with an '## Implementation Plan' section listing \
             one task per bullet, tagged foundation: or feature:.",
            design.description
        );
        if !comments.is_empty() {
            prompt.push_str("\n\nAddress this feedback from the previous revision:\n");
            for comment in &comments {
                prompt.push_str("- ");
                prompt.push_str(comment);
                prompt.push('\n');
            }
        }

        let config = self.runner_config("architect", prompt, dir.clone());
        let completed = match run_agent(&self.spawner, &config).await {
            Ok(run) => {
                let path = dir.join(format!("{key}.md"));
                tokio::fs::write(&path, run.report.result.clone().unwrap_or_default()).await?;
                Event::AgentCompleted {
                    agent: AgentKind::Architect,
                    task,
                    design_id: design_id.clone(),
                    issue_key: None,
                    pr_number: None,
                    branch: None,
                    output_key: Some(key),
                    output_path: Some(path),
                    success: run.success,
                    comments: Vec::new(),
                }
            }
            Err(e) => {
                tracing::error!(design_id = %design_id, error = %e, "architect run failed");
                Event::AgentCompleted {
                    agent: AgentKind::Architect,
                    task,
                    design_id: design_id.clone(),
                    issue_key: None,
                    pr_number: None,
                    branch: None,
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
}

#[cfg(test)]
#[path = "architect_tests.rs"]
mod tests;
