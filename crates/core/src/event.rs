// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types that drive the orchestration pipeline
//!
//! Serializes with `{"type": "domain:action", ...fields}` format.
//! Unknown type tags deserialize to `Custom`.

use crate::agent::{AgentKind, TaskKind};
use crate::design::DesignStage;
use crate::id::DesignId;
use crate::plan::TaskTier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where an event entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Chat,
    Docs,
    Scm,
    Internal,
}

/// Domain events flowing through the dispatch fabric.
///
/// Comment-carrying variants always hold an ordered sequence, even when a
/// single comment arrived. Variants carry paths and ids, never file content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- chat --
    /// A human asked for work through the chat channel.
    #[serde(rename = "task:requested")]
    TaskRequested {
        /// Present only on manual re-triggers of an existing design.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        design_id: Option<DesignId>,
        description: String,
        channel: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thread_ts: Option<String>,
        sender_id: String,
        sender_name: String,
    },

    // -- document store --
    #[serde(rename = "page:approved")]
    PageApproved { page_id: String, design_id: DesignId },

    #[serde(rename = "page:comment")]
    PageComment {
        page_id: String,
        design_id: DesignId,
        comments: Vec<String>,
    },

    // -- source control --
    #[serde(rename = "pr:changes_requested")]
    PrChangesRequested {
        pr_number: u64,
        branch: String,
        comments: Vec<String>,
    },

    #[serde(rename = "pr:comment")]
    PrComment {
        pr_number: u64,
        branch: String,
        comments: Vec<String>,
    },

    #[serde(rename = "pr:approved")]
    PrApproved { pr_number: u64, branch: String },

    #[serde(rename = "pr:merged")]
    PrMerged { pr_number: u64, branch: String },

    #[serde(rename = "ci:failed")]
    CiFailed {
        pr_number: u64,
        branch: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        check_run_id: Option<u64>,
    },

    #[serde(rename = "ci:passed")]
    CiPassed { pr_number: u64, branch: String },

    // -- internal --
    /// A queue worker finished supervising an agent subprocess.
    #[serde(rename = "agent:completed")]
    AgentCompleted {
        agent: AgentKind,
        task: TaskKind,
        design_id: DesignId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_number: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        /// Output index key (`design_doc`, `design_doc.r1`, ...) when the
        /// agent produced a file.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_path: Option<PathBuf>,
        success: bool,
        /// Reviewer feedback lines; empty for non-reviewer completions.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        comments: Vec<String>,
    },

    /// A pipeline stage finished for a design.
    #[serde(rename = "stage:completed")]
    StageCompleted {
        design_id: DesignId,
        stage: DesignStage,
    },

    /// Job descriptor the orchestrator pushes onto an agent queue.
    #[serde(rename = "agent:task")]
    AgentTask {
        agent: AgentKind,
        task: TaskKind,
        design_id: DesignId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_number: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        /// Foundation or feature, for implementation tasks.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tier: Option<TaskTier>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        comments: Vec<String>,
    },

    /// Catch-all for unknown event types (extensibility)
    #[serde(other, skip_serializing)]
    Custom,
}

/// Discriminant of an [`Event`], used for routing predicates and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TaskRequested,
    PageApproved,
    PageComment,
    PrChangesRequested,
    PrComment,
    PrApproved,
    PrMerged,
    CiFailed,
    CiPassed,
    AgentCompleted,
    StageCompleted,
    AgentTask,
    Custom,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskRequested => "task:requested",
            EventKind::PageApproved => "page:approved",
            EventKind::PageComment => "page:comment",
            EventKind::PrChangesRequested => "pr:changes_requested",
            EventKind::PrComment => "pr:comment",
            EventKind::PrApproved => "pr:approved",
            EventKind::PrMerged => "pr:merged",
            EventKind::CiFailed => "ci:failed",
            EventKind::CiPassed => "ci:passed",
            EventKind::AgentCompleted => "agent:completed",
            EventKind::StageCompleted => "stage:completed",
            EventKind::AgentTask => "agent:task",
            EventKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TaskRequested { .. } => EventKind::TaskRequested,
            Event::PageApproved { .. } => EventKind::PageApproved,
            Event::PageComment { .. } => EventKind::PageComment,
            Event::PrChangesRequested { .. } => EventKind::PrChangesRequested,
            Event::PrComment { .. } => EventKind::PrComment,
            Event::PrApproved { .. } => EventKind::PrApproved,
            Event::PrMerged { .. } => EventKind::PrMerged,
            Event::CiFailed { .. } => EventKind::CiFailed,
            Event::CiPassed { .. } => EventKind::CiPassed,
            Event::AgentCompleted { .. } => EventKind::AgentCompleted,
            Event::StageCompleted { .. } => EventKind::StageCompleted,
            Event::AgentTask { .. } => EventKind::AgentTask,
            Event::Custom => EventKind::Custom,
        }
    }

    pub fn source(&self) -> EventSource {
        match self.kind() {
            EventKind::TaskRequested => EventSource::Chat,
            EventKind::PageApproved | EventKind::PageComment => EventSource::Docs,
            EventKind::PrChangesRequested
            | EventKind::PrComment
            | EventKind::PrApproved
            | EventKind::PrMerged
            | EventKind::CiFailed
            | EventKind::CiPassed => EventSource::Scm,
            EventKind::AgentCompleted
            | EventKind::StageCompleted
            | EventKind::AgentTask
            | EventKind::Custom => EventSource::Internal,
        }
    }

    /// PR number for source-control events, if this event carries one.
    pub fn pr_number(&self) -> Option<u64> {
        match self {
            Event::PrChangesRequested { pr_number, .. }
            | Event::PrComment { pr_number, .. }
            | Event::PrApproved { pr_number, .. }
            | Event::PrMerged { pr_number, .. }
            | Event::CiFailed { pr_number, .. }
            | Event::CiPassed { pr_number, .. } => Some(*pr_number),
            Event::AgentCompleted { pr_number, .. } | Event::AgentTask { pr_number, .. } => {
                *pr_number
            }
            _ => None,
        }
    }

    /// Design id for events that carry one directly.
    pub fn design_id(&self) -> Option<&DesignId> {
        match self {
            Event::TaskRequested { design_id, .. } => design_id.as_ref(),
            Event::PageApproved { design_id, .. }
            | Event::PageComment { design_id, .. }
            | Event::AgentCompleted { design_id, .. }
            | Event::StageCompleted { design_id, .. }
            | Event::AgentTask { design_id, .. } => Some(design_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
