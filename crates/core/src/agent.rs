// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent and task kinds, the route-map key space

use serde::{Deserialize, Serialize};

/// The three subprocess agents the orchestrator supervises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Architect,
    CodeWriter,
    Reviewer,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Architect => "architect",
            AgentKind::CodeWriter => "code_writer",
            AgentKind::Reviewer => "reviewer",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a queued agent job is asked to do.
///
/// `(AgentKind, TaskKind)` pairs key the orchestrator's route map; unknown
/// pairs are logged and dropped there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Design,
    Feedback,
    Implementation,
    CiFix,
    ReviewFix,
    HumanFeedback,
    DesignReview,
    CodeReview,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Design => "design",
            TaskKind::Feedback => "feedback",
            TaskKind::Implementation => "implementation",
            TaskKind::CiFix => "ci_fix",
            TaskKind::ReviewFix => "review_fix",
            TaskKind::HumanFeedback => "human_feedback",
            TaskKind::DesignReview => "design_review",
            TaskKind::CodeReview => "code_review",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
