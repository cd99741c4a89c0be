// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The standard handler registry

use crate::dispatch::Handler;
use crate::queue::QueueName;
use devloop_core::{AgentKind, Event};

/// Handlers in registration order. Everything stateful routes to the
/// orchestrator queue; agent-facing events go straight to their pools.
pub fn standard_handlers() -> Vec<Handler> {
    vec![
        Handler {
            name: "chat_intake",
            queue: QueueName::Architect,
            matches: |event| matches!(event, Event::TaskRequested { .. }),
        },
        Handler {
            name: "design_page_feedback",
            queue: QueueName::Architect,
            matches: |event| matches!(event, Event::PageComment { .. }),
        },
        Handler {
            name: "pr_human_feedback",
            queue: QueueName::CodeWriter,
            matches: |event| {
                matches!(
                    event,
                    Event::PrChangesRequested { .. } | Event::PrComment { .. }
                )
            },
        },
        Handler {
            name: "architect_jobs",
            queue: QueueName::Architect,
            matches: |event| {
                matches!(event, Event::AgentTask { agent: AgentKind::Architect, .. })
            },
        },
        Handler {
            name: "code_writer_jobs",
            queue: QueueName::CodeWriter,
            matches: |event| {
                matches!(event, Event::AgentTask { agent: AgentKind::CodeWriter, .. })
            },
        },
        Handler {
            name: "reviewer_jobs",
            queue: QueueName::Reviewer,
            matches: |event| {
                matches!(event, Event::AgentTask { agent: AgentKind::Reviewer, .. })
            },
        },
        Handler {
            name: "orchestration",
            queue: QueueName::Orchestrator,
            matches: |event| {
                matches!(
                    event,
                    Event::PageApproved { .. }
                        | Event::StageCompleted { .. }
                        | Event::AgentCompleted { .. }
                        | Event::CiFailed { .. }
                        | Event::CiPassed { .. }
                        | Event::PrApproved { .. }
                        | Event::PrMerged { .. }
                )
            },
        },
    ]
}
