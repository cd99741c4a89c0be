// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! devloop-core: domain types and shared utilities for the devloop orchestrator

pub mod agent;
pub mod clock;
pub mod design;
pub mod event;
pub mod extract;
pub mod id;
pub mod plan;
pub mod pr;
pub mod triage;
pub mod verdict;

pub use agent::{AgentKind, TaskKind};
pub use clock::{iso_from_epoch_ms, Clock, FakeClock, SystemClock};
pub use design::{Design, DesignOutput, DesignStage, DesignStatus};
pub use event::{Event, EventKind, EventSource};
pub use extract::{design_id_from_title, issue_key_from_branch};
pub use id::DesignId;
pub use plan::{parse_plan, PlanTask, TaskTier};
pub use pr::{CheckStatus, PrStage, PrState};
pub use triage::{classify_ci_failure, FailureClass};
pub use verdict::{review_verdict, ReviewVerdict};
