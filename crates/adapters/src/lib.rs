// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! devloop-adapters: clients for the four external systems and the agent
//! subprocess supervisor
//!
//! Each external system is a trait at the seam, a reqwest-backed
//! implementation, and a recording fake behind the `test-support` feature.
//! The supervisor is pure: it returns a result record and leaves every
//! routing decision to its caller.

pub mod chat;
pub mod docs;
pub mod error;
pub mod runner;
pub mod scm;
pub mod tracker;

pub use chat::{ChatApi, SlackChat, SlackConfig};
pub use docs::{ConfluenceDocs, DocsApi, DocsConfig, PageComment, PageInfo};
pub use error::ApiError;
pub use runner::{
    run_agent, AgentInvocation, AgentProcess, AgentReport, AgentRun, AgentSpawner, CliSpawner,
    ProcessHandle, RunnerConfig, RunnerError, WorktreeSpec,
};
pub use scm::{GithubScm, PullRequest, ScmApi, ScmConfig};
pub use tracker::{IssueFields, IssueSummary, JiraTracker, TrackerApi, TrackerConfig};

#[cfg(any(test, feature = "test-support"))]
pub use chat::{ChatCall, FakeChat};
#[cfg(any(test, feature = "test-support"))]
pub use docs::FakeDocs;
#[cfg(any(test, feature = "test-support"))]
pub use runner::{FakeSpawner, SpawnScript};
#[cfg(any(test, feature = "test-support"))]
pub use scm::FakeScm;
#[cfg(any(test, feature = "test-support"))]
pub use tracker::{FakeTracker, TrackerCall};
