// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI failure triage
//!
//! Classifies a failed check run from its log text so the orchestrator can
//! decide between re-enqueueing the code writer, retrying once, or notifying
//! a human immediately.

use serde::{Deserialize, Serialize};

/// Classification of a CI failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Test failures, lint errors, type errors, missing imports: the code
    /// writer can plausibly fix these.
    AgentFixable,
    /// Missing secrets, image build failures, dependency resolution. No
    /// amount of agent retries helps.
    Environment,
    /// Intermittent timeouts and network blips. Retry once, escalate on
    /// repeat.
    Flaky,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::AgentFixable => "agent_fixable",
            FailureClass::Environment => "environment",
            FailureClass::Flaky => "flaky",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked first: a missing secret often cascades into test failures.
const ENVIRONMENT_MARKERS: &[&str] = &[
    "missing secret",
    "secret not found",
    "env var not set",
    "environment variable not set",
    "docker build failed",
    "failed to build image",
    "no space left on device",
    "could not resolve dependencies",
    "dependency resolution failed",
    "unable to resolve dependency",
    "401 unauthorized",
    "403 forbidden",
];

const FLAKY_MARKERS: &[&str] = &[
    "timed out waiting",
    "connection reset",
    "connection refused",
    "econnreset",
    "etimedout",
    "network error",
    "temporarily unavailable",
    "rate limit",
    "502 bad gateway",
    "503 service unavailable",
];

const AGENT_FIXABLE_MARKERS: &[&str] = &[
    "test failed",
    "tests failed",
    "assertion failed",
    "assertionerror",
    "lint error",
    "eslint",
    "clippy",
    "type error",
    "error ts",
    "cannot find module",
    "missing import",
    "unresolved import",
    "compilation failed",
    "syntax error",
    "panicked at",
];

/// Classify a CI failure from its log text.
///
/// Unrecognised logs default to agent-fixable.
pub fn classify_ci_failure(log: &str) -> FailureClass {
    let lower = log.to_lowercase();
    if ENVIRONMENT_MARKERS.iter().any(|m| lower.contains(m)) {
        return FailureClass::Environment;
    }
    if FLAKY_MARKERS.iter().any(|m| lower.contains(m)) {
        return FailureClass::Flaky;
    }
    if AGENT_FIXABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        return FailureClass::AgentFixable;
    }
    FailureClass::AgentFixable
}

#[cfg(test)]
#[path = "triage_tests.rs"]
mod tests;
