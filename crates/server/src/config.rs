// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate.
//!
//! Every knob has a safe default; secrets stay `Option` and only fail when
//! the integration that needs them is exercised.

use std::path::PathBuf;
use std::time::Duration;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// HTTP listen port
pub fn port() -> u16 {
    std::env::var("DEVLOOP_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080)
}

/// SQLite database path
pub fn database_path() -> PathBuf {
    env_string("DEVLOOP_DB_PATH").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("devloop.db"))
}

/// Root of the per-design output tree
pub fn designs_dir() -> PathBuf {
    env_string("DEVLOOP_DESIGNS_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("designs"))
}

/// Local checkout that code-writer worktrees are carved from
pub fn repo_root() -> PathBuf {
    env_string("DEVLOOP_REPO_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

// -- queue concurrency --

pub fn architect_concurrency() -> usize {
    env_u64("DEVLOOP_ARCHITECT_CONCURRENCY", 2) as usize
}

pub fn code_writer_concurrency() -> usize {
    env_u64("DEVLOOP_CODE_WRITER_CONCURRENCY", 3) as usize
}

pub fn reviewer_concurrency() -> usize {
    env_u64("DEVLOOP_REVIEWER_CONCURRENCY", 2) as usize
}

// -- retry caps --

pub fn max_ci_retries() -> u32 {
    env_u64("DEVLOOP_MAX_CI_RETRIES", 10) as u32
}

pub fn max_review_retries() -> u32 {
    env_u64("DEVLOOP_MAX_REVIEW_RETRIES", 10) as u32
}

// -- agent supervision --

/// Hard wall-clock deadline for one agent run (default 1 hour)
pub fn agent_timeout() -> Duration {
    Duration::from_millis(env_u64("DEVLOOP_AGENT_TIMEOUT_MS", 60 * 60 * 1000))
}

/// Liveness window on agent stdout (default 10 minutes)
pub fn agent_heartbeat() -> Duration {
    Duration::from_millis(env_u64("DEVLOOP_AGENT_HEARTBEAT_MS", 10 * 60 * 1000))
}

/// Agent CLI program name
pub fn agent_program() -> String {
    env_string("DEVLOOP_AGENT_PROGRAM").unwrap_or_else(|| "claude".to_string())
}

pub fn keep_worktrees() -> bool {
    std::env::var("DEVLOOP_KEEP_WORKTREES").is_ok_and(|s| s == "1" || s == "true")
}

// -- polling and shutdown --

/// Document store poll interval (default 60 s)
pub fn poll_interval() -> Duration {
    Duration::from_millis(env_u64("DEVLOOP_POLL_INTERVAL_MS", 60_000))
}

/// Shutdown drain grace period (default 5 s)
pub fn drain_timeout() -> Duration {
    Duration::from_millis(env_u64("DEVLOOP_DRAIN_TIMEOUT_MS", 5_000))
}

// -- external systems --

pub fn slack_signing_secret() -> Option<String> {
    env_string("DEVLOOP_SLACK_SIGNING_SECRET")
}

pub fn slack_bot_token() -> Option<String> {
    env_string("DEVLOOP_SLACK_BOT_TOKEN")
}

pub fn slack_webhook_url() -> Option<String> {
    env_string("DEVLOOP_SLACK_WEBHOOK_URL")
}

pub fn github_webhook_secret() -> Option<String> {
    env_string("DEVLOOP_GITHUB_WEBHOOK_SECRET")
}

pub fn github_token() -> Option<String> {
    env_string("DEVLOOP_GITHUB_TOKEN")
}

/// `owner/repo`
pub fn github_repo() -> Option<String> {
    env_string("DEVLOOP_GITHUB_REPO")
}

pub fn tracker_base_url() -> Option<String> {
    env_string("DEVLOOP_TRACKER_BASE_URL")
}

pub fn tracker_token() -> Option<String> {
    env_string("DEVLOOP_TRACKER_TOKEN")
}

/// Issue-tracker project key for parent issues
pub fn tracker_project() -> String {
    env_string("DEVLOOP_TRACKER_PROJECT").unwrap_or_else(|| "DEV".to_string())
}

pub fn docs_base_url() -> Option<String> {
    env_string("DEVLOOP_DOCS_BASE_URL")
}

pub fn docs_token() -> Option<String> {
    env_string("DEVLOOP_DOCS_TOKEN")
}

pub fn docs_space_id() -> Option<String> {
    env_string("DEVLOOP_DOCS_SPACE_ID")
}
