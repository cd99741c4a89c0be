// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent subprocess supervision
//!
//! Three outcomes compete over a running agent:
//!
//! 1. completion: stdout reaches EOF and the process exits
//! 2. heartbeat expiry: no output chunk within the heartbeat window
//! 3. hard timeout: wall clock exceeds the run deadline
//!
//! Exactly one settles. The select loop below is the single settle point;
//! every return path kills and reaps the process first, so a timer firing
//! after a kill has nothing left to settle. The supervisor carries no
//! business logic: callers decide what to do with the result.

mod output;
mod spawn;
mod worktree;

pub use output::{parse_agent_output, AgentReport};
pub use spawn::{AgentInvocation, AgentProcess, AgentSpawner, CliSpawner, ProcessHandle};
pub use worktree::WorktreeSpec;

use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use worktree::Worktree;

/// Errors from a supervised agent run
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("workspace error: {0}")]
    Workspace(String),
    #[error("agent run timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One supervised run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub agent: String,
    pub prompt: String,
    pub allowed_tools: Option<Vec<String>>,
    pub cwd: PathBuf,
    /// Hard wall-clock deadline. Exceeding it is a fatal error.
    pub timeout: Duration,
    /// Liveness window, reset on every stdout chunk.
    pub heartbeat: Duration,
    /// When set, the run happens inside a fresh git worktree.
    pub worktree: Option<WorktreeSpec>,
    /// Leave the worktree on disk after the run.
    pub keep_worktree: bool,
}

impl RunnerConfig {
    pub fn new(agent: impl Into<String>, prompt: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            agent: agent.into(),
            prompt: prompt.into(),
            allowed_tools: None,
            cwd,
            timeout: Duration::from_secs(60 * 60),
            heartbeat: Duration::from_secs(10 * 60),
            worktree: None,
            keep_worktree: false,
        }
    }
}

/// Result of a settled run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// True iff the process exited with code zero.
    pub success: bool,
    pub report: AgentReport,
    pub duration_ms: u64,
    /// Set when the heartbeat killed the process.
    pub heartbeat_expired: bool,
}

/// Run an agent to a settled outcome.
///
/// The worktree (when requested) is created before spawn and removed after
/// the run settles, on success, heartbeat kill and hard timeout alike,
/// unless `keep_worktree` is set.
pub async fn run_agent<S: AgentSpawner + ?Sized>(
    spawner: &S,
    config: &RunnerConfig,
) -> Result<AgentRun, RunnerError> {
    let workspace = match &config.worktree {
        Some(spec) => Some(Worktree::create(spec).await?),
        None => None,
    };
    let cwd = workspace
        .as_ref()
        .map(|w| w.path().to_path_buf())
        .unwrap_or_else(|| config.cwd.clone());

    let outcome = supervise(spawner, config, cwd).await;

    if let Some(workspace) = workspace {
        if config.keep_worktree {
            tracing::info!(path = %workspace.path().display(), "keeping worktree");
        } else {
            workspace.remove().await;
        }
    }
    outcome
}

async fn supervise<S: AgentSpawner + ?Sized>(
    spawner: &S,
    config: &RunnerConfig,
    cwd: PathBuf,
) -> Result<AgentRun, RunnerError> {
    let invocation = AgentInvocation {
        agent: config.agent.clone(),
        prompt: config.prompt.clone(),
        allowed_tools: config.allowed_tools.clone(),
        cwd,
    };
    let started = Instant::now();
    let mut process = spawner.spawn(&invocation).await?;

    let deadline = tokio::time::sleep(config.timeout);
    tokio::pin!(deadline);

    let mut collected: Vec<u8> = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        // Recreated each turn: any chunk resets the heartbeat.
        let heartbeat = tokio::time::sleep(config.heartbeat);
        tokio::pin!(heartbeat);

        tokio::select! {
            // Deterministic: deadline beats heartbeat beats reads when
            // several are ready at once.
            biased;

            _ = &mut deadline => {
                process.handle.kill().await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::error!(agent = %config.agent, elapsed_ms, "agent hit hard timeout");
                return Err(RunnerError::Timeout { elapsed_ms });
            }

            _ = &mut heartbeat => {
                process.handle.kill().await;
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(agent = %config.agent, duration_ms, "agent heartbeat expired");
                let report = parse_agent_output(&String::from_utf8_lossy(&collected));
                return Ok(AgentRun {
                    success: false,
                    report,
                    duration_ms,
                    heartbeat_expired: true,
                });
            }

            read = process.stdout.read(&mut buf) => {
                match read {
                    Ok(0) => break,
                    Ok(n) => collected.extend_from_slice(&buf[..n]),
                    Err(e) => {
                        tracing::warn!(agent = %config.agent, error = %e, "agent stdout read error");
                        break;
                    }
                }
            }
        }
    }

    // EOF: the exit itself still races the hard deadline.
    let code = tokio::select! {
        biased;
        _ = &mut deadline => {
            process.handle.kill().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            return Err(RunnerError::Timeout { elapsed_ms });
        }
        code = process.handle.wait() => code?,
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    let report = parse_agent_output(&String::from_utf8_lossy(&collected));
    tracing::info!(
        agent = %config.agent,
        exit_code = code,
        duration_ms,
        "agent run completed"
    );
    Ok(AgentRun { success: code == 0, report, duration_ms, heartbeat_expired: false })
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSpawner, SpawnScript};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
