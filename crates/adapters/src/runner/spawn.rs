// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent process spawning
//!
//! The spawner is injected into the supervisor so tests can script a fake
//! process instead of monkey-patching a global.

use super::RunnerError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// What to launch: agent name, prompt, optional tool allowlist, and the
/// directory to run in.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub agent: String,
    pub prompt: String,
    pub allowed_tools: Option<Vec<String>>,
    pub cwd: PathBuf,
}

/// A running agent process as the supervisor sees it: an output stream and
/// a kill/wait handle. The prompt has already been written and stdin closed.
pub struct AgentProcess {
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub handle: Box<dyn ProcessHandle>,
}

/// Control surface over a spawned process.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Wait for exit and return the exit code (-1 when unknown).
    async fn wait(&mut self) -> Result<i32, RunnerError>;

    /// Kill and reap the process. Idempotent, best-effort.
    async fn kill(&mut self);
}

/// Spawns agent subprocesses.
#[async_trait]
pub trait AgentSpawner: Send + Sync + 'static {
    async fn spawn(&self, invocation: &AgentInvocation) -> Result<AgentProcess, RunnerError>;
}

/// Real spawner invoking the agent CLI.
#[derive(Debug, Clone)]
pub struct CliSpawner {
    /// Program name, resolvable on PATH.
    pub program: String,
}

impl Default for CliSpawner {
    fn default() -> Self {
        Self { program: "claude".to_string() }
    }
}

impl CliSpawner {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

#[async_trait]
impl AgentSpawner for CliSpawner {
    async fn spawn(&self, invocation: &AgentInvocation) -> Result<AgentProcess, RunnerError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("-p")
            .arg("--output-format")
            .arg("json")
            .arg("--agent")
            .arg(&invocation.agent);
        if let Some(tools) = &invocation.allowed_tools {
            cmd.arg("--allowedTools").arg(tools.join(","));
        }
        cmd.current_dir(&invocation.cwd)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| RunnerError::Spawn(format!("failed to spawn {}: {e}", self.program)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Spawn("child stdout not captured".to_string()))?;

        // Write the prompt and close stdin. Done on a detached task so a
        // process that never reads stdin cannot wedge the supervisor.
        if let Some(mut stdin) = child.stdin.take() {
            let prompt = invocation.prompt.clone();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    tracing::warn!(error = %e, "failed to write agent prompt");
                }
                // stdin drops here, closing the pipe
            });
        }

        Ok(AgentProcess {
            stdout: Box::new(stdout),
            handle: Box::new(ChildHandle { child }),
        })
    }
}

struct ChildHandle {
    child: tokio::process::Child,
}

#[async_trait]
impl ProcessHandle for ChildHandle {
    async fn wait(&mut self) -> Result<i32, RunnerError> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(error = %e, "failed to kill agent process");
        }
    }
}
