// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted spawner for supervisor tests

use super::spawn::{AgentInvocation, AgentProcess, AgentSpawner, ProcessHandle};
use super::RunnerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// What the fake process does: emit chunks (each after a delay), then
/// either close stdout and exit, or hang forever.
#[derive(Debug, Clone)]
pub struct SpawnScript {
    pub chunks: Vec<(Duration, String)>,
    pub exit_code: i32,
    /// Keep stdout open and never exit (heartbeat/timeout scenarios).
    pub hang: bool,
    /// Delay between stdout EOF and process exit.
    pub exit_delay: Duration,
}

impl Default for SpawnScript {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            exit_code: 0,
            hang: false,
            exit_delay: Duration::ZERO,
        }
    }
}

impl SpawnScript {
    /// Emit a single JSON report immediately, then exit cleanly.
    pub fn report(json: &str) -> Self {
        Self {
            chunks: vec![(Duration::ZERO, json.to_string())],
            ..Default::default()
        }
    }

    /// Emit nothing and never exit.
    pub fn silent() -> Self {
        Self { hang: true, ..Default::default() }
    }
}

/// Fake spawner replaying a [`SpawnScript`]; records invocations and kills.
#[derive(Clone)]
pub struct FakeSpawner {
    script: Arc<Mutex<SpawnScript>>,
    invocations: Arc<Mutex<Vec<AgentInvocation>>>,
    killed: Arc<AtomicBool>,
}

impl FakeSpawner {
    pub fn new(script: SpawnScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            invocations: Arc::new(Mutex::new(Vec::new())),
            killed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the script for the next spawn.
    pub fn set_script(&self, script: SpawnScript) {
        *self.script.lock() = script;
    }

    pub fn invocations(&self) -> Vec<AgentInvocation> {
        self.invocations.lock().clone()
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentSpawner for FakeSpawner {
    async fn spawn(&self, invocation: &AgentInvocation) -> Result<AgentProcess, RunnerError> {
        self.invocations.lock().push(invocation.clone());
        let script = self.script.lock().clone();
        let (reader, mut writer) = tokio::io::duplex(64 * 1024);

        let hang = script.hang;
        let chunks = script.chunks.clone();
        tokio::spawn(async move {
            for (delay, chunk) in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if writer.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
            }
            if hang {
                // Hold the writer open so the reader never sees EOF.
                std::future::pending::<()>().await;
            }
            // writer drops here, closing the stream
        });

        Ok(AgentProcess {
            stdout: Box::new(reader),
            handle: Box::new(FakeHandle {
                exit_code: script.exit_code,
                exit_delay: script.exit_delay,
                hang: script.hang,
                killed: Arc::clone(&self.killed),
            }),
        })
    }
}

struct FakeHandle {
    exit_code: i32,
    exit_delay: Duration,
    hang: bool,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl ProcessHandle for FakeHandle {
    async fn wait(&mut self) -> Result<i32, RunnerError> {
        if self.hang && !self.killed.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if !self.exit_delay.is_zero() {
            tokio::time::sleep(self.exit_delay).await;
        }
        Ok(self.exit_code)
    }

    async fn kill(&mut self) {
        self.killed.store(true, Ordering::SeqCst);
    }
}
