// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor liveness: a silent agent dies to the heartbeat, a noisy one
//! to the hard timeout.

use devloop_adapters::{run_agent, FakeSpawner, RunnerConfig, RunnerError, SpawnScript};
use std::time::Duration;

fn config(timeout_ms: u64, heartbeat_ms: u64) -> RunnerConfig {
    let mut config = RunnerConfig::new("code_writer", "do the thing", std::env::temp_dir());
    config.timeout = Duration::from_millis(timeout_ms);
    config.heartbeat = Duration::from_millis(heartbeat_ms);
    config
}

#[tokio::test]
async fn silent_subprocess_is_killed_by_heartbeat() {
    let spawner = FakeSpawner::new(SpawnScript::silent());
    let run = run_agent(&spawner, &config(5000, 50)).await.unwrap();

    assert!(!run.success);
    assert!(run.heartbeat_expired);
    assert!(run.duration_ms >= 50);
    assert!(spawner.was_killed());
}

#[tokio::test]
async fn chatty_subprocess_still_hits_the_hard_deadline() {
    let script = SpawnScript {
        chunks: (0..20)
            .map(|_| (Duration::from_millis(20), "output ".to_string()))
            .collect(),
        exit_code: 0,
        hang: true,
        exit_delay: Duration::ZERO,
    };
    let spawner = FakeSpawner::new(script);

    let err = run_agent(&spawner, &config(80, 1000)).await.unwrap_err();
    assert!(matches!(err, RunnerError::Timeout { .. }));
    assert!(spawner.was_killed());
}
