// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! devloopd: the orchestrator daemon

use anyhow::Context;
use devloop_adapters::{
    CliSpawner, ConfluenceDocs, DocsConfig, GithubScm, JiraTracker, ScmConfig, SlackChat,
    SlackConfig, TrackerConfig,
};
use devloop_core::SystemClock;
use devloop_engine::{
    standard_handlers, Dispatcher, DocPoller, EngineConfig, JobQueue, Orchestrator, QueueName,
    Queues,
};
use devloop_server::{config, router, AppState};
use devloop_storage::Store;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(
        Store::open(config::database_path()).context("failed to open state store")?,
    );
    tokio::fs::create_dir_all(config::designs_dir())
        .await
        .context("failed to create designs dir")?;

    let (architect, architect_rx) =
        JobQueue::new(QueueName::Architect, config::architect_concurrency());
    let (code_writer, code_writer_rx) =
        JobQueue::new(QueueName::CodeWriter, config::code_writer_concurrency());
    let (reviewer, reviewer_rx) =
        JobQueue::new(QueueName::Reviewer, config::reviewer_concurrency());
    // Concurrency one: every route decision and state mutation serialises here.
    let (orchestrator_queue, orchestrator_rx) = JobQueue::new(QueueName::Orchestrator, 1);
    let queues = Queues {
        architect,
        code_writer,
        reviewer,
        orchestrator: orchestrator_queue,
    };

    let docs_config = DocsConfig {
        base_url: config::docs_base_url(),
        token: config::docs_token(),
        space_id: config::docs_space_id(),
    };
    let engine_config = EngineConfig {
        designs_dir: config::designs_dir(),
        repo_root: config::repo_root(),
        issue_project: config::tracker_project(),
        max_ci_retries: config::max_ci_retries(),
        max_review_retries: config::max_review_retries(),
        agent_timeout: config::agent_timeout(),
        agent_heartbeat: config::agent_heartbeat(),
        keep_worktrees: config::keep_worktrees(),
    };

    let orchestrator = Arc::new(Orchestrator::new(
        SlackChat::new(SlackConfig {
            webhook_url: config::slack_webhook_url(),
            bot_token: config::slack_bot_token(),
            api_base: None,
        }),
        JiraTracker::new(TrackerConfig {
            base_url: config::tracker_base_url(),
            token: config::tracker_token(),
        }),
        ConfluenceDocs::new(docs_config.clone()),
        GithubScm::new(ScmConfig {
            repo: config::github_repo(),
            token: config::github_token(),
            api_base: None,
        }),
        CliSpawner::new(config::agent_program()),
        Arc::clone(&store),
        queues.clone(),
        engine_config,
    ));

    {
        let orchestrator = Arc::clone(&orchestrator);
        architect_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_architect_job(event).await }
        });
    }
    {
        let orchestrator = Arc::clone(&orchestrator);
        code_writer_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_code_writer_job(event).await }
        });
    }
    {
        let orchestrator = Arc::clone(&orchestrator);
        reviewer_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_reviewer_job(event).await }
        });
    }
    {
        let orchestrator = Arc::clone(&orchestrator);
        orchestrator_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_orchestrator_event(event).await }
        });
    }

    let dispatcher = Arc::new(Dispatcher::new(standard_handlers(), queues.clone()));

    let cancel = CancellationToken::new();
    let poller = Arc::new(DocPoller::new(
        Arc::new(ConfluenceDocs::new(docs_config)),
        Arc::clone(&dispatcher),
        SystemClock,
        config::poll_interval(),
    ));
    tokio::spawn(Arc::clone(&poller).run(cancel.clone()));

    let state = AppState {
        dispatcher: Arc::clone(&dispatcher),
        store: Arc::clone(&store),
        slack_signing_secret: config::slack_signing_secret(),
        github_webhook_secret: config::github_webhook_secret(),
    };

    let port = config::port();
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!(port, "devloopd listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Drain: stop intake, let in-flight jobs finish inside the grace period.
    tracing::info!("shutting down, draining queues");
    cancel.cancel();
    queues.destroy_all();
    if tokio::time::timeout(config::drain_timeout(), queues.drain_all())
        .await
        .is_err()
    {
        tracing::warn!("drain grace period elapsed, abandoning in-flight jobs");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
