// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: real queues, dispatcher and orchestrator over fakes.

use devloop_adapters::{FakeChat, FakeDocs, FakeScm, FakeSpawner, FakeTracker, SpawnScript};
use devloop_engine::{
    standard_handlers, Dispatcher, EngineConfig, JobQueue, Orchestrator, QueueName, QueueRunner,
    Queues,
};
use devloop_storage::Store;
use std::sync::Arc;

pub type SpecOrchestrator = Orchestrator<FakeChat, FakeTracker, FakeDocs, FakeScm, FakeSpawner>;

pub struct Specs {
    pub orchestrator: Arc<SpecOrchestrator>,
    pub dispatcher: Arc<Dispatcher>,
    pub queues: Queues,
    pub chat: FakeChat,
    pub tracker: FakeTracker,
    pub docs: FakeDocs,
    pub scm: FakeScm,
    pub spawner: FakeSpawner,
    pub store: Arc<Store>,
    #[allow(dead_code)]
    pub dir: tempfile::TempDir,
}

fn build(script: SpawnScript) -> (Specs, [QueueRunner; 4]) {
    let dir = tempfile::tempdir().expect("tempdir");
    let chat = FakeChat::new().with_user("U1", "ada");
    let tracker = FakeTracker::new();
    let docs = FakeDocs::new();
    let scm = FakeScm::new();
    let spawner = FakeSpawner::new(script);
    let store = Arc::new(Store::open_in_memory().expect("store"));

    let (architect, architect_rx) = JobQueue::new(QueueName::Architect, 2);
    let (code_writer, code_writer_rx) = JobQueue::new(QueueName::CodeWriter, 3);
    let (reviewer, reviewer_rx) = JobQueue::new(QueueName::Reviewer, 2);
    let (orchestrator_queue, orchestrator_rx) = JobQueue::new(QueueName::Orchestrator, 1);
    let queues = Queues {
        architect,
        code_writer,
        reviewer,
        orchestrator: orchestrator_queue,
    };

    let config = EngineConfig {
        designs_dir: dir.path().join("designs"),
        repo_root: dir.path().to_path_buf(),
        issue_project: "TOS".to_string(),
        max_ci_retries: 3,
        max_review_retries: 3,
        ..EngineConfig::default()
    };

    let orchestrator = Arc::new(Orchestrator::new(
        chat.clone(),
        tracker.clone(),
        docs.clone(),
        scm.clone(),
        spawner.clone(),
        Arc::clone(&store),
        queues.clone(),
        config,
    ));
    let dispatcher = Arc::new(Dispatcher::new(standard_handlers(), queues.clone()));

    let specs = Specs {
        orchestrator,
        dispatcher,
        queues,
        chat,
        tracker,
        docs,
        scm,
        spawner,
        store,
        dir,
    };
    (specs, [architect_rx, code_writer_rx, reviewer_rx, orchestrator_rx])
}

/// Harness with live queue runners: dispatched events flow through the
/// whole pipeline.
pub fn live(script: SpawnScript) -> Specs {
    let (specs, [architect_rx, code_writer_rx, reviewer_rx, orchestrator_rx]) = build(script);

    {
        let orchestrator = Arc::clone(&specs.orchestrator);
        architect_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_architect_job(event).await }
        });
    }
    {
        let orchestrator = Arc::clone(&specs.orchestrator);
        code_writer_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_code_writer_job(event).await }
        });
    }
    {
        let orchestrator = Arc::clone(&specs.orchestrator);
        reviewer_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_reviewer_job(event).await }
        });
    }
    {
        let orchestrator = Arc::clone(&specs.orchestrator);
        orchestrator_rx.start(move |event| {
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.handle_orchestrator_event(event).await }
        });
    }
    specs
}

/// Harness without runners: dispatched events sit on their queues so tests
/// can observe routing, while handlers are driven directly.
pub fn idle(script: SpawnScript) -> Specs {
    let (specs, runners) = build(script);
    // Keep the receivers alive so pushes are not dropped
    std::mem::forget(runners);
    specs
}

impl Specs {
    /// Wait until every queue is empty and quiet. The pipeline ping-pongs
    /// between queues, so one drain pass is not enough.
    pub async fn settle(&self) {
        for _ in 0..50 {
            self.queues.drain_all().await;
            let depth = self.queues.architect.depth()
                + self.queues.code_writer.depth()
                + self.queues.reviewer.depth()
                + self.queues.orchestrator.depth();
            if depth == 0 {
                return;
            }
        }
        panic!("pipeline did not settle");
    }

    pub fn chat_texts(&self) -> Vec<String> {
        self.chat.calls().into_iter().map(|c| c.text).collect()
    }
}
