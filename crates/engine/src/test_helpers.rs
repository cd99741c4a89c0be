// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::queue::{JobQueue, QueueName, Queues};
use crate::workers::{EngineConfig, Orchestrator};
use devloop_adapters::{FakeChat, FakeDocs, FakeScm, FakeSpawner, FakeTracker, SpawnScript};
use devloop_core::DesignId;
use devloop_storage::Store;
use std::sync::Arc;

pub(crate) type TestOrchestrator =
    Orchestrator<FakeChat, FakeTracker, FakeDocs, FakeScm, FakeSpawner>;

pub(crate) struct TestContext {
    pub orchestrator: Arc<TestOrchestrator>,
    pub chat: FakeChat,
    pub tracker: FakeTracker,
    pub docs: FakeDocs,
    pub scm: FakeScm,
    pub spawner: FakeSpawner,
    pub store: Arc<Store>,
    pub dir: tempfile::TempDir,
}

/// Queues with no runners attached: tests observe `depth()` to see what the
/// orchestrator enqueued.
pub(crate) fn idle_queues() -> Queues {
    let (architect, a) = JobQueue::new(QueueName::Architect, 2);
    let (code_writer, c) = JobQueue::new(QueueName::CodeWriter, 3);
    let (reviewer, r) = JobQueue::new(QueueName::Reviewer, 2);
    let (orchestrator, o) = JobQueue::new(QueueName::Orchestrator, 1);
    std::mem::forget((a, c, r, o));
    Queues { architect, code_writer, reviewer, orchestrator }
}

pub(crate) fn setup() -> TestContext {
    setup_with_script(SpawnScript::report(r#"{"result": "ok"}"#))
}

pub(crate) fn setup_with_script(script: SpawnScript) -> TestContext {
    let dir = tempfile::tempdir().expect("tempdir");
    let chat = FakeChat::new();
    let tracker = FakeTracker::new();
    let docs = FakeDocs::new();
    let scm = FakeScm::new();
    let spawner = FakeSpawner::new(script);
    let store = Arc::new(Store::open_in_memory().expect("store"));

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
        idle_queues(),
        config,
    ));
    TestContext { orchestrator, chat, tracker, docs, scm, spawner, store, dir }
}

impl TestContext {
    /// Create a design row plus intake metadata.
    pub(crate) fn seed_design(&self, id: &str, description: &str) -> DesignId {
        let design_id = DesignId::from_string(id);
        self.store.create_design(&design_id, description).expect("create design");
        self.store
            .record_intake(&design_id, "C1", Some("111.222"), "U1", "ada")
            .expect("record intake");
        design_id
    }

    /// Write a design doc to disk and index it under `design_doc`.
    pub(crate) async fn seed_doc(&self, design_id: &DesignId, content: &str) -> std::path::PathBuf {
        let dir = self.orchestrator.design_dir(design_id).join("design");
        tokio::fs::create_dir_all(&dir).await.expect("mkdir");
        let path = dir.join("design_doc.md");
        tokio::fs::write(&path, content).await.expect("write doc");
        self.store.record_output(design_id, "design_doc", &path).expect("record output");
        path
    }

    pub(crate) fn queue_depth(&self, name: QueueName) -> usize {
        self.orchestrator.queues().get(name).depth()
    }

    pub(crate) fn chat_texts(&self) -> Vec<String> {
        self.chat.calls().into_iter().map(|c| c.text).collect()
    }
}

pub(crate) fn doc_with_plan() -> &'static str {
    "# Payments design\n\nProse.\n\n## Implementation Plan\n\n\
     - foundation: Schema — add the payments tables\n\
     - feature: Checkout flow — wire the new API\n\
     - feature: Refunds — handle refunds\n"
}
