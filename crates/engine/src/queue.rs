// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job queues with bounded worker pools
//!
//! Each queue is an ordered stream of events drained by a pool capped at a
//! fixed concurrency. Jobs start in push order; a failing job is logged and
//! the next one runs. `destroy()` halts intake while in-flight jobs run to
//! completion.

use crate::error::EngineError;
use devloop_core::Event;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio_util::sync::CancellationToken;

/// The four named queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    Architect,
    CodeWriter,
    Reviewer,
    Orchestrator,
}

impl QueueName {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::Architect => "architect",
            QueueName::CodeWriter => "code_writer",
            QueueName::Reviewer => "reviewer",
            QueueName::Orchestrator => "orchestrator",
        }
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct QueueShared {
    /// Queued plus in-flight jobs.
    pending: AtomicUsize,
    drained: Notify,
    cancel: CancellationToken,
}

/// Push handle for a queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    name: QueueName,
    tx: mpsc::UnboundedSender<Event>,
    shared: Arc<QueueShared>,
}

impl JobQueue {
    /// Build the queue and the runner that will drain it.
    pub fn new(name: QueueName, concurrency: usize) -> (Self, QueueRunner) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(QueueShared {
            pending: AtomicUsize::new(0),
            drained: Notify::new(),
            cancel: CancellationToken::new(),
        });
        let queue = Self { name, tx, shared: Arc::clone(&shared) };
        let runner = QueueRunner { name, concurrency, rx, shared };
        (queue, runner)
    }

    /// Non-blocking enqueue at tail. Events pushed after `destroy` are
    /// dropped with a warning.
    pub fn push(&self, event: Event) {
        if self.shared.cancel.is_cancelled() {
            tracing::warn!(queue = %self.name, kind = %event.kind(), "queue destroyed, dropping event");
            return;
        }
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(event).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(queue = %self.name, "queue runner gone, dropping event");
        }
    }

    /// Queued plus in-flight job count.
    pub fn depth(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Wait until the queue is empty and no job is in flight.
    pub async fn drain(&self) {
        loop {
            let notified = self.shared.drained.notified();
            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Halt further processing. Idempotent; in-flight jobs run to
    /// completion.
    pub fn destroy(&self) {
        self.shared.cancel.cancel();
    }
}

/// Drains a queue with a bounded pool. Obtained from [`JobQueue::new`].
pub struct QueueRunner {
    name: QueueName,
    concurrency: usize,
    rx: mpsc::UnboundedReceiver<Event>,
    shared: Arc<QueueShared>,
}

impl QueueRunner {
    /// Bind the worker function and start draining.
    pub fn start<F, Fut>(mut self, worker: F) -> tokio::task::JoinHandle<()>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), EngineError>> + Send + 'static,
    {
        let worker = Arc::new(worker);
        tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(self.concurrency));
            loop {
                let event = tokio::select! {
                    _ = self.shared.cancel.cancelled() => break,
                    event = self.rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                // Acquire before spawning so jobs start in push order.
                let permit = tokio::select! {
                    _ = self.shared.cancel.cancelled() => {
                        finish_job(&self.shared);
                        break;
                    }
                    permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let worker = Arc::clone(&worker);
                let shared = Arc::clone(&self.shared);
                let name = self.name;
                tokio::spawn(async move {
                    let _permit = permit;
                    let _guard = JobGuard { shared: &shared };
                    if let Err(e) = worker(event).await {
                        tracing::error!(queue = %name, error = %e, "job failed");
                    }
                });
            }
            // Account for events that were queued but will never run, so
            // drain() still settles after destroy().
            while self.rx.try_recv().is_ok() {
                finish_job(&self.shared);
            }
            tracing::info!(queue = %self.name, "queue runner stopped");
        })
    }
}

/// Decrements the pending count when a job ends, panics included.
struct JobGuard<'a> {
    shared: &'a Arc<QueueShared>,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        finish_job(self.shared);
    }
}

fn finish_job(shared: &Arc<QueueShared>) {
    if shared.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
        shared.drained.notify_waiters();
    }
}

/// The full queue set, handed to handlers and the orchestrator.
#[derive(Clone)]
pub struct Queues {
    pub architect: JobQueue,
    pub code_writer: JobQueue,
    pub reviewer: JobQueue,
    pub orchestrator: JobQueue,
}

impl Queues {
    pub fn get(&self, name: QueueName) -> &JobQueue {
        match name {
            QueueName::Architect => &self.architect,
            QueueName::CodeWriter => &self.code_writer,
            QueueName::Reviewer => &self.reviewer,
            QueueName::Orchestrator => &self.orchestrator,
        }
    }

    /// Wait for every queue to quiesce.
    pub async fn drain_all(&self) {
        self.architect.drain().await;
        self.code_writer.drain().await;
        self.reviewer.drain().await;
        self.orchestrator.drain().await;
    }

    pub fn destroy_all(&self) {
        self.architect.destroy();
        self.code_writer.destroy();
        self.reviewer.destroy();
        self.orchestrator.destroy();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
