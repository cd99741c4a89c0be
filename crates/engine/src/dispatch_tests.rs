// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::handlers::standard_handlers;
use crate::queue::JobQueue;
use devloop_core::{AgentKind, DesignId, Event, TaskKind};

/// Queues with no runners: depth() observes what got enqueued.
fn idle_queues() -> Queues {
    let (architect, _a) = JobQueue::new(QueueName::Architect, 2);
    let (code_writer, _c) = JobQueue::new(QueueName::CodeWriter, 3);
    let (reviewer, _r) = JobQueue::new(QueueName::Reviewer, 2);
    let (orchestrator, _o) = JobQueue::new(QueueName::Orchestrator, 1);
    // Leak the runners so the senders stay connected for the test's scope
    std::mem::forget((_a, _c, _r, _o));
    Queues { architect, code_writer, reviewer, orchestrator }
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(standard_handlers(), idle_queues())
}

#[test]
fn task_requested_routes_to_architect() {
    let d = dispatcher();
    d.dispatch(Event::TaskRequested {
        design_id: None,
        description: "Build payments".to_string(),
        channel: "C1".to_string(),
        thread_ts: None,
        sender_id: "U1".to_string(),
        sender_name: "ada".to_string(),
    });
    assert_eq!(d.queues().architect.depth(), 1);
    assert_eq!(d.queues().orchestrator.depth(), 0);
}

#[test]
fn at_most_one_handler_receives_each_event() {
    let d = dispatcher();
    d.dispatch(Event::PrComment {
        pr_number: 7,
        branch: "feature/tos-1-x".to_string(),
        comments: vec!["please rename".to_string()],
    });
    let total = d.queues().architect.depth()
        + d.queues().code_writer.depth()
        + d.queues().reviewer.depth()
        + d.queues().orchestrator.depth();
    assert_eq!(total, 1);
    assert_eq!(d.queues().code_writer.depth(), 1);
}

#[test]
fn agent_tasks_route_by_agent_kind() {
    let d = dispatcher();
    for (agent, task) in [
        (AgentKind::Architect, TaskKind::Feedback),
        (AgentKind::CodeWriter, TaskKind::Implementation),
        (AgentKind::Reviewer, TaskKind::DesignReview),
    ] {
        d.dispatch(Event::AgentTask {
            agent,
            task,
            design_id: DesignId::from_string("dsn-a"),
            issue_key: None,
            pr_number: None,
            branch: None,
            tier: None,
            comments: Vec::new(),
        });
    }
    assert_eq!(d.queues().architect.depth(), 1);
    assert_eq!(d.queues().code_writer.depth(), 1);
    assert_eq!(d.queues().reviewer.depth(), 1);
}

#[test]
fn stateful_events_serialize_on_the_orchestrator_queue() {
    let d = dispatcher();
    d.dispatch(Event::PageApproved {
        page_id: "1".to_string(),
        design_id: DesignId::from_string("dsn-a"),
    });
    d.dispatch(Event::CiFailed {
        pr_number: 9,
        branch: "feature/tos-1-x".to_string(),
        check_run_id: None,
    });
    d.dispatch(Event::PrMerged { pr_number: 9, branch: "feature/tos-1-x".to_string() });
    assert_eq!(d.queues().orchestrator.depth(), 3);
}

#[test]
fn unmatched_event_is_dropped() {
    let d = dispatcher();
    d.dispatch(Event::Custom);
    let total = d.queues().architect.depth()
        + d.queues().code_writer.depth()
        + d.queues().reviewer.depth()
        + d.queues().orchestrator.depth();
    assert_eq!(total, 0);
}
