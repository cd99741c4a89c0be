// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI failure triage: webhook in, classified failure, ci-fix job out.

use crate::helpers::idle;
use devloop_adapters::SpawnScript;
use devloop_core::{DesignId, EventKind};
use devloop_server::parse::parse_github;
use serde_json::json;

#[tokio::test]
async fn type_error_failure_burns_one_attempt_and_enqueues_fix() {
    let specs = idle(SpawnScript::report("{}"));
    let design_id = DesignId::from_string("dsn-a");
    specs.store.create_design(&design_id, "Build payments").unwrap();
    specs.store.create_pr(42, &design_id, "TOS-40", None, Some("payments")).unwrap();
    specs.scm.set_check_logs(
        7,
        "src/pay.ts(12,3): error TS2322: Type 'string' is not assignable to type 'number'",
    );

    let payload = json!({
        "action": "completed",
        "check_suite": {
            "id": 7,
            "conclusion": "failure",
            "pull_requests": [
                {"number": 42, "head": {"ref": "feature/tos-40-payments"}}
            ]
        }
    });
    let events = parse_github("check_suite", &payload);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::CiFailed);

    // First-match routing lands it on the orchestrator queue
    specs.dispatcher.dispatch(events[0].clone());
    assert_eq!(specs.queues.orchestrator.depth(), 1);

    // Drive the route directly (idle harness has no runners)
    specs.orchestrator.handle_orchestrator_event(events[0].clone()).await.unwrap();

    let pr = specs.store.get_pr(42).unwrap().unwrap();
    assert_eq!(pr.ci_attempts, 1, "agent-fixable failure burns one attempt");
    assert_eq!(specs.queues.code_writer.depth(), 1, "ci-fix job enqueued");
}
