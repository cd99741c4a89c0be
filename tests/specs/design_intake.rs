// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Happy-path design intake: signed chat message in, design row plus ack
//! out, design doc published once the review gate passes.

use crate::helpers::live;
use devloop_adapters::{DocsApi, SpawnScript};
use devloop_core::{DesignStatus, EventKind};
use devloop_server::parse::parse_slack;
use devloop_server::verify::{sign_slack, verify_slack};
use serde_json::json;

const SECRET: &str = "test-signing-secret";

fn chat_payload() -> serde_json::Value {
    json!({
        "type": "event_callback",
        "event": {
            "type": "message",
            "text": "Build payments",
            "user": "U1",
            "channel": "C1",
            "ts": "1717171717.000100"
        }
    })
}

#[tokio::test]
async fn signed_intake_flows_to_published_design() {
    // The agent result doubles as the design doc; APPROVED satisfies the
    // review gate on the reviewer pass.
    let script = SpawnScript::report(
        &json!({
            "result": "APPROVED\n\n# Payments\n\n## Implementation Plan\n- feature: Checkout\n"
        })
        .to_string(),
    );
    let specs = live(script);

    let body = serde_json::to_vec(&chat_payload()).unwrap();
    let now = 1_700_000_000i64;
    let ts = now.to_string();
    let signature = sign_slack(SECRET, &ts, &body);
    verify_slack(Some(SECRET), Some(&ts), Some(&signature), &body, now)
        .expect("correctly signed payload verifies");

    let events = parse_slack(&chat_payload());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::TaskRequested);
    for event in events {
        specs.dispatcher.dispatch(event);
    }
    specs.settle().await;

    // Design row created with status running
    let designs = specs.store.list_designs_by_status(DesignStatus::Running).unwrap();
    assert_eq!(designs.len(), 1);
    assert_eq!(designs[0].description, "Build payments");

    // Ack reply threaded under the originating message
    let acks = specs.chat.calls();
    assert!(acks.iter().any(|c| {
        c.text == "Got it — starting design"
            && c.channel.as_deref() == Some("C1")
            && c.thread_ts.as_deref() == Some("1717171717.000100")
    }));

    // Review gate passed: doc published and flagged for review
    let design = specs.store.get_design(&designs[0].id).unwrap();
    let page_id = design.page_id.expect("design doc published");
    assert!(specs.chat_texts().iter().any(|t| t.starts_with("Design ready for review")));
    assert_eq!(
        specs.docs.content_state(&page_id).await.unwrap().as_deref(),
        Some("In Review")
    );
}
