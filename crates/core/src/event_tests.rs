// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serializes_with_type_tag() {
    let event = Event::CiFailed {
        pr_number: 42,
        branch: "feature/tos-40-payments".to_string(),
        check_run_id: Some(7),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "ci:failed");
    assert_eq!(json["pr_number"], 42);
}

#[test]
fn round_trips_through_json() {
    let event = Event::PageComment {
        page_id: "12345".to_string(),
        design_id: DesignId::from_string("dsn-abc"),
        comments: vec!["looks wrong".to_string(), "fix the schema".to_string()],
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn unknown_type_deserializes_to_custom() {
    let event: Event = serde_json::from_str(r#"{"type":"future:thing","x":1}"#).unwrap();
    assert_eq!(event, Event::Custom);
}

#[test]
fn single_comment_still_serializes_as_array() {
    let event = Event::PrComment {
        pr_number: 9,
        branch: "fix/tos-1-x".to_string(),
        comments: vec!["just one".to_string()],
    };
    let json = serde_json::to_value(&event).unwrap();
    assert!(json["comments"].is_array());
    assert_eq!(json["comments"].as_array().unwrap().len(), 1);
}

#[test]
fn source_follows_kind() {
    let chat = Event::TaskRequested {
        design_id: None,
        description: "Build payments".to_string(),
        channel: "C1".to_string(),
        thread_ts: None,
        sender_id: "U1".to_string(),
        sender_name: "ada".to_string(),
    };
    assert_eq!(chat.source(), EventSource::Chat);
    assert_eq!(chat.kind().as_str(), "task:requested");

    let scm = Event::PrMerged { pr_number: 1, branch: "b".to_string() };
    assert_eq!(scm.source(), EventSource::Scm);

    let internal = Event::StageCompleted {
        design_id: DesignId::from_string("dsn-x"),
        stage: DesignStage::Design,
    };
    assert_eq!(internal.source(), EventSource::Internal);
}

#[test]
fn accessors_pull_shared_fields() {
    let event = Event::CiPassed { pr_number: 200, branch: "feature/tos-2-a".to_string() };
    assert_eq!(event.pr_number(), Some(200));
    assert!(event.design_id().is_none());
}
