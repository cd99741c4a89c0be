// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sibling merge gate: the parent issue moves only when every PR under the
//! design has merged.

use crate::helpers::idle;
use devloop_adapters::{SpawnScript, TrackerCall};
use devloop_core::{DesignId, DesignStage, Event, PrStage};

#[tokio::test]
async fn parent_transitions_only_after_last_sibling_merges() {
    let specs = idle(SpawnScript::report("{}"));
    let design_id = DesignId::from_string("dsn-a");
    specs.store.create_design(&design_id, "Build payments").unwrap();
    specs.store.set_design_parent_key(&design_id, "TOS-40").unwrap();
    specs.store.advance_design_stage(&design_id, DesignStage::Implementation).unwrap();

    // Plan with two feature tasks, both with PRs
    let dir = specs.dir.path().join("designs").join("dsn-a").join("design");
    std::fs::create_dir_all(&dir).unwrap();
    let doc = dir.join("design_doc.md");
    std::fs::write(&doc, "## Implementation Plan\n- feature: Schema\n- feature: Checkout\n")
        .unwrap();
    specs.store.record_output(&design_id, "design_doc", &doc).unwrap();

    specs.store.create_pr(200, &design_id, "TOS-41", Some("TOS-40"), Some("schema")).unwrap();
    specs.store.create_pr(201, &design_id, "TOS-42", Some("TOS-40"), Some("checkout")).unwrap();
    specs.scm.add_pr(200, "feature/tos-41-schema", "Schema");
    specs.scm.add_pr(201, "feature/tos-42-checkout", "Checkout");

    // PR 200 merged, 201 only approved: the gate stays closed
    specs
        .orchestrator
        .handle_orchestrator_event(Event::PrMerged {
            pr_number: 200,
            branch: "feature/tos-41-schema".to_string(),
        })
        .await
        .unwrap();
    specs
        .orchestrator
        .handle_orchestrator_event(Event::PrApproved {
            pr_number: 201,
            branch: "feature/tos-42-checkout".to_string(),
        })
        .await
        .unwrap();

    // The approval path merges 201 itself, so by now both are merged and
    // the gate opens.
    assert_eq!(specs.store.get_pr(200).unwrap().unwrap().stage, PrStage::Merged);
    assert_eq!(specs.store.get_pr(201).unwrap().unwrap().stage, PrStage::Merged);
    assert!(specs.store.all_siblings_merged(&design_id).unwrap());

    let transitions: Vec<_> = specs
        .tracker
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            TrackerCall::Transition { issue_key, name } => Some((issue_key, name)),
            _ => None,
        })
        .collect();
    // Both sub-tasks and, last, the parent
    assert!(transitions.contains(&("TOS-41".to_string(), "Done".to_string())));
    assert!(transitions.contains(&("TOS-42".to_string(), "Done".to_string())));
    assert_eq!(transitions.last().unwrap().0, "TOS-40");
    assert_eq!(specs.store.get_design(&design_id).unwrap().stage, DesignStage::Complete);
}

#[tokio::test]
async fn gate_is_false_while_a_sibling_is_only_approved() {
    let specs = idle(SpawnScript::report("{}"));
    let design_id = DesignId::from_string("dsn-b");
    specs.store.create_design(&design_id, "x").unwrap();
    specs.store.create_pr(200, &design_id, "TOS-41", None, None).unwrap();
    specs.store.create_pr(201, &design_id, "TOS-42", None, None).unwrap();
    specs.store.update_pr_stage(200, PrStage::InReview).unwrap();
    specs.store.update_pr_stage(200, PrStage::Merged).unwrap();

    // 201 sits approved-but-unmerged
    assert!(!specs.store.all_siblings_merged(&design_id).unwrap());

    specs.store.update_pr_stage(201, PrStage::InReview).unwrap();
    specs.store.update_pr_stage(201, PrStage::Merged).unwrap();
    assert!(specs.store.all_siblings_merged(&design_id).unwrap());
}
