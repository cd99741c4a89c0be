// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn pr_from_json_reads_head_ref_and_merged() {
    let value = json!({
        "number": 42,
        "title": "Add payments",
        "head": { "ref": "feature/tos-40-payments" },
        "merged": true,
        "html_url": "https://github.example/pr/42"
    });
    let pr = pr_from_json(&value).unwrap();
    assert_eq!(pr.number, 42);
    assert_eq!(pr.branch, "feature/tos-40-payments");
    assert!(pr.merged);
}

#[test]
fn merged_at_counts_as_merged() {
    let value = json!({
        "number": 1,
        "head": { "ref": "b" },
        "merged_at": "2026-05-01T10:00:00Z"
    });
    assert!(pr_from_json(&value).unwrap().merged);
}

#[test]
fn missing_number_is_no_pr() {
    assert!(pr_from_json(&json!({"head": {"ref": "b"}})).is_none());
}

#[tokio::test]
async fn fake_find_pr_skips_merged() {
    let scm = FakeScm::new();
    scm.add_pr(200, "feature/tos-41-schema", "Schema");
    scm.merge_pr(200).await.unwrap();
    assert!(scm.find_pr("feature/tos-41-schema").await.unwrap().is_none());
    // get_pr still sees it, flagged merged
    assert!(scm.get_pr(200).await.unwrap().unwrap().merged);
}

#[tokio::test]
async fn unconfigured_scm_fails_only_when_used() {
    let scm = GithubScm::new(ScmConfig::default());
    let err = scm.get_pr(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Unconfigured { service: "scm", .. }));
}
