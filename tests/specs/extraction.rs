// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier extraction from branch names and page titles.

use devloop_core::{design_id_from_title, issue_key_from_branch};

#[test]
fn branch_identifier_extraction() {
    assert_eq!(issue_key_from_branch("feature/tos-40-payments").as_deref(), Some("TOS-40"));
    assert_eq!(issue_key_from_branch("main"), None);
    assert_eq!(issue_key_from_branch("fix/TOS-99-bug").as_deref(), Some("TOS-99"));
    assert_eq!(issue_key_from_branch("chore/tos-7-cleanup").as_deref(), Some("TOS-7"));
}

#[test]
fn page_title_extraction() {
    assert_eq!(
        design_id_from_title("[dsn-k3TQx] Payments design").map(|id| id.to_string()),
        Some("dsn-k3TQx".to_string())
    );
    assert_eq!(
        design_id_from_title("0b3e9a1c-4f2d-4e8a-9c1b-7d5e2f8a0c4d").map(|id| id.to_string()),
        Some("0b3e9a1c-4f2d-4e8a-9c1b-7d5e2f8a0c4d".to_string())
    );
    assert!(design_id_from_title("Payments design").is_none());
}
