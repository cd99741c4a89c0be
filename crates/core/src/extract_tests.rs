// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    feature = { "feature/tos-40-payments", Some("TOS-40") },
    fix_upper = { "fix/TOS-99-bug", Some("TOS-99") },
    chore = { "chore/ab1-7-cleanup", Some("AB1-7") },
    main = { "main", None },
    bare_key = { "tos-40-payments", None },
    release_prefix = { "release/tos-40-payments", None },
    missing_number = { "feature/tos-payments", None },
)]
fn branch_extraction(branch: &str, expected: Option<&str>) {
    assert_eq!(issue_key_from_branch(branch).as_deref(), expected);
}

#[test]
fn bracketed_title_wins() {
    let id = design_id_from_title("[dsn-k3TQx] Payments design").unwrap();
    assert_eq!(id.as_str(), "dsn-k3TQx");
}

#[test]
fn bracket_beats_uuid_shape() {
    let id = design_id_from_title("[custom-id] 0b3e9a1c-4f2d-4e8a-9c1b-7d5e2f8a0c4d").unwrap();
    assert_eq!(id.as_str(), "custom-id");
}

#[test]
fn uuid_title_accepted_whole() {
    let id = design_id_from_title("  0B3E9A1C-4f2d-4e8a-9c1b-7d5e2f8a0c4d ").unwrap();
    assert_eq!(id.as_str(), "0B3E9A1C-4f2d-4e8a-9c1b-7d5e2f8a0c4d");
}

#[parameterized(
    plain = { "Payments design" },
    empty_bracket = { "[] Payments" },
    uuid_with_suffix = { "0b3e9a1c-4f2d-4e8a-9c1b-7d5e2f8a0c4d design" },
)]
fn non_matching_titles(title: &str) {
    assert!(design_id_from_title(title).is_none());
}
