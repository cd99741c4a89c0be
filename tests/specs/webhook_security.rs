// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay rejection and signature integrity at the ingress boundary.

use devloop_server::verify::{sign_github, sign_slack, verify_github, verify_slack, VerifyError};

const SECRET: &str = "test-signing-secret";
const BODY: &[u8] =
    br#"{"type":"event_callback","event":{"type":"message","text":"Build payments"}}"#;

#[test]
fn stale_timestamp_is_rejected_as_replay() {
    let now = 1_700_000_000i64;
    // Same payload, signed 400 seconds ago
    let ts = (now - 400).to_string();
    let signature = sign_slack(SECRET, &ts, BODY);

    let err = verify_slack(Some(SECRET), Some(&ts), Some(&signature), BODY, now).unwrap_err();
    assert_eq!(err, VerifyError::Replay);
    assert!(err.to_string().contains("replay attack protection"));
}

#[test]
fn fresh_signature_passes_both_sources() {
    let now = 1_700_000_000i64;
    let ts = now.to_string();
    let slack_sig = sign_slack(SECRET, &ts, BODY);
    assert_eq!(verify_slack(Some(SECRET), Some(&ts), Some(&slack_sig), BODY, now), Ok(()));

    let github_sig = sign_github(SECRET, BODY);
    assert_eq!(verify_github(Some(SECRET), Some(&github_sig), BODY), Ok(()));
}

#[test]
fn tampered_body_fails_both_sources() {
    let now = 1_700_000_000i64;
    let ts = now.to_string();
    let slack_sig = sign_slack(SECRET, &ts, BODY);
    let github_sig = sign_github(SECRET, BODY);

    let mut tampered = BODY.to_vec();
    tampered[10] ^= 1;
    assert_eq!(
        verify_slack(Some(SECRET), Some(&ts), Some(&slack_sig), &tampered, now),
        Err(VerifyError::Mismatch)
    );
    assert_eq!(
        verify_github(Some(SECRET), Some(&github_sig), &tampered),
        Err(VerifyError::Mismatch)
    );
}
