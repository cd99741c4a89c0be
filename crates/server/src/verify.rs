// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook signature verification
//!
//! Both sources sign with HMAC-SHA-256 over a source-defined base string.
//! Comparison goes through `Mac::verify_slice`, which is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Chat replay window in seconds.
const REPLAY_WINDOW_SECS: i64 = 300;

/// Verification failures. The only outcomes of a verifier are pass or one
/// of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("webhook secret not configured")]
    Unconfigured,
    #[error("missing signature header")]
    MissingHeader,
    #[error("invalid timestamp header")]
    BadTimestamp,
    #[error("replay attack protection: timestamp outside tolerance")]
    Replay,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a chat (Slack) request.
///
/// Base string is `v0:{timestamp}:{raw-body}`; requests older or newer than
/// the replay window are rejected before any HMAC work.
pub fn verify_slack(
    secret: Option<&str>,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now_epoch_secs: i64,
) -> Result<(), VerifyError> {
    let secret = secret.ok_or(VerifyError::Unconfigured)?;
    let timestamp = timestamp.ok_or(VerifyError::MissingHeader)?;
    let signature = signature.ok_or(VerifyError::MissingHeader)?;

    let ts: i64 = timestamp.trim().parse().map_err(|_| VerifyError::BadTimestamp)?;
    if (now_epoch_secs - ts).abs() > REPLAY_WINDOW_SECS {
        return Err(VerifyError::Replay);
    }

    let provided = signature.strip_prefix("v0=").ok_or(VerifyError::Mismatch)?;
    let provided = hex_decode(provided).ok_or(VerifyError::Mismatch)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| VerifyError::Unconfigured)?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.verify_slice(&provided).map_err(|_| VerifyError::Mismatch)
}

/// Verify a source-control (GitHub) request. Base string is the raw body.
pub fn verify_github(
    secret: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), VerifyError> {
    let secret = secret.ok_or(VerifyError::Unconfigured)?;
    let signature = signature.ok_or(VerifyError::MissingHeader)?;

    let provided = signature.strip_prefix("sha256=").ok_or(VerifyError::Mismatch)?;
    let provided = hex_decode(provided).ok_or(VerifyError::Mismatch)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| VerifyError::Unconfigured)?;
    mac.update(body);
    mac.verify_slice(&provided).map_err(|_| VerifyError::Mismatch)
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Sign helper used by tests and local tooling.
pub fn sign_slack(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| {
        // new_from_slice accepts any key length for HMAC
        unreachable!("hmac accepts any key length")
    });
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    format!("v0={}", hex_encode(&mac.finalize().into_bytes()))
}

/// Sign helper used by tests and local tooling.
pub fn sign_github(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| {
        unreachable!("hmac accepts any key length")
    });
    mac.update(body);
    format!("sha256={}", hex_encode(&mac.finalize().into_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
