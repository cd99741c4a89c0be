// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error type for the external REST clients

use thiserror::Error;

/// Errors from external client operations.
///
/// Getter methods translate 404 into `Ok(None)` before this type is ever
/// built; a `Status` error is therefore always unexpected for the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} is not configured: missing {missing}")]
    Unconfigured {
        service: &'static str,
        missing: &'static str,
    },
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },
    #[error("unexpected response shape from {service}: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// Transient failures are worth a retry; permanent ones are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { service, status: status.as_u16(), body })
}
