// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type

use thiserror::Error;

/// Errors surfaced by queue workers and the orchestrator.
///
/// The queue runner logs these and moves on; a failing job never takes the
/// queue down with it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] devloop_storage::StoreError),
    #[error("api error: {0}")]
    Api(#[from] devloop_adapters::ApiError),
    #[error("agent runner error: {0}")]
    Runner(#[from] devloop_adapters::RunnerError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Invalid(String),
}
