// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP routes: webhook ingress, manual retries, trigger, health

use crate::parse::{challenge_response, parse_github, parse_slack};
use crate::verify::{verify_github, verify_slack};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use devloop_core::{AgentKind, DesignId, DesignStatus, Event, TaskKind};
use devloop_engine::Dispatcher;
use devloop_storage::{Store, StoreError};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<Store>,
    pub slack_signing_secret: Option<String>,
    pub github_webhook_secret: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/:source", post(webhook))
        .route("/retry/:pr_number/ci", post(retry_ci))
        .route("/retry/:pr_number/review", post(retry_review))
        .route("/trigger/:design_id", post(trigger))
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(state)
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn store_error(e: StoreError) -> Response {
    match e {
        StoreError::NotFound { what, key } => (
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "error": format!("{what} not found: {key}")})),
        )
            .into_response(),
        other => {
            tracing::error!(error = %other, "store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"ok": false, "error": "internal error"})),
            )
                .into_response()
        }
    }
}

async fn webhook(
    Path(source): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match source.as_str() {
        "slack" => slack_webhook(&state, &headers, &body).await,
        "github" => github_webhook(&state, &headers, &body).await,
        other => (
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "error": format!("unknown source: {other}")})),
        )
            .into_response(),
    }
}

async fn slack_webhook(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Response {
    let verified = verify_slack(
        state.slack_signing_secret.as_deref(),
        header(headers, "x-slack-request-timestamp"),
        header(headers, "x-slack-signature"),
        body,
        now_epoch_secs(),
    );
    if let Err(e) = verified {
        tracing::warn!(error = %e, "slack webhook rejected");
        return (StatusCode::UNAUTHORIZED, Json(json!({"ok": false, "error": e.to_string()})))
            .into_response();
    }

    let payload: serde_json::Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "error": format!("invalid json: {e}")})),
            )
                .into_response();
        }
    };

    if let Some(challenge) = challenge_response(&payload) {
        return Json(json!({"challenge": challenge})).into_response();
    }

    for event in parse_slack(&payload) {
        state.dispatcher.dispatch(event);
    }
    Json(json!({"ok": true})).into_response()
}

async fn github_webhook(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Response {
    let verified = verify_github(
        state.github_webhook_secret.as_deref(),
        header(headers, "x-hub-signature-256"),
        body,
    );
    if let Err(e) = verified {
        tracing::warn!(error = %e, "github webhook rejected");
        return (StatusCode::UNAUTHORIZED, Json(json!({"ok": false, "error": e.to_string()})))
            .into_response();
    }

    let Some(event_name) = header(headers, "x-github-event").map(str::to_string) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error": "missing x-github-event header"})),
        )
            .into_response();
    };
    let payload: serde_json::Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "error": format!("invalid json: {e}")})),
            )
                .into_response();
        }
    };

    for event in parse_github(&event_name, &payload) {
        state.dispatcher.dispatch(event);
    }
    Json(json!({"ok": true})).into_response()
}

/// Reset the CI counter and replay a `ci:failed` for the PR.
async fn retry_ci(Path(pr_number): Path<u64>, State(state): State<AppState>) -> Response {
    let pr = match state.store.get_pr(pr_number) {
        Ok(Some(pr)) => pr,
        Ok(None) => {
            return store_error(StoreError::NotFound {
                what: "pr_state",
                key: pr_number.to_string(),
            });
        }
        Err(e) => return store_error(e),
    };
    if let Err(e) = state.store.reset_ci_attempts(pr_number) {
        return store_error(e);
    }
    state.dispatcher.dispatch(Event::CiFailed {
        pr_number,
        branch: rebuild_branch(&pr),
        check_run_id: None,
    });
    Json(json!({"ok": true})).into_response()
}

/// Reset the review counter and re-enqueue the automated review gate.
async fn retry_review(Path(pr_number): Path<u64>, State(state): State<AppState>) -> Response {
    let pr = match state.store.get_pr(pr_number) {
        Ok(Some(pr)) => pr,
        Ok(None) => {
            return store_error(StoreError::NotFound {
                what: "pr_state",
                key: pr_number.to_string(),
            });
        }
        Err(e) => return store_error(e),
    };
    if let Err(e) = state.store.reset_review_attempts(pr_number) {
        return store_error(e);
    }
    state.dispatcher.dispatch(Event::AgentTask {
        agent: AgentKind::Reviewer,
        task: TaskKind::CodeReview,
        design_id: pr.design_id.clone(),
        issue_key: Some(pr.issue_key.clone()),
        pr_number: Some(pr_number),
        branch: Some(rebuild_branch(&pr)),
        tier: None,
        comments: Vec::new(),
    });
    Json(json!({"ok": true})).into_response()
}

/// Re-emit the intake event for a stuck design.
async fn trigger(Path(design_id): Path<String>, State(state): State<AppState>) -> Response {
    let design_id = DesignId::from_string(design_id);
    let design = match state.store.get_design(&design_id) {
        Ok(design) => design,
        Err(e) => return store_error(e),
    };
    let intake = state.store.get_intake(&design_id).ok().flatten();
    state.dispatcher.dispatch(Event::TaskRequested {
        design_id: Some(design_id),
        description: design.description,
        channel: intake.as_ref().map(|i| i.channel.clone()).unwrap_or_default(),
        thread_ts: intake.as_ref().and_then(|i| i.thread_ts.clone()),
        sender_id: intake.as_ref().map(|i| i.requester_id.clone()).unwrap_or_default(),
        sender_name: intake.as_ref().map(|i| i.requester_name.clone()).unwrap_or_default(),
    });
    Json(json!({"ok": true})).into_response()
}

async fn health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

/// Snapshot of running designs and queue depths.
async fn status(State(state): State<AppState>) -> Response {
    let designs = match state.store.list_designs_by_status(DesignStatus::Running) {
        Ok(designs) => designs,
        Err(e) => return store_error(e),
    };
    let queues = state.dispatcher.queues();
    Json(json!({
        "designs": designs
            .iter()
            .map(|d| json!({
                "id": d.id,
                "stage": d.stage,
                "status": d.status,
                "review_attempts": d.review_attempts,
            }))
            .collect::<Vec<_>>(),
        "queues": {
            "architect": queues.architect.depth(),
            "code_writer": queues.code_writer.depth(),
            "reviewer": queues.reviewer.depth(),
            "orchestrator": queues.orchestrator.depth(),
        }
    }))
    .into_response()
}

/// Rebuild a PR's head branch from its stored issue key and slug.
fn rebuild_branch(pr: &devloop_core::PrState) -> String {
    match &pr.feature_slug {
        Some(slug) if !slug.is_empty() => {
            format!("feature/{}-{}", pr.issue_key.to_lowercase(), slug)
        }
        _ => format!("feature/{}", pr.issue_key.to_lowercase()),
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
