// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-control (GitHub) payload parsing

use devloop_core::Event;
use serde_json::Value;

/// Parse a webhook delivery into domain events. `event_name` is the
/// `X-GitHub-Event` header value.
pub fn parse_github(event_name: &str, body: &Value) -> Vec<Event> {
    match event_name {
        "check_suite" => parse_check_suite(body),
        "pull_request_review" => parse_review(body),
        "pull_request" => parse_pull_request(body),
        "issue_comment" => parse_issue_comment(body),
        other => {
            tracing::debug!(event = other, "unhandled source-control event");
            Vec::new()
        }
    }
}

fn parse_check_suite(body: &Value) -> Vec<Event> {
    if body["action"].as_str() != Some("completed") {
        return Vec::new();
    }
    let suite = &body["check_suite"];
    let check_run_id = suite["id"].as_u64();
    let conclusion = suite["conclusion"].as_str().unwrap_or_default();

    let prs = suite["pull_requests"].as_array().cloned().unwrap_or_default();
    let mut events = Vec::new();
    for pr in &prs {
        let Some(pr_number) = pr["number"].as_u64() else {
            continue;
        };
        let branch = pr["head"]["ref"].as_str().unwrap_or_default().to_string();
        match conclusion {
            "failure" | "timed_out" => {
                events.push(Event::CiFailed { pr_number, branch, check_run_id });
            }
            "success" => events.push(Event::CiPassed { pr_number, branch }),
            _ => {}
        }
    }
    events
}

fn parse_review(body: &Value) -> Vec<Event> {
    let Some(pr_number) = body["pull_request"]["number"].as_u64() else {
        return Vec::new();
    };
    let branch = body["pull_request"]["head"]["ref"].as_str().unwrap_or_default().to_string();
    let state = body["review"]["state"].as_str().unwrap_or_default();
    match state {
        "approved" => vec![Event::PrApproved { pr_number, branch }],
        "changes_requested" => {
            let comments = body["review"]["body"]
                .as_str()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(|b| vec![b.to_string()])
                .unwrap_or_default();
            vec![Event::PrChangesRequested { pr_number, branch, comments }]
        }
        _ => Vec::new(),
    }
}

fn parse_pull_request(body: &Value) -> Vec<Event> {
    if body["action"].as_str() != Some("closed") {
        return Vec::new();
    }
    if body["pull_request"]["merged"].as_bool() != Some(true) {
        return Vec::new();
    }
    let Some(pr_number) = body["pull_request"]["number"].as_u64() else {
        return Vec::new();
    };
    let branch = body["pull_request"]["head"]["ref"].as_str().unwrap_or_default().to_string();
    vec![Event::PrMerged { pr_number, branch }]
}

fn parse_issue_comment(body: &Value) -> Vec<Event> {
    if body["action"].as_str() != Some("created") {
        return Vec::new();
    }
    // Only comments on issues that are PRs
    if body["issue"].get("pull_request").map_or(true, Value::is_null) {
        return Vec::new();
    }
    let Some(pr_number) = body["issue"]["number"].as_u64() else {
        return Vec::new();
    };
    let Some(comment) = body["comment"]["body"].as_str().map(str::trim).filter(|c| !c.is_empty())
    else {
        return Vec::new();
    };
    // The comment payload has no head branch; downstream resolves it.
    vec![Event::PrComment {
        pr_number,
        branch: String::new(),
        comments: vec![comment.to_string()],
    }]
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
