// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat (Slack) payload parsing

use devloop_core::Event;
use serde_json::Value;

/// Answer to a `url_verification` handshake, if this payload is one.
pub fn challenge_response(body: &Value) -> Option<String> {
    if body["type"].as_str() == Some("url_verification") {
        body["challenge"].as_str().map(str::to_string)
    } else {
        None
    }
}

/// Parse an event-callback payload into domain events.
///
/// Only plain human messages become `task:requested`; bot-originated
/// messages (bot marker field or bot subtype) are filtered out.
pub fn parse_slack(body: &Value) -> Vec<Event> {
    if body["type"].as_str() != Some("event_callback") {
        return Vec::new();
    }
    let event = &body["event"];
    if event["type"].as_str() != Some("message") {
        return Vec::new();
    }
    if event.get("bot_id").is_some_and(|v| !v.is_null())
        || event["subtype"].as_str() == Some("bot_message")
    {
        tracing::debug!("ignoring bot message");
        return Vec::new();
    }

    let Some(text) = event["text"].as_str().map(str::trim).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    let Some(user) = event["user"].as_str() else {
        return Vec::new();
    };
    let Some(channel) = event["channel"].as_str() else {
        return Vec::new();
    };
    // Thread replies keep their thread; top-level messages start one.
    let thread_ts = event["thread_ts"]
        .as_str()
        .or_else(|| event["ts"].as_str())
        .map(str::to_string);

    vec![Event::TaskRequested {
        design_id: None,
        description: text.to_string(),
        channel: channel.to_string(),
        thread_ts,
        sender_id: user.to_string(),
        sender_name: user.to_string(),
    }]
}

#[cfg(test)]
#[path = "slack_tests.rs"]
mod tests;
