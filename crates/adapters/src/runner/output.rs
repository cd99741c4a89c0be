// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent output parsing
//!
//! Agents print a single JSON object on stdout. Fields are optional and
//! only accepted when their runtime type matches; a wrong-typed field is
//! dropped, not coerced. Text that is not a JSON object becomes
//! `{ result: raw }`. Parsing never fails.

use serde::{Deserialize, Serialize};

/// Parsed agent report. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    pub result: Option<String>,
    pub cost_usd: Option<f64>,
    pub duration_ms: Option<u64>,
    pub duration_api_ms: Option<u64>,
    pub num_turns: Option<u64>,
    pub is_error: Option<bool>,
    pub session_id: Option<String>,
}

/// Parse raw agent stdout into a report.
pub fn parse_agent_output(raw: &str) -> AgentReport {
    let value: serde_json::Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(_) => {
            return AgentReport { result: Some(raw.to_string()), ..Default::default() };
        }
    };
    if !value.is_object() {
        return AgentReport { result: Some(raw.to_string()), ..Default::default() };
    }
    AgentReport {
        result: value.get("result").and_then(|v| v.as_str()).map(str::to_string),
        cost_usd: value.get("cost_usd").and_then(|v| v.as_f64()),
        duration_ms: value.get("duration_ms").and_then(|v| v.as_u64()),
        duration_api_ms: value.get("duration_api_ms").and_then(|v| v.as_u64()),
        num_turns: value.get("num_turns").and_then(|v| v.as_u64()),
        is_error: value.get("is_error").and_then(|v| v.as_bool()),
        session_id: value.get("session_id").and_then(|v| v.as_str()).map(str::to_string),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
