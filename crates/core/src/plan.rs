// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Implementation-plan parser
//!
//! An approved design document ends with an `## Implementation Plan` section
//! listing one bullet per task:
//!
//! ```text
//! ## Implementation Plan
//! - foundation: Schema — add the payments tables
//! - feature: Checkout flow — wire the new API
//! - Refund handling
//! ```
//!
//! Untagged bullets are features. At most one foundation task is honoured;
//! extra foundation bullets demote to features.

use serde::{Deserialize, Serialize};

/// Whether a planned task gates the rest of the implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTier {
    Foundation,
    Feature,
}

/// One task from the implementation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    pub tier: TaskTier,
    pub title: String,
    pub summary: String,
}

/// Parse the implementation plan out of a design document.
///
/// Returns tasks in document order, foundation first when present. An empty
/// vec means the document had no plan section or no bullets under it.
pub fn parse_plan(doc: &str) -> Vec<PlanTask> {
    let mut tasks = Vec::new();
    let mut in_plan = false;
    let mut have_foundation = false;

    for line in doc.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("##") {
            in_plan = heading.trim_start_matches('#').trim().eq_ignore_ascii_case("implementation plan");
            continue;
        }
        if !in_plan {
            continue;
        }
        let Some(body) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) else {
            continue;
        };
        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        let (mut tier, rest) = split_tier(body);
        if tier == TaskTier::Foundation {
            if have_foundation {
                tracing::warn!(task = rest, "extra foundation task demoted to feature");
                tier = TaskTier::Feature;
            } else {
                have_foundation = true;
            }
        }

        let (title, summary) = split_title(rest);
        tasks.push(PlanTask { tier, title, summary });
    }

    // Foundation gates everything else; surface it first regardless of
    // where it appeared in the list.
    tasks.sort_by_key(|t| match t.tier {
        TaskTier::Foundation => 0,
        TaskTier::Feature => 1,
    });
    tasks
}

fn split_tier(body: &str) -> (TaskTier, &str) {
    let lower = body.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("foundation:") {
        let offset = body.len() - rest.len();
        return (TaskTier::Foundation, body[offset..].trim());
    }
    if let Some(rest) = lower.strip_prefix("feature:") {
        let offset = body.len() - rest.len();
        return (TaskTier::Feature, body[offset..].trim());
    }
    (TaskTier::Feature, body)
}

fn split_title(rest: &str) -> (String, String) {
    for sep in [" — ", " - ", ": "] {
        if let Some((title, summary)) = rest.split_once(sep) {
            let title = title.trim();
            let summary = summary.trim();
            if !title.is_empty() {
                return (title.to_string(), summary.to_string());
            }
        }
    }
    (rest.to_string(), String::new())
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
