// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier extraction from branch names and page titles

use crate::id::DesignId;
use regex::Regex;
use std::sync::OnceLock;

fn branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        Regex::new(r"(?i)^(?:feature|fix|chore)/([a-z][a-z0-9]*-\d+)").unwrap()
    })
}

fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^\[([^\]]+)\]").unwrap()
    })
}

fn uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
    })
}

/// Extract an issue key from a branch name.
///
/// Branches look like `feature/tos-40-payments`; the key is normalised to
/// upper case (`TOS-40`). Branches outside the `feature|fix|chore` prefixes
/// yield `None`.
pub fn issue_key_from_branch(branch: &str) -> Option<String> {
    branch_re()
        .captures(branch)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Extract a design id from a document page title.
///
/// A bracketed prefix (`[dsn-abc] Payments design`) wins; otherwise the whole
/// trimmed title must be UUID-shaped.
pub fn design_id_from_title(title: &str) -> Option<DesignId> {
    let trimmed = title.trim();
    if let Some(c) = bracket_re().captures(trimmed) {
        let id = c[1].trim();
        if !id.is_empty() {
            return Some(DesignId::from_string(id));
        }
    }
    if uuid_re().is_match(trimmed) {
        return Some(DesignId::from_string(trimmed));
    }
    None
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
