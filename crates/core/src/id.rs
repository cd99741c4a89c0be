// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Design identifier newtype

use serde::{Deserialize, Serialize};

/// Stable identifier for a design, opaque everywhere outside this module.
///
/// Generated ids are `dsn-{nanoid}`; ids arriving from the outside (page
/// titles, manual triggers) are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignId(String);

impl DesignId {
    pub const PREFIX: &'static str = "dsn-";

    /// Generate a new random id with the type prefix
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, nanoid::nanoid!(19)))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DesignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DesignId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for DesignId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DesignId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DesignId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DesignId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
