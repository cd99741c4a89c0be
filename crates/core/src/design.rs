// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Design records: one end-to-end unit of work from intake to merge

use crate::id::DesignId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle stage of a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStage {
    Design,
    Implementation,
    Complete,
}

impl DesignStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStage::Design => "design",
            DesignStage::Implementation => "implementation",
            DesignStage::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "design" => Some(DesignStage::Design),
            "implementation" => Some(DesignStage::Implementation),
            "complete" => Some(DesignStage::Complete),
            _ => None,
        }
    }
}

impl std::fmt::Display for DesignStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run status of a design, orthogonal to its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStatus {
    Running,
    Approved,
    Failed,
}

impl DesignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStatus::Running => "running",
            DesignStatus::Approved => "approved",
            DesignStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(DesignStatus::Running),
            "approved" => Some(DesignStatus::Approved),
            "failed" => Some(DesignStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DesignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A design row. Created at intake, never deleted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: DesignId,
    pub description: String,
    pub stage: DesignStage,
    pub status: DesignStatus,
    /// Document-store page, set once the design doc is published.
    pub page_id: Option<String>,
    /// Issue-tracker parent key, set once the design is approved.
    pub parent_key: Option<String>,
    pub review_attempts: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Pointer to a file an agent wrote for a design.
///
/// Keys are opaque (`design_doc`, `design_doc.r1`, ...); an update with the
/// same key replaces the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignOutput {
    pub design_id: DesignId,
    pub key: String,
    pub path: PathBuf,
}
