// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pull-request progression state

use crate::id::DesignId;
use serde::{Deserialize, Serialize};

/// Stage of a pull request. Advances monotonically; `Merged` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrStage {
    Implementation,
    InReview,
    Merged,
    Failed,
}

impl PrStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStage::Implementation => "implementation",
            PrStage::InReview => "in_review",
            PrStage::Merged => "merged",
            PrStage::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "implementation" => Some(PrStage::Implementation),
            "in_review" => Some(PrStage::InReview),
            "merged" => Some(PrStage::Merged),
            "failed" => Some(PrStage::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PrStage::Merged | PrStage::Failed)
    }

    /// Ordering rank used to reject backwards transitions.
    pub fn rank(&self) -> u8 {
        match self {
            PrStage::Implementation => 0,
            PrStage::InReview => 1,
            PrStage::Merged | PrStage::Failed => 2,
        }
    }
}

impl std::fmt::Display for PrStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an independent check stream (CI or automated review).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pending,
    Passing,
    Failing,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Passing => "passing",
            CheckStatus::Failing => "failing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CheckStatus::Pending),
            "passing" => Some(CheckStatus::Passing),
            "failing" => Some(CheckStatus::Failing),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record per pull request, keyed by PR number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrState {
    pub pr_number: u64,
    pub design_id: DesignId,
    pub stage: PrStage,
    pub issue_key: String,
    pub parent_key: Option<String>,
    pub feature_slug: Option<String>,
    pub ci_status: CheckStatus,
    pub review_status: CheckStatus,
    pub ci_attempts: u32,
    pub review_attempts: u32,
    /// Set after a flaky CI failure was retried; a second consecutive flaky
    /// failure escalates instead of retrying again.
    pub last_flaky: bool,
    pub created_at: String,
    pub updated_at: String,
}
