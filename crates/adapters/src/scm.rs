// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source control adapter (GitHub)

use crate::error::{check_status, ApiError};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Slim view of a pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub branch: String,
    pub title: String,
    pub merged: bool,
    pub url: String,
}

/// Adapter for source control. Getters return `None` on 404; every other
/// error propagates.
#[async_trait]
pub trait ScmApi: Send + Sync + 'static {
    async fn get_pr(&self, number: u64) -> Result<Option<PullRequest>, ApiError>;

    /// Find the open PR whose head is `branch`.
    async fn find_pr(&self, branch: &str) -> Result<Option<PullRequest>, ApiError>;

    /// Squash-merge.
    async fn merge_pr(&self, number: u64) -> Result<(), ApiError>;

    async fn pr_review_comments(&self, number: u64) -> Result<Vec<String>, ApiError>;

    async fn check_run_logs(&self, run_id: u64) -> Result<String, ApiError>;

    async fn pr_branch(&self, number: u64) -> Result<Option<String>, ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct ScmConfig {
    /// `owner/repo`
    pub repo: Option<String>,
    pub token: Option<String>,
    pub api_base: Option<String>,
}

/// GitHub-backed source control client.
pub struct GithubScm {
    config: ScmConfig,
    client: reqwest::Client,
}

impl GithubScm {
    pub fn new(config: ScmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("devloop")
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn api_base(&self) -> &str {
        self.config.api_base.as_deref().unwrap_or("https://api.github.com")
    }

    fn repo(&self) -> Result<&str, ApiError> {
        self.config
            .repo
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "scm", missing: "repo" })
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.config
            .token
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "scm", missing: "token" })
    }

    async fn get_json(&self, path: &str) -> Result<Option<serde_json::Value>, ApiError> {
        let response = self
            .client
            .get(format!("{}{path}", self.api_base()))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = check_status("scm", response).await?;
        Ok(Some(response.json().await?))
    }
}

fn pr_from_json(value: &serde_json::Value) -> Option<PullRequest> {
    Some(PullRequest {
        number: value.get("number")?.as_u64()?,
        branch: value["head"]["ref"].as_str().unwrap_or_default().to_string(),
        title: value["title"].as_str().unwrap_or_default().to_string(),
        merged: value["merged"].as_bool().unwrap_or(false)
            || value.get("merged_at").is_some_and(|v| !v.is_null()),
        url: value["html_url"].as_str().unwrap_or_default().to_string(),
    })
}

#[async_trait]
impl ScmApi for GithubScm {
    async fn get_pr(&self, number: u64) -> Result<Option<PullRequest>, ApiError> {
        let repo = self.repo()?.to_string();
        let body = self.get_json(&format!("/repos/{repo}/pulls/{number}")).await?;
        Ok(body.as_ref().and_then(pr_from_json))
    }

    async fn find_pr(&self, branch: &str) -> Result<Option<PullRequest>, ApiError> {
        let repo = self.repo()?.to_string();
        let owner = repo.split('/').next().unwrap_or_default();
        let response = self
            .client
            .get(format!("{}/repos/{repo}/pulls", self.api_base()))
            .bearer_auth(self.token()?)
            .query(&[("head", format!("{owner}:{branch}")), ("state", "open".to_string())])
            .send()
            .await?;
        let response = check_status("scm", response).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(body.as_array().and_then(|prs| prs.first()).and_then(pr_from_json))
    }

    async fn merge_pr(&self, number: u64) -> Result<(), ApiError> {
        let repo = self.repo()?.to_string();
        let response = self
            .client
            .put(format!("{}/repos/{repo}/pulls/{number}/merge", self.api_base()))
            .bearer_auth(self.token()?)
            .json(&json!({ "merge_method": "squash" }))
            .send()
            .await?;
        check_status("scm", response).await?;
        Ok(())
    }

    async fn pr_review_comments(&self, number: u64) -> Result<Vec<String>, ApiError> {
        let repo = self.repo()?.to_string();
        let body = self
            .get_json(&format!("/repos/{repo}/pulls/{number}/comments"))
            .await?
            .unwrap_or_else(|| json!([]));
        Ok(body
            .as_array()
            .map(|comments| {
                comments
                    .iter()
                    .filter_map(|c| c["body"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn check_run_logs(&self, run_id: u64) -> Result<String, ApiError> {
        let repo = self.repo()?.to_string();
        let response = self
            .client
            .get(format!("{}/repos/{repo}/actions/runs/{run_id}/logs", self.api_base()))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let response = check_status("scm", response).await?;
        Ok(response.text().await?)
    }

    async fn pr_branch(&self, number: u64) -> Result<Option<String>, ApiError> {
        Ok(self.get_pr(number).await?.map(|pr| pr.branch))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ApiError, PullRequest, ScmApi};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeScmState {
        prs: HashMap<u64, PullRequest>,
        review_comments: HashMap<u64, Vec<String>>,
        check_logs: HashMap<u64, String>,
        merged: Vec<u64>,
    }

    /// In-memory source control for testing.
    #[derive(Clone, Default)]
    pub struct FakeScm {
        inner: Arc<Mutex<FakeScmState>>,
    }

    impl FakeScm {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_pr(&self, number: u64, branch: &str, title: &str) {
            self.inner.lock().prs.insert(
                number,
                PullRequest {
                    number,
                    branch: branch.to_string(),
                    title: title.to_string(),
                    merged: false,
                    url: format!("https://github.example/pr/{number}"),
                },
            );
        }

        pub fn set_check_logs(&self, run_id: u64, logs: &str) {
            self.inner.lock().check_logs.insert(run_id, logs.to_string());
        }

        pub fn set_review_comments(&self, number: u64, comments: Vec<String>) {
            self.inner.lock().review_comments.insert(number, comments);
        }

        /// PR numbers merged through this fake, in order.
        pub fn merged(&self) -> Vec<u64> {
            self.inner.lock().merged.clone()
        }
    }

    #[async_trait]
    impl ScmApi for FakeScm {
        async fn get_pr(&self, number: u64) -> Result<Option<PullRequest>, ApiError> {
            Ok(self.inner.lock().prs.get(&number).cloned())
        }

        async fn find_pr(&self, branch: &str) -> Result<Option<PullRequest>, ApiError> {
            Ok(self
                .inner
                .lock()
                .prs
                .values()
                .find(|pr| pr.branch == branch && !pr.merged)
                .cloned())
        }

        async fn merge_pr(&self, number: u64) -> Result<(), ApiError> {
            let mut inner = self.inner.lock();
            let pr = inner
                .prs
                .get_mut(&number)
                .ok_or_else(|| ApiError::NotFound { what: "pr", key: number.to_string() })?;
            pr.merged = true;
            inner.merged.push(number);
            Ok(())
        }

        async fn pr_review_comments(&self, number: u64) -> Result<Vec<String>, ApiError> {
            Ok(self.inner.lock().review_comments.get(&number).cloned().unwrap_or_default())
        }

        async fn check_run_logs(&self, run_id: u64) -> Result<String, ApiError> {
            Ok(self.inner.lock().check_logs.get(&run_id).cloned().unwrap_or_default())
        }

        async fn pr_branch(&self, number: u64) -> Result<Option<String>, ApiError> {
            Ok(self.inner.lock().prs.get(&number).map(|pr| pr.branch.clone()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeScm;

#[cfg(test)]
#[path = "scm_tests.rs"]
mod tests;
