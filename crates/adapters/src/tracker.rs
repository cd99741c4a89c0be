// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tracker adapter (Jira)

use crate::error::{check_status, ApiError};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Fields for a new issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueFields {
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

/// Slim view of an existing issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSummary {
    pub key: String,
    pub summary: String,
    pub status: String,
}

/// Adapter for the issue tracker.
#[async_trait]
pub trait TrackerApi: Send + Sync + 'static {
    /// Create an issue, returning its key.
    async fn create_issue(&self, fields: IssueFields) -> Result<String, ApiError>;

    /// Create a sub-task under a parent. The sub-task issue type is forced
    /// regardless of what `fields` says.
    async fn create_sub_task(
        &self,
        parent_key: &str,
        fields: IssueFields,
    ) -> Result<String, ApiError>;

    async fn get_sub_tasks(&self, parent_key: &str) -> Result<Vec<IssueSummary>, ApiError>;

    /// Transition an issue by transition name (resolved case-insensitively
    /// against the issue's available transitions, then posted by id).
    async fn transition(&self, issue_key: &str, transition_name: &str) -> Result<(), ApiError>;

    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// Jira-backed tracker client.
pub struct JiraTracker {
    config: TrackerConfig,
    client: reqwest::Client,
}

impl JiraTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn base_url(&self) -> Result<&str, ApiError> {
        self.config
            .base_url
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "tracker", missing: "base url" })
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.config
            .token
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "tracker", missing: "token" })
    }

    async fn post_issue(&self, fields: serde_json::Value) -> Result<String, ApiError> {
        let response = self
            .client
            .post(format!("{}/rest/api/3/issue", self.base_url()?))
            .bearer_auth(self.token()?)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let response = check_status("tracker", response).await?;
        let body: serde_json::Value = response.json().await?;
        body.get("key")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Malformed {
                service: "tracker",
                detail: "issue create response missing key".to_string(),
            })
    }
}

#[async_trait]
impl TrackerApi for JiraTracker {
    async fn create_issue(&self, fields: IssueFields) -> Result<String, ApiError> {
        self.post_issue(json!({
            "project": { "key": fields.project },
            "summary": fields.summary,
            "description": doc_body(&fields.description),
            "issuetype": { "name": fields.issue_type },
        }))
        .await
    }

    async fn create_sub_task(
        &self,
        parent_key: &str,
        fields: IssueFields,
    ) -> Result<String, ApiError> {
        self.post_issue(json!({
            "project": { "key": fields.project },
            "parent": { "key": parent_key },
            "summary": fields.summary,
            "description": doc_body(&fields.description),
            // Always the sub-task type, whatever the caller passed.
            "issuetype": { "name": "Sub-task" },
        }))
        .await
    }

    async fn get_sub_tasks(&self, parent_key: &str) -> Result<Vec<IssueSummary>, ApiError> {
        let response = self
            .client
            .get(format!("{}/rest/api/3/issue/{}", self.base_url()?, parent_key))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let response = check_status("tracker", response).await?;
        let body: serde_json::Value = response.json().await?;
        let subtasks = body["fields"]["subtasks"].as_array().cloned().unwrap_or_default();
        Ok(subtasks
            .iter()
            .filter_map(|st| {
                let key = st.get("key")?.as_str()?.to_string();
                let summary = st["fields"]["summary"].as_str().unwrap_or_default().to_string();
                let status =
                    st["fields"]["status"]["name"].as_str().unwrap_or_default().to_string();
                Some(IssueSummary { key, summary, status })
            })
            .collect())
    }

    async fn transition(&self, issue_key: &str, transition_name: &str) -> Result<(), ApiError> {
        let base = self.base_url()?;
        let response = self
            .client
            .get(format!("{base}/rest/api/3/issue/{issue_key}/transitions"))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let response = check_status("tracker", response).await?;
        let body: serde_json::Value = response.json().await?;
        let transitions = body["transitions"].as_array().cloned().unwrap_or_default();
        let id = transitions
            .iter()
            .find(|t| {
                t["name"]
                    .as_str()
                    .is_some_and(|n| n.eq_ignore_ascii_case(transition_name))
            })
            .and_then(|t| t["id"].as_str())
            .map(str::to_string)
            .ok_or_else(|| ApiError::NotFound {
                what: "transition",
                key: format!("{issue_key}:{transition_name}"),
            })?;

        let response = self
            .client
            .post(format!("{base}/rest/api/3/issue/{issue_key}/transitions"))
            .bearer_auth(self.token()?)
            .json(&json!({ "transition": { "id": id } }))
            .send()
            .await?;
        check_status("tracker", response).await?;
        Ok(())
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/rest/api/3/issue/{}/comment", self.base_url()?, issue_key))
            .bearer_auth(self.token()?)
            .json(&json!({ "body": doc_body(body) }))
            .send()
            .await?;
        check_status("tracker", response).await?;
        Ok(())
    }
}

/// Wrap plain text in the tracker's document format (one paragraph).
fn doc_body(text: &str) -> serde_json::Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        }]
    })
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ApiError, IssueFields, IssueSummary, TrackerApi};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded tracker mutation
    #[derive(Debug, Clone, PartialEq)]
    pub enum TrackerCall {
        CreateIssue { key: String, summary: String, issue_type: String },
        CreateSubTask { parent: String, key: String, summary: String },
        Transition { issue_key: String, name: String },
        Comment { issue_key: String, body: String },
    }

    #[derive(Default)]
    struct FakeTrackerState {
        calls: Vec<TrackerCall>,
        sub_tasks: std::collections::HashMap<String, Vec<IssueSummary>>,
        next_issue: u64,
    }

    /// Fake tracker for testing. Issues get sequential `TOS-n` keys.
    #[derive(Clone, Default)]
    pub struct FakeTracker {
        inner: Arc<Mutex<FakeTrackerState>>,
    }

    impl FakeTracker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<TrackerCall> {
            self.inner.lock().calls.clone()
        }

        /// Pre-seed sub-tasks under a parent (for idempotency tests).
        pub fn seed_sub_task(&self, parent: &str, key: &str, summary: &str) {
            self.inner.lock().sub_tasks.entry(parent.to_string()).or_default().push(
                IssueSummary {
                    key: key.to_string(),
                    summary: summary.to_string(),
                    status: "To Do".to_string(),
                },
            );
        }
    }

    #[async_trait]
    impl TrackerApi for FakeTracker {
        async fn create_issue(&self, fields: IssueFields) -> Result<String, ApiError> {
            let mut inner = self.inner.lock();
            inner.next_issue += 1;
            let key = format!("{}-{}", fields.project, inner.next_issue + 39);
            inner.calls.push(TrackerCall::CreateIssue {
                key: key.clone(),
                summary: fields.summary,
                issue_type: fields.issue_type,
            });
            Ok(key)
        }

        async fn create_sub_task(
            &self,
            parent_key: &str,
            fields: IssueFields,
        ) -> Result<String, ApiError> {
            let mut inner = self.inner.lock();
            inner.next_issue += 1;
            let key = format!("{}-{}", fields.project, inner.next_issue + 39);
            inner.calls.push(TrackerCall::CreateSubTask {
                parent: parent_key.to_string(),
                key: key.clone(),
                summary: fields.summary.clone(),
            });
            inner.sub_tasks.entry(parent_key.to_string()).or_default().push(IssueSummary {
                key: key.clone(),
                summary: fields.summary,
                status: "To Do".to_string(),
            });
            Ok(key)
        }

        async fn get_sub_tasks(&self, parent_key: &str) -> Result<Vec<IssueSummary>, ApiError> {
            Ok(self.inner.lock().sub_tasks.get(parent_key).cloned().unwrap_or_default())
        }

        async fn transition(
            &self,
            issue_key: &str,
            transition_name: &str,
        ) -> Result<(), ApiError> {
            self.inner.lock().calls.push(TrackerCall::Transition {
                issue_key: issue_key.to_string(),
                name: transition_name.to_string(),
            });
            Ok(())
        }

        async fn add_comment(&self, issue_key: &str, body: &str) -> Result<(), ApiError> {
            self.inner.lock().calls.push(TrackerCall::Comment {
                issue_key: issue_key.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTracker, TrackerCall};

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
