// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document store adapter (Confluence)
//!
//! The document store has no webhooks; the polling bridge in the engine
//! drives this adapter instead.

use crate::error::{check_status, ApiError};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Slim view of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    pub id: String,
    pub title: String,
    pub version: u64,
}

/// A page comment, footer or inline.
#[derive(Debug, Clone, PartialEq)]
pub struct PageComment {
    pub author: String,
    pub body: String,
    /// ISO-8601 UTC
    pub created_at: String,
}

/// Adapter for the document store.
#[async_trait]
pub trait DocsApi: Send + Sync + 'static {
    /// Create a page and return its id.
    async fn create_page(
        &self,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<String, ApiError>;

    /// Update an existing page, bumping to `version`.
    async fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        version: u64,
    ) -> Result<(), ApiError>;

    async fn find_page(&self, title: &str) -> Result<Option<PageInfo>, ApiError>;

    /// The page's content state name, if any.
    async fn content_state(&self, page_id: &str) -> Result<Option<String>, ApiError>;

    /// Set a content state. Tries PUT, falls back to POST when the state
    /// does not exist yet.
    async fn set_content_state(
        &self,
        page_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError>;

    /// Pages whose content state marks them as in review.
    async fn pages_in_review(&self) -> Result<Vec<PageInfo>, ApiError>;

    /// Comments created strictly after `since` (ISO-8601), footer and
    /// inline merged, in creation order.
    async fn new_comments(
        &self,
        page_id: &str,
        since: &str,
    ) -> Result<Vec<PageComment>, ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    /// Space the design pages live in.
    pub space_id: Option<String>,
}

/// Confluence-backed document client.
pub struct ConfluenceDocs {
    config: DocsConfig,
    client: reqwest::Client,
}

impl ConfluenceDocs {
    pub fn new(config: DocsConfig) -> Self {
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
            .ok_or(ApiError::Unconfigured { service: "docs", missing: "base url" })
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.config
            .token
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "docs", missing: "token" })
    }

    async fn comments_at(
        &self,
        page_id: &str,
        kind: &str,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/v2/pages/{page_id}/{kind}", self.base_url()?))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let response = check_status("docs", response).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(body["results"].as_array().cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DocsApi for ConfluenceDocs {
    async fn create_page(
        &self,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut payload = json!({
            "title": title,
            "body": { "representation": "storage", "value": body },
        });
        if let Some(space) = self.config.space_id.as_deref() {
            payload["spaceId"] = json!(space);
        }
        if let Some(parent) = parent_id {
            payload["parentId"] = json!(parent);
        }
        let response = self
            .client
            .post(format!("{}/api/v2/pages", self.base_url()?))
            .bearer_auth(self.token()?)
            .json(&payload)
            .send()
            .await?;
        let response = check_status("docs", response).await?;
        let body: serde_json::Value = response.json().await?;
        body.get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Malformed {
                service: "docs",
                detail: "page create response missing id".to_string(),
            })
    }

    async fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        version: u64,
    ) -> Result<(), ApiError> {
        let payload = json!({
            "id": page_id,
            "status": "current",
            "title": title,
            "body": { "representation": "storage", "value": body },
            "version": { "number": version },
        });
        let response = self
            .client
            .put(format!("{}/api/v2/pages/{page_id}", self.base_url()?))
            .bearer_auth(self.token()?)
            .json(&payload)
            .send()
            .await?;
        check_status("docs", response).await?;
        Ok(())
    }

    async fn find_page(&self, title: &str) -> Result<Option<PageInfo>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/v2/pages", self.base_url()?))
            .bearer_auth(self.token()?)
            .query(&[("title", title)])
            .send()
            .await?;
        let response = check_status("docs", response).await?;
        let body: serde_json::Value = response.json().await?;
        let results = body["results"].as_array().cloned().unwrap_or_default();
        Ok(results.first().and_then(page_info))
    }

    async fn content_state(&self, page_id: &str) -> Result<Option<String>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/v2/pages/{page_id}/content-states", self.base_url()?))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = check_status("docs", response).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(body["contentState"]["name"]
            .as_str()
            .or_else(|| body["name"].as_str())
            .map(str::to_string))
    }

    async fn set_content_state(
        &self,
        page_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        let base = self.base_url()?;
        let payload = json!({ "name": key, "value": value });
        let url = format!("{base}/api/v2/pages/{page_id}/content-states");
        let response = self
            .client
            .put(&url)
            .bearer_auth(self.token()?)
            .json(&payload)
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            // State not created yet: fall back to POST.
            let response = self
                .client
                .post(&url)
                .bearer_auth(self.token()?)
                .json(&payload)
                .send()
                .await?;
            check_status("docs", response).await?;
            return Ok(());
        }
        check_status("docs", response).await?;
        Ok(())
    }

    async fn pages_in_review(&self) -> Result<Vec<PageInfo>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/v2/pages", self.base_url()?))
            .bearer_auth(self.token()?)
            .query(&[("content-state", "In Review")])
            .send()
            .await?;
        let response = check_status("docs", response).await?;
        let body: serde_json::Value = response.json().await?;
        let results = body["results"].as_array().cloned().unwrap_or_default();
        Ok(results.iter().filter_map(page_info).collect())
    }

    async fn new_comments(
        &self,
        page_id: &str,
        since: &str,
    ) -> Result<Vec<PageComment>, ApiError> {
        let mut raw = self.comments_at(page_id, "footer-comments").await?;
        raw.extend(self.comments_at(page_id, "inline-comments").await?);

        let mut comments: Vec<PageComment> = raw
            .iter()
            .filter_map(|c| {
                let created_at = c["version"]["createdAt"]
                    .as_str()
                    .or_else(|| c["createdAt"].as_str())?
                    .to_string();
                let body = c["body"]["storage"]["value"]
                    .as_str()
                    .or_else(|| c["body"].as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(PageComment { author: comment_author(c), body, created_at })
            })
            // Strictly newer than the watermark; equality is excluded.
            .filter(|c| c.created_at.as_str() > since)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

fn page_info(value: &serde_json::Value) -> Option<PageInfo> {
    Some(PageInfo {
        id: value.get("id")?.as_str()?.to_string(),
        title: value["title"].as_str().unwrap_or_default().to_string(),
        version: value["version"]["number"].as_u64().unwrap_or(1),
    })
}

/// Author display-name fallbacks: displayName, publicName, then the bare
/// account id.
fn comment_author(comment: &serde_json::Value) -> String {
    let author = &comment["version"]["authorId"];
    for candidate in [
        comment["author"]["displayName"].as_str(),
        comment["author"]["publicName"].as_str(),
        author.as_str(),
    ] {
        if let Some(name) = candidate {
            if !name.trim().is_empty() {
                return name.to_string();
            }
        }
    }
    "unknown".to_string()
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ApiError, DocsApi, PageComment, PageInfo};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeDocsState {
        pages: Vec<PageInfo>,
        bodies: HashMap<String, String>,
        states: HashMap<String, String>,
        comments: HashMap<String, Vec<PageComment>>,
        next_id: u64,
    }

    /// In-memory document store for testing.
    #[derive(Clone, Default)]
    pub struct FakeDocs {
        inner: Arc<Mutex<FakeDocsState>>,
    }

    impl FakeDocs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_state(&self, page_id: &str, state: &str) {
            self.inner.lock().states.insert(page_id.to_string(), state.to_string());
        }

        pub fn add_comment(&self, page_id: &str, author: &str, body: &str, created_at: &str) {
            self.inner.lock().comments.entry(page_id.to_string()).or_default().push(
                PageComment {
                    author: author.to_string(),
                    body: body.to_string(),
                    created_at: created_at.to_string(),
                },
            );
        }

        pub fn page_body(&self, page_id: &str) -> Option<String> {
            self.inner.lock().bodies.get(page_id).cloned()
        }

        pub fn pages(&self) -> Vec<PageInfo> {
            self.inner.lock().pages.clone()
        }
    }

    #[async_trait]
    impl DocsApi for FakeDocs {
        async fn create_page(
            &self,
            title: &str,
            body: &str,
            _parent_id: Option<&str>,
        ) -> Result<String, ApiError> {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let id = format!("{}", 90000 + inner.next_id);
            inner.pages.push(PageInfo {
                id: id.clone(),
                title: title.to_string(),
                version: 1,
            });
            inner.bodies.insert(id.clone(), body.to_string());
            Ok(id)
        }

        async fn update_page(
            &self,
            page_id: &str,
            title: &str,
            body: &str,
            version: u64,
        ) -> Result<(), ApiError> {
            let mut inner = self.inner.lock();
            let page = inner
                .pages
                .iter_mut()
                .find(|p| p.id == page_id)
                .ok_or_else(|| ApiError::NotFound { what: "page", key: page_id.to_string() })?;
            page.title = title.to_string();
            page.version = version;
            inner.bodies.insert(page_id.to_string(), body.to_string());
            Ok(())
        }

        async fn find_page(&self, title: &str) -> Result<Option<PageInfo>, ApiError> {
            Ok(self.inner.lock().pages.iter().find(|p| p.title == title).cloned())
        }

        async fn content_state(&self, page_id: &str) -> Result<Option<String>, ApiError> {
            Ok(self.inner.lock().states.get(page_id).cloned())
        }

        async fn set_content_state(
            &self,
            page_id: &str,
            _key: &str,
            value: &str,
        ) -> Result<(), ApiError> {
            self.inner.lock().states.insert(page_id.to_string(), value.to_string());
            Ok(())
        }

        async fn pages_in_review(&self) -> Result<Vec<PageInfo>, ApiError> {
            let inner = self.inner.lock();
            Ok(inner
                .pages
                .iter()
                .filter(|p| {
                    inner.states.get(&p.id).is_some_and(|s| {
                        s.eq_ignore_ascii_case("in review") || s.eq_ignore_ascii_case("approved")
                    })
                })
                .cloned()
                .collect())
        }

        async fn new_comments(
            &self,
            page_id: &str,
            since: &str,
        ) -> Result<Vec<PageComment>, ApiError> {
            let inner = self.inner.lock();
            let mut comments: Vec<PageComment> = inner
                .comments
                .get(page_id)
                .map(|all| {
                    all.iter().filter(|c| c.created_at.as_str() > since).cloned().collect()
                })
                .unwrap_or_default();
            comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(comments)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDocs;

#[cfg(test)]
#[path = "docs_tests.rs"]
mod tests;
