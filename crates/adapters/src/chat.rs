// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat adapter (Slack)

use crate::error::{check_status, ApiError};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Adapter for the chat channel humans drive the pipeline from.
#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    /// Post via the incoming webhook, optionally threaded.
    async fn send(&self, text: &str, thread_ts: Option<&str>) -> Result<(), ApiError>;

    /// Post to a specific channel via the Web API.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), ApiError>;

    /// Resolve a user id to a display name. Falls back through the profile
    /// fields and ultimately to the id itself.
    async fn user_name(&self, user_id: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct SlackConfig {
    pub webhook_url: Option<String>,
    pub bot_token: Option<String>,
    /// Web API base, overridable for tests.
    pub api_base: Option<String>,
}

/// Slack-backed chat client.
pub struct SlackChat {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackChat {
    pub fn new(config: SlackConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn api_base(&self) -> &str {
        self.config.api_base.as_deref().unwrap_or("https://slack.com/api")
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.config
            .bot_token
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "slack", missing: "bot token" })
    }
}

#[async_trait]
impl ChatApi for SlackChat {
    async fn send(&self, text: &str, thread_ts: Option<&str>) -> Result<(), ApiError> {
        let url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or(ApiError::Unconfigured { service: "slack", missing: "webhook url" })?;
        let mut payload = json!({ "text": text });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = json!(ts);
        }
        let response = self.client.post(url).json(&payload).send().await?;
        check_status("slack", response).await?;
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), ApiError> {
        let token = self.token()?;
        let mut payload = json!({ "channel": channel, "text": text });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = json!(ts);
        }
        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base()))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        let response = check_status("slack", response).await?;
        // Slack reports application errors inside a 200 body.
        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let detail = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(ApiError::Malformed { service: "slack", detail });
        }
        Ok(())
    }

    async fn user_name(&self, user_id: &str) -> Result<String, ApiError> {
        let token = self.token()?;
        let response = self
            .client
            .get(format!("{}/users.info", self.api_base()))
            .bearer_auth(token)
            .query(&[("user", user_id)])
            .send()
            .await?;
        let response = check_status("slack", response).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(display_name(&body, user_id))
    }
}

/// Fallback chain: profile.display_name, profile.real_name, user.real_name,
/// user.name, then the raw id.
pub(crate) fn display_name(body: &serde_json::Value, user_id: &str) -> String {
    let user = &body["user"];
    let profile = &user["profile"];
    for candidate in [
        profile.get("display_name"),
        profile.get("real_name"),
        user.get("real_name"),
        user.get("name"),
    ] {
        if let Some(name) = candidate.and_then(|v| v.as_str()) {
            if !name.trim().is_empty() {
                return name.to_string();
            }
        }
    }
    user_id.to_string()
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ApiError, ChatApi};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded chat message
    #[derive(Debug, Clone, PartialEq)]
    pub struct ChatCall {
        pub channel: Option<String>,
        pub text: String,
        pub thread_ts: Option<String>,
    }

    /// Fake chat adapter for testing
    #[derive(Clone, Default)]
    pub struct FakeChat {
        calls: Arc<Mutex<Vec<ChatCall>>>,
        names: Arc<Mutex<std::collections::HashMap<String, String>>>,
    }

    impl FakeChat {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_user(self, id: &str, name: &str) -> Self {
            self.names.lock().insert(id.to_string(), name.to_string());
            self
        }

        /// Get all recorded messages
        pub fn calls(&self) -> Vec<ChatCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ChatApi for FakeChat {
        async fn send(&self, text: &str, thread_ts: Option<&str>) -> Result<(), ApiError> {
            self.calls.lock().push(ChatCall {
                channel: None,
                text: text.to_string(),
                thread_ts: thread_ts.map(str::to_string),
            });
            Ok(())
        }

        async fn post_message(
            &self,
            channel: &str,
            text: &str,
            thread_ts: Option<&str>,
        ) -> Result<(), ApiError> {
            self.calls.lock().push(ChatCall {
                channel: Some(channel.to_string()),
                text: text.to_string(),
                thread_ts: thread_ts.map(str::to_string),
            });
            Ok(())
        }

        async fn user_name(&self, user_id: &str) -> Result<String, ApiError> {
            Ok(self
                .names
                .lock()
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| user_id.to_string()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ChatCall, FakeChat};

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
