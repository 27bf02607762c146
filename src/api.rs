//! HTTP client for the chat backend.

use crate::error::ProbeResult;
use crate::models::ChatRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use std::time::Duration;

static CONVERSATION_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""conversation_id"\s*:\s*"([^"]+)""#).expect("conversation_id pattern is valid")
});

/// Pull the first string-valued `conversation_id` out of a JSON body.
///
/// `"conversation_id": null` yields `None`.
pub fn extract_conversation_id(body: &str) -> Option<String> {
    CONVERSATION_ID_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Status and body of one backend response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }

    /// Body shortened for log lines and error messages.
    pub fn excerpt(&self) -> String {
        const LIMIT: usize = 200;
        match self.body.char_indices().nth(LIMIT) {
            Some((idx, _)) => format!("{}…", &self.body[..idx]),
            None => self.body.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> ProbeResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> ProbeResult<HttpReply> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(path, status = %status, "GET");
        Ok(HttpReply { status, body })
    }

    /// POST `/api/chat` with `{"message": ...}`.
    pub async fn post_chat(&self, message: &str) -> ProbeResult<HttpReply> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest { message })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "POST /api/chat");
        Ok(HttpReply { status, body })
    }
}
