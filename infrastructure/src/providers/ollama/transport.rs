//! HTTP transport seam for the Ollama API.
//!
//! The backend's provisioning state machine and endpoint routing are written
//! against [`OllamaTransport`], so they can be exercised with a scripted
//! transport in tests while [`HttpOllamaTransport`] carries the real wire
//! concerns: URLs, timeouts, status handling.

use super::types::{
    ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, PullRequest, TagsResponse,
};
use crate::providers::transport_error;
use async_trait::async_trait;
use nepho_application::BackendError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Timeout for model pulls. Downloads run minutes, not seconds; this is
/// separate from, and much longer than, the per-chat timeout.
pub const PULL_TIMEOUT: Duration = Duration::from_secs(300);

/// Transport-level view of the four Ollama endpoints.
#[async_trait]
pub trait OllamaTransport: Send + Sync {
    async fn list_tags(&self) -> Result<TagsResponse, BackendError>;

    async fn pull(&self, request: &PullRequest) -> Result<(), BackendError>;

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;
}

pub struct HttpOllamaTransport {
    base_url: String,
    client: reqwest::Client,
    pull_client: reqwest::Client,
    timeout: Duration,
}

impl HttpOllamaTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Configuration(e.to_string()))?;
        let pull_client = reqwest::Client::builder()
            .timeout(PULL_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Configuration(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            pull_client,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn read_body<R: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!(
                "API error: {} - {}",
                status.as_u16(),
                body
            )));
        }
        response
            .json()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("malformed response body: {e}")))
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        Self::read_body(response).await
    }
}

#[async_trait]
impl OllamaTransport for HttpOllamaTransport {
    async fn list_tags(&self) -> Result<TagsResponse, BackendError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        Self::read_body(response).await
    }

    async fn pull(&self, request: &PullRequest) -> Result<(), BackendError> {
        let response = self
            .pull_client
            .post(self.url("/api/pull"))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, PULL_TIMEOUT))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!(
                "API error: {} - {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError> {
        self.post_json("/api/generate", request).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        self.post_json("/api/chat", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_doubled_slashes() {
        let transport =
            HttpOllamaTransport::new("http://localhost:11434/", Duration::from_secs(60)).unwrap();
        assert_eq!(transport.url("/api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn pull_timeout_far_exceeds_the_chat_timeout_default() {
        assert!(PULL_TIMEOUT >= Duration::from_secs(60) * 5);
    }
}
