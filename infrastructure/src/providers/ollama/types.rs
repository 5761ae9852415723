//! Wire types for the Ollama HTTP API.
//!
//! The two response shapes mirror the two request shapes: the generate
//! endpoint answers in a flat `response` field, the chat endpoint nests the
//! text under `message.content`. Both fields are optional here so that a 2xx
//! response missing its payload degrades downstream instead of failing
//! deserialization.

use serde::{Deserialize, Serialize};

/// Registry listing (`GET /api/tags`)
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
}

/// Provisioning request (`POST /api/pull`)
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub name: String,
}

/// Vision request (`POST /api/generate`)
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub images: Vec<String>,
    pub stream: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}

/// Text request (`POST /api/chat`)
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatMessage>,
}
