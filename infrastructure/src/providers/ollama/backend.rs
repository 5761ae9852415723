//! Local chat backend with self-provisioning.
//!
//! Two decisions happen on every call. First the provisioning state machine
//! makes sure the configured model is actually installed on the server,
//! pulling it if the registry does not list it. Then the request is routed:
//! vision-capable model with images goes to the generate endpoint, everything
//! else goes to the chat endpoint.

use super::transport::{HttpOllamaTransport, OllamaTransport};
use super::types::{ChatMessage, ChatRequest, GenerateRequest, PullRequest};
use crate::gate::ImageGate;
use async_trait::async_trait;
use nepho_application::{BackendError, ChatBackend};
use nepho_domain::Model;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Fallback text when a 2xx response lacks the expected field. The labeling
/// loop still records one row for the image; the parse yields "Unknown".
pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// Provisioning lifecycle of the configured model on the local server.
///
/// ```text
/// Unknown -> Checking -> {Available, Missing} -> Pulling -> {Available, PullFailed}
/// ```
///
/// Cached per backend instance. Only `Available` short-circuits later calls;
/// any other resting state re-enters the registry check on the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unknown,
    Checking,
    Available,
    Missing,
    Pulling,
    PullFailed,
}

/// What to do when images are supplied but the model is not on the vision
/// allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonVisionImagePolicy {
    /// Drop the image payload and send text-only (logged as a warning).
    #[default]
    Drop,
    /// Fail the call with an invalid-input error.
    Reject,
}

/// Which endpoint a call routes to.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Generate,
    Chat,
}

/// Pick the endpoint for a call. Capability decides, not image presence
/// alone: a text-only call to a vision model still uses the chat endpoint.
pub fn route_for(model: &Model, has_images: bool) -> Route {
    if has_images && model.supports_vision() {
        Route::Generate
    } else {
        Route::Chat
    }
}

/// Chat backend for a local Ollama-style server.
pub struct OllamaBackend<T: OllamaTransport = HttpOllamaTransport> {
    model: Model,
    transport: T,
    gate: ImageGate,
    policy: NonVisionImagePolicy,
    state: Mutex<ModelState>,
}

impl OllamaBackend<HttpOllamaTransport> {
    pub fn new(
        model: Model,
        base_url: impl Into<String>,
        gate: ImageGate,
        timeout: Duration,
        policy: NonVisionImagePolicy,
    ) -> Result<Self, BackendError> {
        Ok(Self::with_transport(
            model,
            HttpOllamaTransport::new(base_url, timeout)?,
            gate,
            policy,
        ))
    }
}

impl<T: OllamaTransport> OllamaBackend<T> {
    pub fn with_transport(
        model: Model,
        transport: T,
        gate: ImageGate,
        policy: NonVisionImagePolicy,
    ) -> Self {
        Self {
            model,
            transport,
            gate,
            policy,
            state: Mutex::new(ModelState::Unknown),
        }
    }

    /// Drive the provisioning state machine until the model is known
    /// available, pulling it if necessary.
    ///
    /// Holds the state mutex for the whole check-then-pull so concurrent
    /// calls on the same instance never both pull the same missing model.
    async fn ensure_available(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        if *state == ModelState::Available {
            return Ok(());
        }

        *state = ModelState::Checking;
        let installed = match self.transport.list_tags().await {
            // Registry names are matched exactly, case-sensitively.
            Ok(tags) => tags.models.iter().any(|m| m.name == self.model.as_str()),
            Err(err) => {
                // Registry unreachable: treat as missing and let the pull
                // decide, rather than failing the call outright.
                warn!(error = %err, "model registry query failed; attempting pull");
                false
            }
        };

        if installed {
            *state = ModelState::Available;
            debug!(model = %self.model, "model available");
            return Ok(());
        }

        *state = ModelState::Missing;
        info!(model = %self.model, "model not installed; pulling");
        *state = ModelState::Pulling;
        match self
            .transport
            .pull(&PullRequest {
                name: self.model.to_string(),
            })
            .await
        {
            Ok(()) => {
                *state = ModelState::Available;
                info!(model = %self.model, "model pulled");
                Ok(())
            }
            Err(err) => {
                *state = ModelState::PullFailed;
                Err(BackendError::ModelUnavailable(format!(
                    "failed to pull model {}: {}",
                    self.model, err
                )))
            }
        }
    }

    fn encode_images(&self, images: &[PathBuf]) -> Result<Vec<String>, BackendError> {
        let mut encoded = Vec::with_capacity(images.len());
        for path in images {
            if !self.gate.validate(path) {
                return Err(BackendError::InvalidInput(format!(
                    "invalid image: {}",
                    path.display()
                )));
            }
            encoded.push(self.gate.encode(path)?);
        }
        Ok(encoded)
    }

    /// List the models installed on the server. Diagnostics only: failures
    /// degrade to an empty list instead of propagating.
    pub async fn list_models(&self) -> Vec<String> {
        match self.transport.list_tags().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(err) => {
                warn!(error = %err, "failed to list models");
                Vec::new()
            }
        }
    }

    #[cfg(test)]
    async fn state(&self) -> ModelState {
        *self.state.lock().await
    }
}

#[async_trait]
impl<T: OllamaTransport> ChatBackend for OllamaBackend<T> {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn chat(&self, prompt: &str, images: &[PathBuf]) -> Result<String, BackendError> {
        self.ensure_available().await?;

        let mut images = images;
        if !images.is_empty() && !self.model.supports_vision() {
            match self.policy {
                NonVisionImagePolicy::Reject => {
                    return Err(BackendError::InvalidInput(format!(
                        "model {} does not accept image input",
                        self.model
                    )));
                }
                NonVisionImagePolicy::Drop => {
                    warn!(model = %self.model, "model lacks vision support; dropping image input");
                    images = &[];
                }
            }
        }

        match route_for(&self.model, !images.is_empty()) {
            Route::Generate => {
                let request = GenerateRequest {
                    model: self.model.to_string(),
                    prompt: prompt.to_string(),
                    images: self.encode_images(images)?,
                    stream: false,
                };
                debug!(model = %self.model, images = request.images.len(), "routing to generate endpoint");
                let response = self.transport.generate(&request).await?;
                Ok(response
                    .response
                    .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string()))
            }
            Route::Chat => {
                let request = ChatRequest {
                    model: self.model.to_string(),
                    messages: vec![ChatMessage::user(prompt)],
                    stream: false,
                };
                debug!(model = %self.model, "routing to chat endpoint");
                let response = self.transport.chat(&request).await?;
                Ok(response
                    .message
                    .map(|m| m.content)
                    .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string()))
            }
        }
    }
}
