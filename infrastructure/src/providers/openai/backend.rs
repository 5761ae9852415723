//! Cloud backend: one HTTP round-trip per chat call.

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, ImageUrl,
    MessageContent, Role,
};
use crate::gate::ImageGate;
use crate::providers::transport_error;
use async_trait::async_trait;
use nepho_application::{BackendError, ChatBackend};
use nepho_domain::Model;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Generation budget applied uniformly to every request.
const MAX_OUTPUT_TOKENS: u32 = 1000;
/// Sampling temperature applied uniformly to every request.
const SAMPLING_TEMPERATURE: f32 = 0.7;

/// Chat backend for a hosted chat-completions API.
///
/// The API credential is required at construction; a missing key fails here,
/// before any request is ever attempted.
pub struct OpenAiBackend {
    model: Model,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    gate: ImageGate,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(
        model: Model,
        api_key: Option<String>,
        base_url: impl Into<String>,
        gate: ImageGate,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
            BackendError::Configuration(
                "OpenAI API key is required; set OPENAI_API_KEY or [openai] api_key".to_string(),
            )
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Configuration(e.to_string()))?;
        Ok(Self {
            model,
            api_key,
            base_url: base_url.into(),
            client,
            gate,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Build the single user message, validating and encoding images before
    /// any network I/O. An image may have disappeared or been replaced since
    /// the dataset was loaded, so each is re-checked here.
    fn build_request(
        &self,
        prompt: &str,
        images: &[PathBuf],
    ) -> Result<ChatCompletionRequest, BackendError> {
        let content = if images.is_empty() {
            MessageContent::Text(prompt.to_string())
        } else {
            let mut parts = vec![ContentPart::Text {
                text: prompt.to_string(),
            }];
            for path in images {
                if !self.gate.validate(path) {
                    return Err(BackendError::InvalidInput(format!(
                        "invalid image: {}",
                        path.display()
                    )));
                }
                let data = self.gate.encode(path)?;
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{data}", mime_for(path)),
                    },
                });
            }
            MessageContent::Parts(parts)
        };

        Ok(ChatCompletionRequest {
            model: self.model.to_string(),
            messages: vec![ChatMessage {
                role: Role::User,
                content,
            }],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: SAMPLING_TEMPERATURE,
        })
    }
}

/// MIME type for the data URL, from the file extension.
fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn chat(&self, prompt: &str, images: &[PathBuf]) -> Result<String, BackendError> {
        let request = self.build_request(prompt, images)?;
        debug!(model = %self.model, images = images.len(), "sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!(
                "API error: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("malformed response body: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                BackendError::RequestFailed("response contained no completion text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ImageGate {
        ImageGate::new(&["png".to_string()], 10)
    }

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(
            Model::new("gpt-4-vision-preview"),
            Some("sk-test".to_string()),
            "https://api.openai.com",
            gate(),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    fn write_test_png(dir: &Path) -> PathBuf {
        let path = dir.join("scan.png");
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        for key in [None, Some(String::new())] {
            let result = OpenAiBackend::new(
                Model::new("gpt-4-vision-preview"),
                key,
                "https://api.openai.com",
                gate(),
                Duration::from_secs(60),
            );
            assert!(matches!(result, Err(BackendError::Configuration(_))));
        }
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let backend = OpenAiBackend::new(
            Model::new("gpt-4-vision-preview"),
            Some("sk-test".to_string()),
            "https://api.openai.com/",
            gate(),
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn text_only_request_uses_bare_string_content() {
        let request = backend().build_request("classify this", &[]).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"], "classify this");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn image_request_carries_text_then_image_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path());

        let request = backend()
            .build_request("classify this", &[path])
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        let parts = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        let url = parts[1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn invalid_image_fails_before_any_network_io() {
        let result = backend().build_request("classify this", &[PathBuf::from("/missing.png")]);
        assert!(matches!(result, Err(BackendError::InvalidInput(_))));
    }

    #[test]
    fn mime_type_follows_the_extension() {
        assert_eq!(mime_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("noext")), "image/jpeg");
    }
}
