//! Chat backend port
//!
//! Defines the interface for talking to a vision-capable chat model.

use async_trait::async_trait;
use nepho_domain::Model;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a backend call
#[derive(Error, Debug)]
pub enum BackendError {
    /// Required configuration (typically the API credential) is missing.
    /// Raised at construction, never deferred to request time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An image failed gate validation; no network I/O was attempted.
    #[error("Invalid image input: {0}")]
    InvalidInput(String),

    /// An already-validated image could not be read back for encoding.
    #[error("Failed to encode image {}: {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local model is missing and provisioning it failed.
    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    /// Transport failure, non-2xx response, or malformed response body.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The per-request timeout elapsed.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Chat capability over a specific model-serving system
///
/// Implementations make exactly one attempt per call; retries are the
/// caller's decision, not the backend's.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// The model this backend answers with.
    fn model(&self) -> &Model;

    /// Send a prompt and zero or more images, returning the raw response
    /// text verbatim.
    async fn chat(&self, prompt: &str, images: &[PathBuf]) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let error = BackendError::RequestFailed("connection refused".to_string());
        assert_eq!(error.to_string(), "Request failed: connection refused");

        let error = BackendError::Timeout(Duration::from_secs(60));
        assert!(error.to_string().contains("60s"));
    }

    #[test]
    fn test_encoding_error_names_the_path() {
        let error = BackendError::Encoding {
            path: PathBuf::from("img/a.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(error.to_string().contains("img/a.png"));
    }
}
