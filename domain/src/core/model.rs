//! Model value object representing a chat model

use std::fmt;
use std::str::FromStr;

/// Name fragments identifying vision-capable models.
///
/// Capability is decided by the model name alone, never by whether a request
/// happens to carry images. Covers the common local vision families plus the
/// hosted GPT-4 line.
const VISION_MODEL_FRAGMENTS: &[&str] = &[
    "llava",
    "bakllava",
    "moondream",
    "minicpm-v",
    "llava-llama2",
    "llava-llama3",
    "llama4:scout",
    "gpt-4",
    "vision",
];

/// A chat model, identified by its serving name (Value Object)
///
/// The name is kept verbatim (registry matches are case-sensitive); only the
/// capability check lower-cases it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model(String);

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this model accepts image input alongside text.
    ///
    /// Substring match against a fixed allow-list, case-insensitive.
    pub fn supports_vision(&self) -> bool {
        let name = self.0.to_lowercase();
        VISION_MODEL_FRAGMENTS
            .iter()
            .any(|fragment| name.contains(fragment))
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Model::new(s))
    }
}
