//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file. Every
//! component receives its settings explicitly from here at construction; no
//! global config is consulted at call time.

use crate::gate::ImageGate;
use crate::providers::ollama::NonVisionImagePolicy;
use nepho_domain::{Category, CategoryTaxonomy, DomainError, LabelPromptTemplate, Model};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Default model names per backend
    pub models: FileModelsConfig,
    /// Image gate settings
    pub images: FileImagesConfig,
    /// Cloud backend settings
    pub openai: FileOpenAiConfig,
    /// Local backend settings
    pub ollama: FileOllamaConfig,
    /// Labeling run settings
    pub labeling: FileLabelingConfig,
    /// Per-request timeout in seconds for chat calls (model pulls use their
    /// own extended timeout).
    pub request_timeout_secs: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            models: FileModelsConfig::default(),
            images: FileImagesConfig::default(),
            openai: FileOpenAiConfig::default(),
            ollama: FileOllamaConfig::default(),
            labeling: FileLabelingConfig::default(),
            request_timeout_secs: 60,
        }
    }
}

impl FileConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn image_gate(&self) -> ImageGate {
        ImageGate::new(&self.images.supported_formats, self.images.max_size_mib)
    }

    /// Validate the configuration, returning all detected issues as
    /// human-readable warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.models.openai.trim().is_empty() {
            issues.push("models.openai: model name cannot be empty".to_string());
        }
        if self.models.ollama.trim().is_empty() {
            issues.push("models.ollama: model name cannot be empty".to_string());
        }
        if self.images.supported_formats.is_empty() {
            issues.push("images.supported_formats: no formats configured; every image will be rejected".to_string());
        }
        if self.labeling.vmin >= self.labeling.vmax {
            issues.push(format!(
                "labeling: vmin ({}) must be below vmax ({})",
                self.labeling.vmin, self.labeling.vmax
            ));
        }
        if self.labeling.max_concurrency == 0 {
            issues.push("labeling.max_concurrency: must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            issues.push("request_timeout_secs: must be at least 1".to_string());
        }
        issues
    }
}

/// Default model names per backend (`[models]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Default cloud model
    pub openai: String,
    /// Default local model
    pub ollama: String,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            openai: "gpt-4-vision-preview".to_string(),
            ollama: "llava".to_string(),
        }
    }
}

impl FileModelsConfig {
    pub fn openai_model(&self) -> Model {
        Model::new(self.openai.as_str())
    }

    pub fn ollama_model(&self) -> Model {
        Model::new(self.ollama.as_str())
    }
}

/// Image gate settings (`[images]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileImagesConfig {
    /// Accepted file extensions, without a leading dot
    pub supported_formats: Vec<String>,
    /// Maximum image size in MiB
    pub max_size_mib: u64,
}

impl Default for FileImagesConfig {
    fn default() -> Self {
        Self {
            supported_formats: ["jpg", "jpeg", "png", "gif", "bmp", "webp"]
                .map(String::from)
                .to_vec(),
            max_size_mib: 10,
        }
    }
}

/// Cloud backend settings (`[openai]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the chat-completions API.
    pub base_url: String,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

impl FileOpenAiConfig {
    /// The credential: direct key first, then the configured env var.
    /// `None` here becomes a configuration error at backend construction.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

/// Local backend settings (`[ollama]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOllamaConfig {
    /// Base URL of the local server
    pub base_url: String,
    /// Behavior when images are supplied to a model without vision support
    pub non_vision_image_policy: NonVisionImagePolicy,
}

impl Default for FileOllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            non_vision_image_policy: NonVisionImagePolicy::default(),
        }
    }
}

/// Labeling run settings (`[labeling]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLabelingConfig {
    /// Radar site identifier restated in the prompt
    pub site: String,
    /// Colorbar lower bound in dBZ
    pub vmin: i32,
    /// Colorbar upper bound in dBZ
    pub vmax: i32,
    /// Maximum concurrent backend requests (1 = strict sequential)
    pub max_concurrency: usize,
    /// Skip failing records instead of aborting the run
    pub continue_on_error: bool,
    /// Replacement for the built-in category taxonomy (empty = built-in)
    pub categories: Vec<FileCategoryConfig>,
}

impl Default for FileLabelingConfig {
    fn default() -> Self {
        Self {
            site: String::new(),
            vmin: -20,
            vmax: 80,
            max_concurrency: 1,
            continue_on_error: false,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCategoryConfig {
    pub name: String,
    pub definition: String,
}

impl FileLabelingConfig {
    pub fn taxonomy(&self) -> Result<CategoryTaxonomy, DomainError> {
        if self.categories.is_empty() {
            return Ok(CategoryTaxonomy::default());
        }
        CategoryTaxonomy::new(
            self.categories
                .iter()
                .map(|c| Category::new(c.name.as_str(), c.definition.as_str()))
                .collect(),
        )
    }

    pub fn template(&self) -> LabelPromptTemplate {
        LabelPromptTemplate::new(self.site.as_str(), (self.vmin, self.vmax))
    }
}
