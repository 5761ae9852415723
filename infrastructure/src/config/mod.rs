//! Configuration file loading.

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileCategoryConfig, FileConfig, FileImagesConfig, FileLabelingConfig, FileModelsConfig,
    FileOllamaConfig, FileOpenAiConfig,
};
pub use loader::ConfigLoader;
