//! Infrastructure layer for nepho
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the cloud and local chat backends, the image gate,
//! CSV dataset storage, the raw-response sidecar writer, and configuration
//! file loading.

pub mod config;
pub mod dataset;
pub mod gate;
pub mod providers;
pub mod sidecar;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use dataset::{CsvLabelStore, scan_images};
pub use gate::ImageGate;
pub use providers::ollama::{NonVisionImagePolicy, OllamaBackend};
pub use providers::openai::OpenAiBackend;
pub use sidecar::SidecarWriter;
