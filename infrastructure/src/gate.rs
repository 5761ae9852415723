//! Image gate: validation and wire encoding.
//!
//! Every image is pushed through the gate before it is allowed anywhere near
//! a network payload. Validation is a pure predicate; encoding is the only
//! fallible transform, and it distinguishes its I/O failures from validation
//! failures so a file deleted between the two shows up as what it is.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use nepho_application::BackendError;
use std::path::Path;

/// Guards image files before they reach a backend.
#[derive(Debug, Clone)]
pub struct ImageGate {
    supported_formats: Vec<String>,
    max_size_mib: u64,
}

impl ImageGate {
    /// `supported_formats` are extensions without a leading dot; matching is
    /// case-insensitive.
    pub fn new(supported_formats: &[String], max_size_mib: u64) -> Self {
        Self {
            supported_formats: supported_formats
                .iter()
                .map(|f| f.trim_start_matches('.').to_lowercase())
                .collect(),
            max_size_mib,
        }
    }

    /// Pure predicate: is this file safe to send?
    ///
    /// False when the path does not exist, the extension is outside the
    /// supported set, the size exceeds the ceiling, or the content cannot be
    /// decoded as an image. Never errors.
    pub fn validate(&self, path: &Path) -> bool {
        let Ok(metadata) = std::fs::metadata(path) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }

        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self.supported_formats.contains(&extension.to_lowercase()) {
            return false;
        }

        if metadata.len() > self.max_size_mib * 1024 * 1024 {
            return false;
        }

        image::open(path).is_ok()
    }

    /// Base64-encode an already-validated image for a wire payload.
    pub fn encode(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = std::fs::read(path).map_err(|source| BackendError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BASE64.encode(bytes))
    }
}
