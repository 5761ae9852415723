//! Sidecar writer for verbatim backend responses.
//!
//! One text file per labeled image, named after the image with its extension
//! substituted, all in a single output directory.

use nepho_application::RawResponseSink;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension given to raw-response files.
const SIDECAR_EXTENSION: &str = "txt";

pub struct SidecarWriter {
    output_dir: PathBuf,
}

impl SidecarWriter {
    /// Creates the output directory if it does not exist yet.
    pub fn new(output_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    fn sidecar_path(&self, image_path: &Path) -> io::Result<PathBuf> {
        let name = image_path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file name in {}", image_path.display()),
            )
        })?;
        Ok(self
            .output_dir
            .join(Path::new(name).with_extension(SIDECAR_EXTENSION)))
    }
}

impl RawResponseSink for SidecarWriter {
    fn persist(&self, image_path: &Path, raw: &str) -> io::Result<()> {
        fs::write(self.sidecar_path(image_path)?, raw)
    }
}
