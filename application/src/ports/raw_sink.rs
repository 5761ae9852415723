//! Port for persisting verbatim backend responses.
//!
//! Separate from `tracing`-based operation logs: tracing carries diagnostic
//! messages, while this port keeps the full unparsed model output for later
//! audit, one file per image. Unlike logging, persistence failures here are
//! fatal to the run.

use std::io;
use std::path::Path;

/// Sink for the raw (unparsed) response text of one image.
pub trait RawResponseSink: Send + Sync {
    fn persist(&self, image_path: &Path, raw: &str) -> io::Result<()>;
}

/// No-op sink used when no output directory is configured.
pub struct NoRawSink;

impl RawResponseSink for NoRawSink {
    fn persist(&self, _image_path: &Path, _raw: &str) -> io::Result<()> {
        Ok(())
    }
}
