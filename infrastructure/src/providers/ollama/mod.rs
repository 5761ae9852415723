//! Local Ollama-style backend: model discovery, provisioning, and
//! endpoint routing.

mod backend;
pub mod transport;
pub mod types;

pub use backend::{ModelState, NonVisionImagePolicy, OllamaBackend, Route, route_for};
pub use transport::{HttpOllamaTransport, OllamaTransport, PULL_TIMEOUT};
