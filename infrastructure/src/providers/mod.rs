//! Chat backend adapters.

pub mod ollama;
pub mod openai;

use nepho_application::BackendError;
use std::time::Duration;

/// Map a reqwest failure onto the backend error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout)
    } else {
        BackendError::RequestFailed(err.to_string())
    }
}
