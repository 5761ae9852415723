//! Application layer for nepho
//!
//! This crate contains the labeling use case and the port definitions its
//! collaborators implement. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    chat_backend::{BackendError, ChatBackend},
    label_store::{LabelStore, StoreError},
    progress::{LabelProgress, NoProgress},
    raw_sink::{NoRawSink, RawResponseSink},
};
pub use use_cases::label_dataset::{LabelDatasetUseCase, LabelRunError, LabelRunOptions};
