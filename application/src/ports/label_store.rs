//! Label store port
//!
//! Defines how the application loads and persists the tabular dataset.

use nepho_domain::LabelRecord;
use thiserror::Error;

/// Errors from dataset storage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// Dataset storage for label records
///
/// The dataset is loaded whole and written back whole; rows are mutated in
/// memory between the two.
pub trait LabelStore: Send + Sync {
    fn load(&self) -> Result<Vec<LabelRecord>, StoreError>;

    fn save(&self, records: &[LabelRecord]) -> Result<(), StoreError>;
}
