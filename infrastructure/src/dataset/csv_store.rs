//! CSV-backed label store.
//!
//! The dataset format is a plain CSV with columns
//! `file_path,time,label,llm_label`, the file layout produced by the radar
//! preprocessing step.

use nepho_application::{LabelStore, StoreError};
use nepho_domain::LabelRecord;
use std::path::PathBuf;

pub struct CsvLabelStore {
    path: PathBuf,
}

impl CsvLabelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn store_error(err: csv::Error) -> StoreError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => StoreError::Io(io),
            _ => StoreError::Malformed("unknown I/O error".to_string()),
        }
    } else {
        StoreError::Malformed(err.to_string())
    }
}

impl LabelStore for CsvLabelStore {
    fn load(&self) -> Result<Vec<LabelRecord>, StoreError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(store_error)?;
        reader
            .deserialize()
            .collect::<Result<Vec<LabelRecord>, _>>()
            .map_err(store_error)
    }

    fn save(&self, records: &[LabelRecord]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(&self.path).map_err(store_error)?;
        for record in records {
            writer.serialize(record).map_err(store_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}
