//! Tabular label dataset types.

pub mod record;

pub use record::{LabelRecord, TIME_FORMAT};
