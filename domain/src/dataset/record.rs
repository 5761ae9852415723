//! One row of the labeling dataset.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Timestamp format used by the dataset (`2022-06-02 00:02:33`).
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One image of the dataset: where it lives, when it was scanned, and its
/// labels.
///
/// `label` is the optional human ground truth and is read-only input here;
/// `llm_label` starts unset and is written exactly once per labeling run.
/// Column names match the dataset files produced by the preprocessing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub file_path: PathBuf,
    #[serde(with = "time_format")]
    pub time: NaiveDateTime,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub llm_label: Option<String>,
}

impl LabelRecord {
    pub fn new(file_path: impl Into<PathBuf>, time: NaiveDateTime) -> Self {
        Self {
            file_path: file_path.into(),
            time,
            label: None,
            llm_label: None,
        }
    }
}

mod time_format {
    use super::{NaiveDateTime, TIME_FORMAT};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIME_FORMAT).unwrap()
    }

    #[test]
    fn new_record_has_no_labels() {
        let record = LabelRecord::new("img/KHGX_20220602_000233.png", time("2022-06-02 00:02:33"));
        assert!(record.label.is_none());
        assert!(record.llm_label.is_none());
    }

    #[test]
    fn time_round_trips_through_the_dataset_format() {
        let original = time("2022-06-02 23:59:59");
        let formatted = original.format(TIME_FORMAT).to_string();
        assert_eq!(formatted, "2022-06-02 23:59:59");
        assert_eq!(time(&formatted), original);
    }
}
