//! Build a fresh dataset from a directory of rendered radar images.

use chrono::NaiveDateTime;
use nepho_application::StoreError;
use nepho_domain::LabelRecord;
use std::path::Path;
use tracing::warn;

/// Scan `dir` for rendered radar images (`*.png`) and build unlabeled
/// records, sorted by scan time.
///
/// The scan timestamp is taken from file names of the
/// `KHGX_20220602_000233.png` form; files named differently fall back to
/// their filesystem modification time.
pub fn scan_images(dir: &Path) -> Result<Vec<LabelRecord>, StoreError> {
    let pattern = dir.join("*.png");
    let paths = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| StoreError::Malformed(e.to_string()))?;

    let mut records = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| StoreError::Io(e.into_error()))?;
        let time = match timestamp_from_name(&path).or_else(|| file_mtime(&path)) {
            Some(time) => time,
            None => {
                warn!(path = %path.display(), "no timestamp for image; skipping");
                continue;
            }
        };
        records.push(LabelRecord::new(path, time));
    }

    records.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
    Ok(records)
}

/// Parse `..._YYYYMMDD_HHMMSS` out of the file stem.
fn timestamp_from_name(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(3, '_');
    let hms = parts.next()?;
    let ymd = parts.next()?;
    NaiveDateTime::parse_from_str(&format!("{ymd}{hms}"), "%Y%m%d%H%M%S").ok()
}

fn file_mtime(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(chrono::DateTime::<chrono::Utc>::from(modified).naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nepho_domain::TIME_FORMAT;

    fn write_png(dir: &Path, name: &str) {
        image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn scan_builds_records_sorted_by_scan_time() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "KHGX_20220602_001442.png");
        write_png(dir.path(), "KHGX_20220602_000233.png");
        write_png(dir.path(), "KHGX_20220601_235900.png");

        let records = scan_images(dir.path()).unwrap();

        let times: Vec<String> = records
            .iter()
            .map(|r| r.time.format(TIME_FORMAT).to_string())
            .collect();
        assert_eq!(
            times,
            [
                "2022-06-01 23:59:00",
                "2022-06-02 00:02:33",
                "2022-06-02 00:14:42"
            ]
        );
        assert!(records.iter().all(|r| r.label.is_none() && r.llm_label.is_none()));
    }

    #[test]
    fn non_png_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "KHGX_20220602_000233.png");
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let records = scan_images(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn unparseable_names_fall_back_to_mtime() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "odd-name.png");

        let records = scan_images(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
        // mtime of a file just written is in the recent past
        assert!(records[0].time.and_utc().timestamp() > 0);
    }

    #[test]
    fn timestamp_parsing_handles_site_prefixes_with_underscores() {
        let time = timestamp_from_name(Path::new("out/KHGX_extra_20220602_000233.png")).unwrap();
        assert_eq!(time.format(TIME_FORMAT).to_string(), "2022-06-02 00:02:33");
        assert!(timestamp_from_name(Path::new("out/odd-name.png")).is_none());
    }

    #[test]
    fn empty_directory_yields_no_records() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_images(dir.path()).unwrap().is_empty());
    }
}
