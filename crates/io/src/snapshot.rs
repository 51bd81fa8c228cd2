// Workbook snapshots: the whole workbook as one pretty-printed JSON
// document. Cached formula results are saved too, so a loaded file shows
// values immediately; a recalculation pass on load refreshes them.

use std::fs;
use std::path::Path;

use centigrid_engine::workbook::Workbook;
use thiserror::Error;

/// Snapshots past this size are refused rather than written or parsed.
pub const MAX_SNAPSHOT_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub fn to_json(workbook: &Workbook) -> Result<String, SnapshotError> {
    let json = serde_json::to_string_pretty(workbook)?;
    if json.len() > MAX_SNAPSHOT_BYTES {
        return Err(SnapshotError::TooLarge {
            size: json.len(),
            limit: MAX_SNAPSHOT_BYTES,
        });
    }
    Ok(json)
}

pub fn from_json(json: &str) -> Result<Workbook, SnapshotError> {
    if json.len() > MAX_SNAPSHOT_BYTES {
        return Err(SnapshotError::TooLarge {
            size: json.len(),
            limit: MAX_SNAPSHOT_BYTES,
        });
    }
    let mut workbook: Workbook = serde_json::from_str(json)?;
    workbook.normalize();
    workbook.recalculate_active();
    Ok(workbook)
}

pub fn save(workbook: &Workbook, path: &Path) -> Result<(), SnapshotError> {
    let json = to_json(workbook)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Workbook, SnapshotError> {
    let json = fs::read_to_string(path)?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.set_cell(0, 0, "10").unwrap();
        wb.set_cell(0, 1, "=A1*2").unwrap();
        wb.set_cell(1, 0, "hello").unwrap();
        wb.define_name("Base", "A1").unwrap();
        wb
    }

    #[test]
    fn test_json_roundtrip() {
        let wb = sample_workbook();
        let json = to_json(&wb).unwrap();
        let back = from_json(&json).unwrap();

        assert_eq!(back.sheets.len(), 1);
        assert_eq!(back.display_text(0, 0), "10");
        assert_eq!(back.display_text(0, 1), "20");
        assert_eq!(back.display_text(1, 0), "hello");
        assert_eq!(back.named_ranges.get("base").unwrap().target, "A1");
    }

    #[test]
    fn test_formula_survives_roundtrip() {
        let wb = sample_workbook();
        let back = from_json(&to_json(&wb).unwrap()).unwrap();
        assert_eq!(
            back.cell(0, 1).unwrap().formula.as_deref(),
            Some("=A1*2")
        );
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");

        let wb = sample_workbook();
        save(&wb, &path).unwrap();
        let back = load(&path).unwrap();
        assert_eq!(back.display_text(0, 1), "20");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SnapshotError::Io(_))));
    }

    #[test]
    fn test_malformed_json_is_serde_error() {
        assert!(matches!(
            from_json("{not json"),
            Err(SnapshotError::Serde(_))
        ));
    }

    #[test]
    fn test_oversized_snapshot_refused() {
        let mut wb = Workbook::new();
        let big = "x".repeat(MAX_SNAPSHOT_BYTES + 1);
        wb.set_cell(0, 0, &big).unwrap();
        assert!(matches!(
            to_json(&wb),
            Err(SnapshotError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_oversized_input_refused() {
        let huge = " ".repeat(MAX_SNAPSHOT_BYTES + 1);
        assert!(matches!(
            from_json(&huge),
            Err(SnapshotError::TooLarge { .. })
        ));
    }
}
