use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// Sparse cell storage keyed by (col, row), zero-based.
pub type CellMap = FxHashMap<(usize, usize), Cell>;

/// One sheet: sparse cells plus per-axis sizing overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub id: u64,
    pub name: String,
    #[serde(with = "cell_map_serde")]
    pub cells: CellMap,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub col_widths: FxHashMap<usize, f64>,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub row_heights: FxHashMap<usize, f64>,
    /// Grid-layer state the engine stores but does not interpret
    /// (selections, frozen panes, chart placements).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extras: serde_json::Value,
}

impl Sheet {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cells: CellMap::default(),
            col_widths: FxHashMap::default(),
            row_heights: FxHashMap::default(),
            extras: serde_json::Value::Null,
        }
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        self.cells.get(&(col, row))
    }

    /// Commit raw input to a cell. Empty input removes the cell.
    pub fn set_input(&mut self, col: usize, row: usize, input: &str) {
        match Cell::from_input(input) {
            Some(cell) => {
                self.cells.insert((col, row), cell);
            }
            None => {
                self.cells.remove(&(col, row));
            }
        }
    }

    pub fn clear_cell(&mut self, col: usize, row: usize) {
        self.cells.remove(&(col, row));
    }

    /// The string the grid renders at (col, row); empty for absent cells.
    pub fn display_text(&self, col: usize, row: usize) -> String {
        self.cell(col, row)
            .map(|c| c.display_text())
            .unwrap_or_default()
    }
}

/// Serialize the cell map under "col,row" string keys, sorted, so snapshot
/// files are stable and diffable.
mod cell_map_serde {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Cell, CellMap};

    pub fn serialize<S: Serializer>(cells: &CellMap, serializer: S) -> Result<S::Ok, S::Error> {
        let ordered: BTreeMap<String, &Cell> = cells
            .iter()
            .map(|(&(col, row), cell)| (format!("{},{}", col, row), cell))
            .collect();
        ordered.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CellMap, D::Error> {
        let raw: BTreeMap<String, Cell> = BTreeMap::deserialize(deserializer)?;
        let mut cells = CellMap::default();
        for (key, cell) in raw {
            let (col, row) = key
                .split_once(',')
                .ok_or_else(|| D::Error::custom(format!("bad cell key: {}", key)))?;
            let col: usize = col
                .parse()
                .map_err(|_| D::Error::custom(format!("bad cell key: {}", key)))?;
            let row: usize = row
                .parse()
                .map_err(|_| D::Error::custom(format!("bad cell key: {}", key)))?;
            cells.insert((col, row), cell);
        }
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn test_set_input_and_read_back() {
        let mut sheet = Sheet::new(1, "Sheet1");
        sheet.set_input(0, 0, "42");
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(42.0));
        assert_eq!(sheet.display_text(0, 0), "42");
    }

    #[test]
    fn test_empty_input_removes_cell() {
        let mut sheet = Sheet::new(1, "Sheet1");
        sheet.set_input(0, 0, "x");
        sheet.set_input(0, 0, "  ");
        assert!(sheet.cell(0, 0).is_none());
    }

    #[test]
    fn test_absent_cell_displays_empty() {
        let sheet = Sheet::new(1, "Sheet1");
        assert_eq!(sheet.display_text(5, 5), "");
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut sheet = Sheet::new(3, "Data");
        sheet.set_input(1, 9, "hello");
        sheet.set_input(0, 0, "=A2+1");
        sheet.col_widths.insert(1, 120.0);

        let json = serde_json::to_string(&sheet).unwrap();
        let back: Sheet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sheet);
    }

    #[test]
    fn test_serde_cell_keys_are_strings() {
        let mut sheet = Sheet::new(1, "S");
        sheet.set_input(2, 4, "9");
        let json = serde_json::to_string(&sheet).unwrap();
        assert!(json.contains("\"2,4\""));
    }
}
