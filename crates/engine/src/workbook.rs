// Workbook: the sheets, the named ranges, and the undo history. All cell
// mutations go through here so every edit is undoable and triggers a
// recalculation of the active sheet.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::cell_ref::{GRID_COLS, GRID_ROWS};
use crate::named_range::NamedRangeStore;
use crate::recalc::{recalculate, RecalcReport};
use crate::sheet::Sheet;
use crate::undo::History;

#[derive(Debug, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub active: usize,
    next_sheet_id: u64,
    #[serde(default)]
    pub named_ranges: NamedRangeStore,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub settings: serde_json::Value,
    #[serde(skip)]
    history: History,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(1, "Sheet1")],
            active: 0,
            next_sheet_id: 2,
            named_ranges: NamedRangeStore::new(),
            settings: serde_json::Value::Null,
            history: History::new(),
        }
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active]
    }

    pub fn active_sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active]
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn check_bounds(col: usize, row: usize) -> Result<(), String> {
        if col >= GRID_COLS || row >= GRID_ROWS {
            return Err(format!("Cell ({}, {}) is outside the grid", col, row));
        }
        Ok(())
    }

    /// Commit raw input to a cell on the active sheet and recalculate.
    pub fn set_cell(&mut self, col: usize, row: usize, input: &str) -> Result<RecalcReport, String> {
        Self::check_bounds(col, row)?;
        self.history.record_mutation(&self.sheets[self.active]);
        self.active_sheet_mut().set_input(col, row, input);
        Ok(self.recalculate_active())
    }

    pub fn clear_cell(&mut self, col: usize, row: usize) -> Result<RecalcReport, String> {
        Self::check_bounds(col, row)?;
        self.history.record_mutation(&self.sheets[self.active]);
        self.active_sheet_mut().clear_cell(col, row);
        Ok(self.recalculate_active())
    }

    pub fn set_col_width(&mut self, col: usize, width: f64) -> Result<(), String> {
        Self::check_bounds(col, 0)?;
        self.history.record_mutation(&self.sheets[self.active]);
        self.active_sheet_mut().col_widths.insert(col, width);
        Ok(())
    }

    pub fn set_row_height(&mut self, row: usize, height: f64) -> Result<(), String> {
        Self::check_bounds(0, row)?;
        self.history.record_mutation(&self.sheets[self.active]);
        self.active_sheet_mut().row_heights.insert(row, height);
        Ok(())
    }

    /// Define or redefine a named range, then recalculate so formulas using
    /// the name pick up the new target.
    pub fn define_name(&mut self, name: &str, target: &str) -> Result<RecalcReport, String> {
        self.named_ranges.set(name, target)?;
        Ok(self.recalculate_active())
    }

    pub fn remove_name(&mut self, name: &str) -> Result<RecalcReport, String> {
        if !self.named_ranges.remove(name) {
            return Err(format!("No named range: {}", name));
        }
        Ok(self.recalculate_active())
    }

    pub fn undo(&mut self) -> bool {
        let active = self.active;
        self.history.undo(&mut self.sheets[active])
    }

    pub fn redo(&mut self) -> bool {
        let active = self.active;
        self.history.redo(&mut self.sheets[active])
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Switch the active sheet. History is per-sheet, so the stacks reset.
    pub fn set_active_sheet(&mut self, index: usize) -> Result<(), String> {
        if index >= self.sheets.len() {
            return Err(format!("No sheet at index {}", index));
        }
        if index != self.active {
            self.history.clear();
            self.active = index;
        }
        Ok(())
    }

    /// Append a new empty sheet with a generated unique name; returns its
    /// index.
    pub fn add_sheet(&mut self) -> usize {
        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        let mut n = self.sheets.len() + 1;
        let name = loop {
            let candidate = format!("Sheet{}", n);
            if self.sheet_by_name(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        self.sheets.push(Sheet::new(id, name));
        self.sheets.len() - 1
    }

    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<(), String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Sheet name cannot be empty".to_string());
        }
        if index >= self.sheets.len() {
            return Err(format!("No sheet at index {}", index));
        }
        let taken = self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(format!("Sheet name {} is already in use", name));
        }
        self.sheets[index].name = name.to_string();
        Ok(())
    }

    /// Repair invariants after deserializing from an untrusted file: at
    /// least one sheet, a valid active index, and a fresh sheet id counter.
    pub fn normalize(&mut self) {
        if self.sheets.is_empty() {
            self.sheets.push(Sheet::new(1, "Sheet1"));
        }
        if self.active >= self.sheets.len() {
            self.active = 0;
        }
        let max_id = self.sheets.iter().map(|s| s.id).max().unwrap_or(0);
        if self.next_sheet_id <= max_id {
            self.next_sheet_id = max_id + 1;
        }
    }

    /// Recompute the active sheet's formulas against the whole workbook.
    pub fn recalculate_active(&mut self) -> RecalcReport {
        let (cells, report) = recalculate(
            &self.sheets[self.active].cells,
            &self.sheets,
            &self.named_ranges,
        );
        self.sheets[self.active].cells = cells;
        report
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        self.active_sheet().cell(col, row)
    }

    pub fn display_text(&self, col: usize, row: usize) -> String {
        self.active_sheet().display_text(col, row)
    }
}
