// Snapshot-based undo. Every mutation captures the full sheet state before
// it applies; undo and redo swap whole snapshots back in. Simple and
// correct for a 26x100 grid, where a snapshot is small.

use rustc_hash::FxHashMap;

use crate::sheet::{CellMap, Sheet};

/// Oldest snapshots are dropped past this depth.
pub const MAX_UNDO_DEPTH: usize = 100;

/// A deep copy of everything undo restores on a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSnapshot {
    cells: CellMap,
    col_widths: FxHashMap<usize, f64>,
    row_heights: FxHashMap<usize, f64>,
    extras: serde_json::Value,
}

impl SheetSnapshot {
    pub fn capture(sheet: &Sheet) -> Self {
        Self {
            cells: sheet.cells.clone(),
            col_widths: sheet.col_widths.clone(),
            row_heights: sheet.row_heights.clone(),
            extras: sheet.extras.clone(),
        }
    }

    pub fn restore(self, sheet: &mut Sheet) {
        sheet.cells = self.cells;
        sheet.col_widths = self.col_widths;
        sheet.row_heights = self.row_heights;
        sheet.extras = self.extras;
    }
}

/// Per-sheet undo/redo stacks. Cleared when the active sheet changes.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<SheetSnapshot>,
    redo_stack: Vec<SheetSnapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call before applying a mutation. Starts a fresh redo timeline.
    pub fn record_mutation(&mut self, sheet: &Sheet) {
        if self.undo_stack.len() >= MAX_UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(SheetSnapshot::capture(sheet));
        self.redo_stack.clear();
    }

    /// Restore the previous snapshot. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self, sheet: &mut Sheet) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(SheetSnapshot::capture(sheet));
        snapshot.restore(sheet);
        true
    }

    pub fn redo(&mut self, sheet: &mut Sheet) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(SheetSnapshot::capture(sheet));
        snapshot.restore(sheet);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
