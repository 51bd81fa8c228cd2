//! Spreadsheet engine: a 26x100 grid per sheet, a formula language with a
//! fixed function set, a single-pass recalculation engine, named ranges,
//! and snapshot-based undo. No UI or persistence here; see centigrid-io for
//! file snapshots.

pub mod cell;
pub mod cell_ref;
pub mod formula;
pub mod named_range;
pub mod recalc;
pub mod sheet;
pub mod undo;
pub mod workbook;

pub use cell::{Cell, CellValue, DataType};
pub use cell_ref::{CellRef, GRID_COLS, GRID_ROWS};
pub use formula::{FormulaError, Value};
pub use named_range::{NamedRange, NamedRangeStore};
pub use recalc::{recalculate, RecalcReport};
pub use sheet::{CellMap, Sheet};
pub use undo::{History, SheetSnapshot, MAX_UNDO_DEPTH};
pub use workbook::Workbook;
