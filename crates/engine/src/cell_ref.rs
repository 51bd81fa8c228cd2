use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of columns in a sheet (A-Z, single letter only).
pub const GRID_COLS: usize = 26;
/// Number of rows in a sheet (1-100 in A1 notation).
pub const GRID_ROWS: usize = 100;

/// A single cell reference with per-axis absolute flags ($A$1, $A1, A$1, A1).
///
/// `col` and `row` are zero-based. References parsed from text are rejected
/// (not clamped) when the coordinate falls outside the 26x100 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub col: usize,
    pub row: usize,
    pub col_abs: bool,
    pub row_abs: bool,
}

impl CellRef {
    /// Relative reference at (col, row).
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row, col_abs: false, row_abs: false }
    }

    /// Parse A1-style text: optional `$` before the column letter and before
    /// the row digits, single letter A-Z (case-insensitive), row 1-100.
    ///
    /// Returns `None` for multi-letter columns, non-numeric rows, trailing
    /// characters, or out-of-range coordinates.
    pub fn parse(text: &str) -> Option<Self> {
        let mut chars = text.chars().peekable();

        let col_abs = if chars.peek() == Some(&'$') {
            chars.next();
            true
        } else {
            false
        };

        let col_letter = chars.next()?;
        if !col_letter.is_ascii_alphabetic() {
            return None;
        }
        // Multi-letter columns (AA1) are not addressable on this grid.
        if chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let col = (col_letter.to_ascii_uppercase() as u8 - b'A') as usize;

        let row_abs = if chars.peek() == Some(&'$') {
            chars.next();
            true
        } else {
            false
        };

        let row_str: String = chars.collect();
        if row_str.is_empty() || !row_str.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let row_1based: usize = row_str.parse().ok()?;
        if row_1based == 0 || row_1based > GRID_ROWS {
            return None;
        }

        debug_assert!(col < GRID_COLS);
        Some(Self { col, row: row_1based - 1, col_abs, row_abs })
    }

    /// Shift by (delta_col, delta_row). An axis marked absolute is left
    /// unchanged. Returns `None` if a shifted axis lands outside the grid,
    /// so callers can keep the original reference text for that token.
    pub fn shifted(&self, delta_col: isize, delta_row: isize) -> Option<Self> {
        let col = if self.col_abs {
            self.col
        } else {
            let c = self.col as isize + delta_col;
            if c < 0 || c >= GRID_COLS as isize {
                return None;
            }
            c as usize
        };
        let row = if self.row_abs {
            self.row
        } else {
            let r = self.row as isize + delta_row;
            if r < 0 || r >= GRID_ROWS as isize {
                return None;
            }
            r as usize
        };
        Some(Self { col, row, col_abs: self.col_abs, row_abs: self.row_abs })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_abs {
            write!(f, "$")?;
        }
        write!(f, "{}", (b'A' + self.col as u8) as char)?;
        if self.row_abs {
            write!(f, "$")?;
        }
        write!(f, "{}", self.row + 1)
    }
}
