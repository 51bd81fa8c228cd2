// Recalculation engine. One linear pass over the formula cells in reading
// order (row-major); each evaluation sees the results of the cells already
// recomputed in this pass. Formulas that depend on cells later in the pass
// read the previous pass's cached value and converge on the next edit.

use std::time::Instant;

use crate::cell::{format_number, CellValue, DataType};
use crate::formula::{evaluate_formula, FormulaError};
use crate::named_range::NamedRangeStore;
use crate::sheet::{CellMap, Sheet};

#[derive(Debug, Clone, PartialEq)]
pub struct RecalcCellError {
    pub col: usize,
    pub row: usize,
    pub error: FormulaError,
}

/// What a recalculation pass did, for logging and the status bar.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalcReport {
    pub cells_recomputed: usize,
    pub errors: Vec<RecalcCellError>,
    pub duration_ms: u128,
}

impl RecalcReport {
    pub fn summary(&self) -> String {
        format!(
            "recalculated {} cells in {}ms ({} errors)",
            self.cells_recomputed,
            self.duration_ms,
            self.errors.len()
        )
    }
}

/// Recompute every formula cell in the map, returning the updated map.
///
/// The input map is not modified; callers swap the result in, which keeps
/// the sheet borrowable for cross-sheet lookups during the pass.
pub fn recalculate(
    cells: &CellMap,
    sheets: &[Sheet],
    named_ranges: &NamedRangeStore,
) -> (CellMap, RecalcReport) {
    let started = Instant::now();
    let mut out = cells.clone();

    let mut formula_keys: Vec<(usize, usize)> = out
        .iter()
        .filter(|(_, cell)| cell.is_formula())
        .map(|(&key, _)| key)
        .collect();
    // Reading order: row-major, so A1 recomputes before B1 before A2
    formula_keys.sort_by_key(|&(col, row)| (row, col));

    let mut errors = Vec::new();
    for (col, row) in formula_keys.iter().copied() {
        let Some(formula) = out.get(&(col, row)).and_then(|c| c.formula.clone()) else {
            continue;
        };
        let result = evaluate_formula(&formula, &out, Some((col, row)), sheets, named_ranges);

        let Some(cell) = out.get_mut(&(col, row)) else { continue };
        match result.error {
            Some(error) => {
                cell.value = CellValue::Empty;
                cell.display = Some(error.code().to_string());
                cell.data_type = DataType::Text;
                errors.push(RecalcCellError { col, row, error });
            }
            None => match result.value {
                CellValue::Number(n) => {
                    cell.value = CellValue::Number(n);
                    cell.display = Some(format_number(n));
                    cell.data_type = DataType::Number;
                }
                CellValue::Text(s) => {
                    cell.display = Some(s.clone());
                    cell.value = CellValue::Text(s);
                    cell.data_type = DataType::Text;
                }
                CellValue::Empty => {
                    cell.value = CellValue::Empty;
                    cell.display = None;
                    cell.data_type = DataType::Empty;
                }
            },
        }
    }

    let report = RecalcReport {
        cells_recomputed: formula_keys.len(),
        errors,
        duration_ms: started.elapsed().as_millis(),
    };
    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn map_from(entries: &[(&str, &str)]) -> CellMap {
        let mut map = CellMap::default();
        for (reference, input) in entries {
            let r = crate::cell_ref::CellRef::parse(reference).unwrap();
            if let Some(cell) = Cell::from_input(input) {
                map.insert((r.col, r.row), cell);
            }
        }
        map
    }

    fn recalc(cells: &CellMap) -> (CellMap, RecalcReport) {
        recalculate(cells, &[], &NamedRangeStore::new())
    }

    fn display(cells: &CellMap, reference: &str) -> String {
        let r = crate::cell_ref::CellRef::parse(reference).unwrap();
        cells
            .get(&(r.col, r.row))
            .map(|c| c.display_text())
            .unwrap_or_default()
    }

    #[test]
    fn test_sum_updates_after_edit() {
        let mut cells = map_from(&[
            ("A1", "10"),
            ("A2", "20"),
            ("A3", "30"),
            ("A4", "=SUM(A1:A3)"),
        ]);
        let (out, report) = recalc(&cells);
        assert_eq!(display(&out, "A4"), "60");
        assert_eq!(report.cells_recomputed, 1);
        assert!(report.errors.is_empty());

        cells = out;
        cells.insert((0, 0), Cell::number(5.0));
        let (out, _) = recalc(&cells);
        assert_eq!(display(&out, "A4"), "55");
    }

    #[test]
    fn test_recalc_is_idempotent_on_settled_sheet() {
        let cells = map_from(&[("A1", "2"), ("B1", "=A1*3")]);
        let (once, _) = recalc(&cells);
        let (twice, _) = recalc(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_division_by_zero_displays_code() {
        let cells = map_from(&[("A1", "=1/0")]);
        let (out, report) = recalc(&cells);
        assert_eq!(display(&out, "A1"), "#DIV/0!");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].error, FormulaError::Div0);
        // The formula survives so the user can fix it
        assert_eq!(out.get(&(0, 0)).unwrap().formula.as_deref(), Some("=1/0"));
    }

    #[test]
    fn test_errored_dependency_reads_as_zero() {
        let cells = map_from(&[("A1", "=1/0"), ("B1", "=A1+1")]);
        let (out, _) = recalc(&cells);
        assert_eq!(display(&out, "A1"), "#DIV/0!");
        assert_eq!(display(&out, "B1"), "1");
    }

    #[test]
    fn test_self_reference_is_circular() {
        let cells = map_from(&[("A1", "=A1+1")]);
        let (out, report) = recalc(&cells);
        assert_eq!(display(&out, "A1"), "#CIRCULAR!");
        assert_eq!(report.errors[0].error, FormulaError::Circular);
    }

    #[test]
    fn test_forward_chain_settles_in_one_pass() {
        let cells = map_from(&[("A1", "1"), ("A2", "=A1+1"), ("A3", "=A2+1")]);
        let (out, _) = recalc(&cells);
        assert_eq!(display(&out, "A2"), "2");
        assert_eq!(display(&out, "A3"), "3");
    }

    #[test]
    fn test_backward_chain_is_stale_for_one_pass() {
        // A1 reads A2 before A2 recomputes; the value catches up next pass.
        let cells = map_from(&[("A1", "=A2"), ("A2", "=A3"), ("A3", "7")]);
        let (first, _) = recalc(&cells);
        assert_eq!(display(&first, "A2"), "7");
        assert_eq!(display(&first, "A1"), "0");
        let (second, _) = recalc(&first);
        assert_eq!(display(&second, "A1"), "7");
    }

    #[test]
    fn test_large_values_survive_recalc() {
        let cells = map_from(&[("A1", "1e300"), ("B1", "=A1*1")]);
        let (out, report) = recalc(&cells);
        assert_eq!(
            out.get(&(1, 0)).unwrap().value,
            crate::cell::CellValue::Number(1e300)
        );
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_unknown_name_and_bad_parse() {
        let cells = map_from(&[("A1", "=NOPE(1)"), ("A2", "=1+")]);
        let (out, _) = recalc(&cells);
        assert_eq!(display(&out, "A1"), "#NAME?");
        assert_eq!(display(&out, "A2"), "#ERROR!");
    }

    #[test]
    fn test_report_summary() {
        let cells = map_from(&[("A1", "=1/0")]);
        let (_, report) = recalc(&cells);
        assert!(report.summary().contains("1 errors"));
    }
}
