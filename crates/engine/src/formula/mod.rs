// Formula subsystem: parse, evaluate, and inspect formulas.
//
// `evaluate_formula` is the one entry point the recalculation engine uses;
// it runs named-range substitution, parsing, and evaluation, and reports
// the referenced cells for grid highlighting.

pub mod eval;
mod eval_conditional;
mod eval_logical;
mod eval_lookup;
mod eval_math;
mod eval_text;
pub mod functions;
pub mod parser;
pub mod refs;

pub use eval::{evaluate, CellLookup, FormulaError, Value};
pub use functions::{function_doc, is_function_name, FunctionDoc, FUNCTIONS};
pub use parser::{parse, Expr, Op};
pub use refs::{adjust_formula_references, extract_references, ReferencedCell};

use crate::cell::{Cell, CellValue};
use crate::named_range::NamedRangeStore;
use crate::sheet::{CellMap, Sheet};

/// Outcome of evaluating one formula cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaResult {
    /// The value to cache in the cell; `Empty` when `error` is set.
    pub value: CellValue,
    /// Cells the formula text references, for highlighting.
    pub referenced_cells: Vec<ReferencedCell>,
    pub error: Option<FormulaError>,
}

/// Evaluate a formula against a cell map.
///
/// `origin` is the coordinate of the cell holding the formula, if any; a
/// reference back to it evaluates to #CIRCULAR!. Pass `None` for formulas
/// evaluated outside a cell, e.g. a formula-bar preview. `sheets` resolves
/// cross-sheet references by case-insensitive sheet name.
pub fn evaluate_formula(
    formula: &str,
    cells: &CellMap,
    origin: Option<(usize, usize)>,
    sheets: &[Sheet],
    named_ranges: &NamedRangeStore,
) -> FormulaResult {
    let substituted = named_ranges.substitute(formula);
    let referenced_cells = extract_references(&substituted);

    let expr = match parse(&substituted) {
        Ok(expr) => expr,
        Err(_) => {
            return FormulaResult {
                value: CellValue::Empty,
                referenced_cells,
                error: Some(FormulaError::Error),
            };
        }
    };

    let lookup = MapLookup { cells, origin, sheets };
    match evaluate(&expr, &lookup) {
        Value::Number(n) => FormulaResult {
            value: CellValue::Number(n),
            referenced_cells,
            error: None,
        },
        Value::Text(s) => FormulaResult {
            value: CellValue::Text(s),
            referenced_cells,
            error: None,
        },
        Value::Error(e) => FormulaResult {
            value: CellValue::Empty,
            referenced_cells,
            error: Some(e),
        },
    }
}

/// Tooltip for the formula bar: the syntax and description of the first
/// recognized function in the input, falling back to a description of the
/// first operator. `None` for non-formula input.
pub fn formula_tooltip(input: &str) -> Option<String> {
    let rest = input.trim_start().strip_prefix('=')?;

    let chars: Vec<char> = rest.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            if chars.get(i) == Some(&'(') {
                if let Some(doc) = function_doc(&token) {
                    return Some(format!("{} - {}", doc.syntax, doc.description));
                }
            }
        } else {
            i += 1;
        }
    }

    rest.chars().find_map(operator_tooltip)
}

fn operator_tooltip(c: char) -> Option<String> {
    let text = match c {
        '+' => "Addition",
        '-' => "Subtraction",
        '*' => "Multiplication",
        '/' => "Division",
        '&' => "Text concatenation",
        '<' | '>' | '=' => "Comparison",
        _ => return None,
    };
    Some(text.to_string())
}

/// CellLookup over a sheet's cell map plus the workbook's sheet directory.
struct MapLookup<'a> {
    cells: &'a CellMap,
    origin: Option<(usize, usize)>,
    sheets: &'a [Sheet],
}

impl CellLookup for MapLookup<'_> {
    fn cell(&self, col: usize, row: usize) -> Option<Value> {
        if self.origin == Some((col, row)) {
            return Some(Value::Error(FormulaError::Circular));
        }
        self.cells.get(&(col, row)).and_then(cell_to_value)
    }

    fn sheet_cell(
        &self,
        sheet: &str,
        col: usize,
        row: usize,
    ) -> Result<Option<Value>, FormulaError> {
        let found = self
            .sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(sheet))
            .ok_or(FormulaError::Ref)?;
        Ok(found.cells.get(&(col, row)).and_then(cell_to_value))
    }
}

/// How stored cells look to the evaluator. Text holding an error code reads
/// back as that error so errors propagate between cells.
fn cell_to_value(cell: &Cell) -> Option<Value> {
    match &cell.value {
        CellValue::Empty => None,
        CellValue::Number(n) => Some(Value::Number(*n)),
        CellValue::Text(s) => match FormulaError::from_code(s) {
            Some(e) => Some(Value::Error(e)),
            None => Some(Value::Text(s.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(entries: &[(&str, Cell)]) -> CellMap {
        let mut map = CellMap::default();
        for (reference, cell) in entries {
            let r = crate::cell_ref::CellRef::parse(reference).unwrap();
            map.insert((r.col, r.row), cell.clone());
        }
        map
    }

    fn eval(formula: &str, cells: &CellMap) -> FormulaResult {
        evaluate_formula(formula, cells, None, &[], &NamedRangeStore::new())
    }

    #[test]
    fn test_evaluate_formula_arithmetic() {
        let cells = map_with(&[("A1", Cell::number(10.0)), ("A2", Cell::number(4.0))]);
        let result = eval("=A1*A2", &cells);
        assert_eq!(result.value, CellValue::Number(40.0));
        assert_eq!(result.error, None);
        assert_eq!(result.referenced_cells.len(), 2);
    }

    #[test]
    fn test_evaluate_formula_parse_error() {
        let cells = CellMap::default();
        let result = eval("=1+", &cells);
        assert_eq!(result.error, Some(FormulaError::Error));
        assert_eq!(result.value, CellValue::Empty);
    }

    #[test]
    fn test_self_reference_is_circular() {
        let cells = map_with(&[("B2", Cell::number(1.0))]);
        let result = evaluate_formula("=B2+1", &cells, Some((1, 1)), &[], &NamedRangeStore::new());
        assert_eq!(result.error, Some(FormulaError::Circular));
    }

    #[test]
    fn test_no_origin_never_reports_circular() {
        // Formula-bar previews evaluate without a home cell; every
        // coordinate must stay referenceable, corners included.
        let cells = map_with(&[("Z100", Cell::number(9.0))]);
        let result = eval("=Z100+1", &cells);
        assert_eq!(result.error, None);
        assert_eq!(result.value, CellValue::Number(10.0));
    }

    #[test]
    fn test_named_range_substitution_feeds_references() {
        let cells = map_with(&[("B1", Cell::number(5.0)), ("B2", Cell::number(7.0))]);
        let mut names = NamedRangeStore::new();
        names.set("Data", "B1:B2").unwrap();
        let result = evaluate_formula("=SUM(Data)", &cells, Some((0, 0)), &[], &names);
        assert_eq!(result.value, CellValue::Number(12.0));
        assert_eq!(result.referenced_cells.len(), 2);
    }

    #[test]
    fn test_stored_error_code_propagates() {
        let cells = map_with(&[("A1", Cell::text("#DIV/0!"))]);
        let result = eval("=A1+1", &cells);
        assert_eq!(result.error, Some(FormulaError::Div0));
    }

    #[test]
    fn test_cross_sheet_lookup() {
        let mut other = Sheet::new(2, "Data");
        other.cells.insert((0, 0), Cell::number(99.0));
        let sheets = vec![other];
        let cells = CellMap::default();
        let result =
            evaluate_formula("=data!A1+1", &cells, Some((0, 0)), &sheets, &NamedRangeStore::new());
        assert_eq!(result.value, CellValue::Number(100.0));
    }

    #[test]
    fn test_missing_sheet_is_ref_error() {
        let cells = CellMap::default();
        let result = eval("=Nowhere!A1", &cells);
        assert_eq!(result.error, Some(FormulaError::Ref));
    }

    #[test]
    fn test_tooltip() {
        assert!(formula_tooltip("=SUM(A1:A3)").unwrap().contains("SUM("));
        assert!(formula_tooltip("=1+VLOOKUP(").unwrap().contains("VLOOKUP"));
        assert_eq!(formula_tooltip("plain text"), None);
        assert_eq!(formula_tooltip("=A1+1").as_deref(), Some("Addition"));
        assert_eq!(formula_tooltip("=A1"), None);
    }
}
