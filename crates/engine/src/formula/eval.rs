// Formula evaluator. Walks the AST from the parser against a CellLookup
// and produces a single Value. Errors are values here, not Results: they
// flow through arithmetic and function calls like any other operand.

use std::fmt;

use crate::cell::format_number;
use crate::cell_ref::CellRef;

use super::parser::{Expr, Op};
use super::{eval_conditional, eval_logical, eval_lookup, eval_math, eval_text};

/// The spreadsheet error taxonomy. Rendered into the cell as its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaError {
    /// Malformed formula, bad argument, unusable operand
    Error,
    /// Division by zero
    Div0,
    /// Unknown function name
    Name,
    /// Reference to a missing sheet or unresolvable target
    Ref,
    /// Formula references its own cell
    Circular,
}

impl FormulaError {
    pub fn code(&self) -> &'static str {
        match self {
            FormulaError::Error => "#ERROR!",
            FormulaError::Div0 => "#DIV/0!",
            FormulaError::Name => "#NAME?",
            FormulaError::Ref => "#REF!",
            FormulaError::Circular => "#CIRCULAR!",
        }
    }

    /// Recognize a stored error code, e.g. when a cell's text is itself an
    /// error that must propagate into formulas reading it.
    pub fn from_code(text: &str) -> Option<Self> {
        match text {
            "#ERROR!" => Some(FormulaError::Error),
            "#DIV/0!" => Some(FormulaError::Div0),
            "#NAME?" => Some(FormulaError::Name),
            "#REF!" => Some(FormulaError::Ref),
            "#CIRCULAR!" => Some(FormulaError::Circular),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Value {
    /// Numeric coercion: numbers pass through, numeric text parses, other
    /// text is unusable, errors propagate.
    pub fn to_number(&self) -> Result<f64, FormulaError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) => s.trim().parse::<f64>().map_err(|_| FormulaError::Error),
            Value::Error(e) => Err(*e),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Error(e) => e.code().to_string(),
        }
    }

    /// Truthiness for IF/AND/OR: nonzero number or non-empty text.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Error(_) => false,
        }
    }
}

/// Read access to cell values during evaluation.
///
/// `cell` returns `None` for empty cells so aggregates can tell empty from
/// zero. `sheet_cell` resolves cross-sheet references; the default denies
/// them, for contexts with no sheet directory.
pub trait CellLookup {
    fn cell(&self, col: usize, row: usize) -> Option<Value>;

    fn sheet_cell(
        &self,
        sheet: &str,
        col: usize,
        row: usize,
    ) -> Result<Option<Value>, FormulaError> {
        let _ = (sheet, col, row);
        Err(FormulaError::Ref)
    }
}

/// Evaluate an expression tree. Numeric results are rounded to 10 decimal
/// digits so float noise (0.1+0.2) never reaches the grid.
pub fn evaluate(expr: &Expr, lookup: &dyn CellLookup) -> Value {
    match eval_expr(expr, lookup) {
        Value::Number(n) => Value::Number(round_result(n)),
        other => other,
    }
}

pub(crate) fn round_result(n: f64) -> f64 {
    let scaled = n * 1e10;
    // Magnitudes near f64::MAX overflow the scaling; leave them as-is
    if !scaled.is_finite() {
        return n;
    }
    scaled.round() / 1e10
}

pub(crate) fn eval_expr(expr: &Expr, lookup: &dyn CellLookup) -> Value {
    match expr {
        Expr::Number(n) => Value::Number(*n),
        Expr::Text(s) => Value::Text(s.clone()),
        Expr::Cell(cell) => match lookup.cell(cell.col, cell.row) {
            Some(v) => v,
            None => Value::Number(0.0),
        },
        Expr::SheetCell { sheet, cell } => match lookup.sheet_cell(sheet, cell.col, cell.row) {
            Ok(Some(v)) => v,
            Ok(None) => Value::Number(0.0),
            Err(e) => Value::Error(e),
        },
        // A range is only meaningful as a function argument
        Expr::Range { .. } | Expr::SheetRange { .. } => Value::Error(FormulaError::Error),
        Expr::Negate(inner) => {
            let v = eval_expr(inner, lookup);
            if let Value::Error(e) = v {
                return Value::Error(e);
            }
            match v.to_number() {
                Ok(n) => Value::Number(-n),
                Err(e) => Value::Error(e),
            }
        }
        Expr::BinaryOp { op, left, right } => {
            let lhs = eval_expr(left, lookup);
            if let Value::Error(e) = lhs {
                return Value::Error(e);
            }
            let rhs = eval_expr(right, lookup);
            if let Value::Error(e) = rhs {
                return Value::Error(e);
            }
            eval_binary(*op, &lhs, &rhs)
        }
        Expr::Function { name, args } => call_function(name, args, lookup),
    }
}

fn eval_binary(op: Op, lhs: &Value, rhs: &Value) -> Value {
    match op {
        Op::Concat => Value::Text(format!("{}{}", lhs.to_text(), rhs.to_text())),
        Op::Add | Op::Sub | Op::Mul | Op::Div => {
            let a = match lhs.to_number() {
                Ok(n) => n,
                Err(e) => return Value::Error(e),
            };
            let b = match rhs.to_number() {
                Ok(n) => n,
                Err(e) => return Value::Error(e),
            };
            match op {
                Op::Add => Value::Number(a + b),
                Op::Sub => Value::Number(a - b),
                Op::Mul => Value::Number(a * b),
                Op::Div => {
                    if b == 0.0 {
                        Value::Error(FormulaError::Div0)
                    } else {
                        Value::Number(a / b)
                    }
                }
                _ => unreachable!(),
            }
        }
        Op::Eq | Op::NotEq | Op::Lt | Op::Gt | Op::LtEq | Op::GtEq => {
            let result = compare(op, lhs, rhs);
            Value::Number(if result { 1.0 } else { 0.0 })
        }
    }
}

/// Numeric comparison when both sides coerce to numbers; otherwise equality
/// is case-insensitive text comparison and ordering comparisons are false.
fn compare(op: Op, lhs: &Value, rhs: &Value) -> bool {
    if let (Ok(a), Ok(b)) = (lhs.to_number(), rhs.to_number()) {
        return match op {
            Op::Eq => a == b,
            Op::NotEq => a != b,
            Op::Lt => a < b,
            Op::Gt => a > b,
            Op::LtEq => a <= b,
            Op::GtEq => a >= b,
            _ => false,
        };
    }
    let a = lhs.to_text().to_lowercase();
    let b = rhs.to_text().to_lowercase();
    match op {
        Op::Eq => a == b,
        Op::NotEq => a != b,
        _ => false,
    }
}

fn call_function(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if let Some(v) = eval_math::try_evaluate(name, args, lookup) {
        return v;
    }
    if let Some(v) = eval_logical::try_evaluate(name, args, lookup) {
        return v;
    }
    if let Some(v) = eval_text::try_evaluate(name, args, lookup) {
        return v;
    }
    if let Some(v) = eval_lookup::try_evaluate(name, args, lookup) {
        return v;
    }
    if let Some(v) = eval_conditional::try_evaluate(name, args, lookup) {
        return v;
    }
    match name {
        // Chart functions are rendered by the grid layer; the engine treats
        // them as plain zero so arithmetic over them stays defined.
        "SPARKLINE" | "BARCHART" | "PIECHART" => Value::Number(0.0),
        _ => Value::Error(FormulaError::Name),
    }
}

/// Read one cell, local or cross-sheet.
pub(crate) fn cell_at(
    lookup: &dyn CellLookup,
    sheet: Option<&str>,
    col: usize,
    row: usize,
) -> Result<Option<Value>, FormulaError> {
    match sheet {
        Some(name) => lookup.sheet_cell(name, col, row),
        None => Ok(lookup.cell(col, row)),
    }
}

/// The normalized rectangle of a range expression, row-major.
pub(crate) fn range_coords(start: &CellRef, end: &CellRef) -> Vec<(usize, usize)> {
    let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));
    let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));
    let mut coords = Vec::with_capacity((max_col - min_col + 1) * (max_row - min_row + 1));
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            coords.push((col, row));
        }
    }
    coords
}

/// Collect the numeric values of the arguments for SUM/AVERAGE/MIN/MAX.
///
/// Range cells that are empty or hold non-numeric text are skipped; error
/// values propagate from anywhere.
pub(crate) fn collect_numbers(
    args: &[Expr],
    lookup: &dyn CellLookup,
) -> Result<Vec<f64>, FormulaError> {
    let mut numbers = Vec::new();
    for value in collect_values(args, lookup)? {
        match value {
            Value::Number(n) => numbers.push(n),
            Value::Text(s) => {
                if let Ok(n) = s.trim().parse::<f64>() {
                    numbers.push(n);
                }
            }
            Value::Error(e) => return Err(e),
        }
    }
    Ok(numbers)
}

/// Collect the present (non-empty) values of the arguments, expanding
/// ranges. Used by COUNT and as the base of collect_numbers.
pub(crate) fn collect_values(
    args: &[Expr],
    lookup: &dyn CellLookup,
) -> Result<Vec<Value>, FormulaError> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            Expr::Range { start, end } => {
                collect_range(None, start, end, lookup, &mut values)?;
            }
            Expr::SheetRange { sheet, start, end } => {
                collect_range(Some(sheet), start, end, lookup, &mut values)?;
            }
            Expr::Cell(cell) => {
                if let Some(v) = lookup.cell(cell.col, cell.row) {
                    values.push(check(v)?);
                }
            }
            Expr::SheetCell { sheet, cell } => {
                if let Some(v) = lookup.sheet_cell(sheet, cell.col, cell.row)? {
                    values.push(check(v)?);
                }
            }
            other => values.push(check(eval_expr(other, lookup))?),
        }
    }
    Ok(values)
}

fn collect_range(
    sheet: Option<&str>,
    start: &CellRef,
    end: &CellRef,
    lookup: &dyn CellLookup,
    out: &mut Vec<Value>,
) -> Result<(), FormulaError> {
    for (col, row) in range_coords(start, end) {
        if let Some(v) = cell_at(lookup, sheet, col, row)? {
            out.push(check(v)?);
        }
    }
    Ok(())
}

fn check(v: Value) -> Result<Value, FormulaError> {
    match v {
        Value::Error(e) => Err(e),
        other => Ok(other),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rustc_hash::FxHashMap;

    /// Minimal lookup over an in-memory map, for evaluator tests.
    #[derive(Default)]
    pub struct TestGrid {
        pub cells: FxHashMap<(usize, usize), Value>,
    }

    impl TestGrid {
        pub fn set(&mut self, reference: &str, value: Value) {
            let cell = CellRef::parse(reference).unwrap();
            self.cells.insert((cell.col, cell.row), value);
        }
    }

    impl CellLookup for TestGrid {
        fn cell(&self, col: usize, row: usize) -> Option<Value> {
            self.cells.get(&(col, row)).cloned()
        }
    }

    pub fn eval_str(formula: &str, grid: &TestGrid) -> Value {
        let expr = super::super::parser::parse(formula).unwrap();
        evaluate(&expr, grid)
    }
}
