// Lookup functions: VLOOKUP (exact match only).

use super::eval::{cell_at, eval_expr, CellLookup, FormulaError, Value};
use super::parser::Expr;

pub fn try_evaluate(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Option<Value> {
    match name {
        "VLOOKUP" => Some(eval_vlookup(args, lookup)),
        _ => None,
    }
}

fn eval_vlookup(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() != 3 {
        return Value::Error(FormulaError::Error);
    }

    let key = eval_expr(&args[0], lookup);
    if let Value::Error(e) = key {
        return Value::Error(e);
    }

    let (sheet, start, end) = match &args[1] {
        Expr::Range { start, end } => (None, start, end),
        Expr::SheetRange { sheet, start, end } => (Some(sheet.as_str()), start, end),
        _ => return Value::Error(FormulaError::Error),
    };
    let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));
    let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));

    let col_index = match eval_expr(&args[2], lookup).to_number() {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    if col_index < 1.0 {
        return Value::Error(FormulaError::Error);
    }
    let offset = col_index as usize - 1;
    if min_col + offset > max_col {
        // Asked for a column outside the range
        return Value::Error(FormulaError::Ref);
    }

    for row in min_row..=max_row {
        let candidate = match cell_at(lookup, sheet, min_col, row) {
            Ok(v) => v,
            Err(e) => return Value::Error(e),
        };
        let Some(candidate) = candidate else { continue };
        if let Value::Error(e) = candidate {
            return Value::Error(e);
        }
        if key_matches(&key, &candidate) {
            return match cell_at(lookup, sheet, min_col + offset, row) {
                Ok(Some(v)) => v,
                Ok(None) => Value::Number(0.0),
                Err(e) => Value::Error(e),
            };
        }
    }

    // No exact match
    Value::Error(FormulaError::Error)
}

/// Numeric equality when both sides are numeric, otherwise case-insensitive
/// text comparison.
fn key_matches(key: &Value, candidate: &Value) -> bool {
    if let (Ok(a), Ok(b)) = (key.to_number(), candidate.to_number()) {
        return a == b;
    }
    key.to_text().eq_ignore_ascii_case(&candidate.to_text())
}
