// Conditional aggregation: COUNTIF, SUMIF.

use super::eval::{cell_at, eval_expr, range_coords, CellLookup, FormulaError, Value};
use super::parser::Expr;

pub fn try_evaluate(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Option<Value> {
    match name {
        "COUNTIF" => Some(eval_countif(args, lookup)),
        "SUMIF" => Some(eval_sumif(args, lookup)),
        _ => None,
    }
}

fn range_of(arg: &Expr) -> Option<(Option<&str>, Vec<(usize, usize)>)> {
    match arg {
        Expr::Range { start, end } => Some((None, range_coords(start, end))),
        Expr::SheetRange { sheet, start, end } => {
            Some((Some(sheet.as_str()), range_coords(start, end)))
        }
        _ => None,
    }
}

fn criteria_of(arg: &Expr, lookup: &dyn CellLookup) -> Result<String, FormulaError> {
    match eval_expr(arg, lookup) {
        Value::Error(e) => Err(e),
        v => Ok(v.to_text()),
    }
}

fn eval_countif(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() != 2 {
        return Value::Error(FormulaError::Error);
    }
    let Some((sheet, coords)) = range_of(&args[0]) else {
        return Value::Error(FormulaError::Error);
    };
    let criteria = match criteria_of(&args[1], lookup) {
        Ok(c) => c,
        Err(e) => return Value::Error(e),
    };

    let mut count = 0usize;
    for (col, row) in coords {
        match cell_at(lookup, sheet, col, row) {
            Ok(Some(Value::Error(e))) => return Value::Error(e),
            Ok(Some(v)) => {
                if matches_criteria(&v, &criteria) {
                    count += 1;
                }
            }
            Ok(None) => {}
            Err(e) => return Value::Error(e),
        }
    }
    Value::Number(count as f64)
}

fn eval_sumif(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::Error(FormulaError::Error);
    }
    let Some((sheet, coords)) = range_of(&args[0]) else {
        return Value::Error(FormulaError::Error);
    };
    let criteria = match criteria_of(&args[1], lookup) {
        Ok(c) => c,
        Err(e) => return Value::Error(e),
    };

    // Sum range defaults to the criteria range itself. With a third
    // argument, the summed cell sits at the same relative offset.
    let (sum_sheet, sum_origin) = if args.len() == 3 {
        match &args[2] {
            Expr::Range { start, end } => {
                let origin = (start.col.min(end.col), start.row.min(end.row));
                (None, Some(origin))
            }
            Expr::SheetRange { sheet, start, end } => {
                let origin = (start.col.min(end.col), start.row.min(end.row));
                (Some(sheet.as_str()), Some(origin))
            }
            _ => return Value::Error(FormulaError::Error),
        }
    } else {
        (sheet, None)
    };

    let Some(&(first_col, first_row)) = coords.first() else {
        return Value::Number(0.0);
    };

    let mut total = 0.0;
    for (col, row) in &coords {
        let candidate = match cell_at(lookup, sheet, *col, *row) {
            Ok(v) => v,
            Err(e) => return Value::Error(e),
        };
        let Some(candidate) = candidate else { continue };
        if let Value::Error(e) = candidate {
            return Value::Error(e);
        }
        if !matches_criteria(&candidate, &criteria) {
            continue;
        }

        let (sum_col, sum_row) = match sum_origin {
            Some((origin_col, origin_row)) => {
                (origin_col + (col - first_col), origin_row + (row - first_row))
            }
            None => (*col, *row),
        };
        match cell_at(lookup, sum_sheet, sum_col, sum_row) {
            Ok(Some(Value::Number(n))) => total += n,
            // Numeric text counts, same as the plain aggregates
            Ok(Some(Value::Text(s))) => {
                if let Ok(n) = s.trim().parse::<f64>() {
                    total += n;
                }
            }
            Ok(Some(Value::Error(e))) => return Value::Error(e),
            Ok(None) => {}
            Err(e) => return Value::Error(e),
        }
    }
    Value::Number(total)
}

/// Criteria grammar: `>n`, `<n`, `>=n`, `<=n`, `=x`, `<>x`, or a plain value
/// compared for equality (numeric when both sides are numeric, otherwise
/// case-insensitive text).
pub(crate) fn matches_criteria(value: &Value, criteria: &str) -> bool {
    let criteria = criteria.trim();

    if let Some(rest) = criteria.strip_prefix(">=") {
        return both_numeric(value, rest).is_some_and(|(v, t)| v >= t);
    }
    if let Some(rest) = criteria.strip_prefix("<=") {
        return both_numeric(value, rest).is_some_and(|(v, t)| v <= t);
    }
    if let Some(rest) = criteria.strip_prefix("<>") {
        return !equals(value, rest);
    }
    if let Some(rest) = criteria.strip_prefix('>') {
        return both_numeric(value, rest).is_some_and(|(v, t)| v > t);
    }
    if let Some(rest) = criteria.strip_prefix('<') {
        return both_numeric(value, rest).is_some_and(|(v, t)| v < t);
    }
    if let Some(rest) = criteria.strip_prefix('=') {
        return equals(value, rest);
    }
    equals(value, criteria)
}

fn both_numeric(value: &Value, threshold: &str) -> Option<(f64, f64)> {
    let v = value.to_number().ok()?;
    let t = threshold.trim().parse::<f64>().ok()?;
    Some((v, t))
}

fn equals(value: &Value, target: &str) -> bool {
    if let Some((v, t)) = both_numeric(value, target) {
        return v == t;
    }
    value.to_text().eq_ignore_ascii_case(target.trim())
}
