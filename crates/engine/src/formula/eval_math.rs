// Math and aggregation functions: SUM, AVERAGE, MIN, MAX, COUNT, ROUND.

use super::eval::{collect_numbers, collect_values, eval_expr, CellLookup, FormulaError, Value};
use super::parser::Expr;

/// Returns `None` when `name` is not handled here so dispatch can continue.
pub fn try_evaluate(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Option<Value> {
    match name {
        "SUM" => Some(eval_sum(args, lookup)),
        "AVERAGE" => Some(eval_average(args, lookup)),
        "MIN" => Some(eval_min_max(args, lookup, false)),
        "MAX" => Some(eval_min_max(args, lookup, true)),
        "COUNT" => Some(eval_count(args, lookup)),
        "ROUND" => Some(eval_round(args, lookup)),
        _ => None,
    }
}

fn eval_sum(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    match collect_numbers(args, lookup) {
        Ok(numbers) => Value::Number(numbers.iter().sum()),
        Err(e) => Value::Error(e),
    }
}

fn eval_average(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    match collect_numbers(args, lookup) {
        Ok(numbers) => {
            if numbers.is_empty() {
                // Average of nothing is 0/0
                Value::Error(FormulaError::Div0)
            } else {
                Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        Err(e) => Value::Error(e),
    }
}

fn eval_min_max(args: &[Expr], lookup: &dyn CellLookup, want_max: bool) -> Value {
    match collect_numbers(args, lookup) {
        Ok(numbers) => {
            if numbers.is_empty() {
                return Value::Number(0.0);
            }
            let mut best = numbers[0];
            for &n in &numbers[1..] {
                if (want_max && n > best) || (!want_max && n < best) {
                    best = n;
                }
            }
            Value::Number(best)
        }
        Err(e) => Value::Error(e),
    }
}

fn eval_count(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    // Counts non-empty cells of any type, not just numbers
    match collect_values(args, lookup) {
        Ok(values) => Value::Number(values.len() as f64),
        Err(e) => Value::Error(e),
    }
}

fn eval_round(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() != 2 {
        return Value::Error(FormulaError::Error);
    }
    let value = match eval_expr(&args[0], lookup).to_number() {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let digits = match eval_expr(&args[1], lookup).to_number() {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let factor = 10f64.powi(digits as i32);
    // f64::round is half-away-from-zero
    Value::Number((value * factor).round() / factor)
}

#[cfg(test)]
mod tests {
    use super::super::eval::test_support::{eval_str, TestGrid};
    use super::super::eval::{FormulaError, Value};

    fn grid_with_numbers() -> TestGrid {
        let mut grid = TestGrid::default();
        grid.set("A1", Value::Number(10.0));
        grid.set("A2", Value::Number(20.0));
        grid.set("A3", Value::Number(30.0));
        grid
    }

    #[test]
    fn test_sum_range() {
        let grid = grid_with_numbers();
        assert_eq!(eval_str("=SUM(A1:A3)", &grid), Value::Number(60.0));
    }

    #[test]
    fn test_sum_mixed_args() {
        let grid = grid_with_numbers();
        assert_eq!(eval_str("=SUM(A1:A2,5,A3)", &grid), Value::Number(65.0));
    }

    #[test]
    fn test_sum_skips_text_cells() {
        let mut grid = grid_with_numbers();
        grid.set("A2", Value::Text("note".to_string()));
        assert_eq!(eval_str("=SUM(A1:A3)", &grid), Value::Number(40.0));
    }

    #[test]
    fn test_sum_empty_range_is_zero() {
        let grid = TestGrid::default();
        assert_eq!(eval_str("=SUM(B1:B5)", &grid), Value::Number(0.0));
    }

    #[test]
    fn test_average() {
        let grid = grid_with_numbers();
        assert_eq!(eval_str("=AVERAGE(A1:A3)", &grid), Value::Number(20.0));
    }

    #[test]
    fn test_average_of_nothing_is_div0() {
        let grid = TestGrid::default();
        assert_eq!(
            eval_str("=AVERAGE(B1:B5)", &grid),
            Value::Error(FormulaError::Div0)
        );
    }

    #[test]
    fn test_min_max() {
        let grid = grid_with_numbers();
        assert_eq!(eval_str("=MIN(A1:A3)", &grid), Value::Number(10.0));
        assert_eq!(eval_str("=MAX(A1:A3)", &grid), Value::Number(30.0));
    }

    #[test]
    fn test_min_max_empty_is_zero() {
        let grid = TestGrid::default();
        assert_eq!(eval_str("=MIN(B1:B5)", &grid), Value::Number(0.0));
        assert_eq!(eval_str("=MAX(B1:B5)", &grid), Value::Number(0.0));
    }

    #[test]
    fn test_count_any_type() {
        let mut grid = grid_with_numbers();
        grid.set("A4", Value::Text("label".to_string()));
        assert_eq!(eval_str("=COUNT(A1:A10)", &grid), Value::Number(4.0));
    }

    #[test]
    fn test_round() {
        let grid = TestGrid::default();
        assert_eq!(eval_str("=ROUND(2.345,2)", &grid), Value::Number(2.35));
        assert_eq!(eval_str("=ROUND(2.5,0)", &grid), Value::Number(3.0));
        assert_eq!(eval_str("=ROUND(-2.5,0)", &grid), Value::Number(-3.0));
    }

    #[test]
    fn test_round_wrong_arity() {
        let grid = TestGrid::default();
        assert_eq!(
            eval_str("=ROUND(2.5)", &grid),
            Value::Error(FormulaError::Error)
        );
    }
}
