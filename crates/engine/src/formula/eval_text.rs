// Text functions: TRIM, CONCATENATE, LEFT, RIGHT, LEN.

use super::eval::{eval_expr, CellLookup, FormulaError, Value};
use super::parser::Expr;

pub fn try_evaluate(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Option<Value> {
    match name {
        "TRIM" => Some(eval_trim(args, lookup)),
        "CONCATENATE" => Some(eval_concatenate(args, lookup)),
        "LEFT" => Some(eval_left_right(args, lookup, true)),
        "RIGHT" => Some(eval_left_right(args, lookup, false)),
        "LEN" => Some(eval_len(args, lookup)),
        _ => None,
    }
}

fn text_arg(arg: &Expr, lookup: &dyn CellLookup) -> Result<String, FormulaError> {
    match eval_expr(arg, lookup) {
        Value::Error(e) => Err(e),
        v => Ok(v.to_text()),
    }
}

fn eval_trim(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() != 1 {
        return Value::Error(FormulaError::Error);
    }
    match text_arg(&args[0], lookup) {
        Ok(s) => Value::Text(s.trim().to_string()),
        Err(e) => Value::Error(e),
    }
}

fn eval_concatenate(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    let mut out = String::new();
    for arg in args {
        match text_arg(arg, lookup) {
            Ok(s) => out.push_str(&s),
            Err(e) => return Value::Error(e),
        }
    }
    Value::Text(out)
}

fn eval_left_right(args: &[Expr], lookup: &dyn CellLookup, from_left: bool) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::Error(FormulaError::Error);
    }
    let text = match text_arg(&args[0], lookup) {
        Ok(s) => s,
        Err(e) => return Value::Error(e),
    };
    let count = if args.len() == 2 {
        match eval_expr(&args[1], lookup).to_number() {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        }
    } else {
        1.0
    };
    if count < 0.0 {
        return Value::Error(FormulaError::Error);
    }
    // Character counts, not byte counts
    let chars: Vec<char> = text.chars().collect();
    let count = (count as usize).min(chars.len());
    let slice: String = if from_left {
        chars[..count].iter().collect()
    } else {
        chars[chars.len() - count..].iter().collect()
    };
    Value::Text(slice)
}

fn eval_len(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() != 1 {
        return Value::Error(FormulaError::Error);
    }
    match text_arg(&args[0], lookup) {
        Ok(s) => Value::Number(s.chars().count() as f64),
        Err(e) => Value::Error(e),
    }
}
