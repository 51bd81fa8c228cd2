// Logical functions: IF, AND, OR, NOT.

use super::eval::{eval_expr, CellLookup, FormulaError, Value};
use super::parser::Expr;

pub fn try_evaluate(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Option<Value> {
    match name {
        "IF" => Some(eval_if(args, lookup)),
        "AND" => Some(eval_and_or(args, lookup, true)),
        "OR" => Some(eval_and_or(args, lookup, false)),
        "NOT" => Some(eval_not(args, lookup)),
        _ => None,
    }
}

fn eval_if(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::Error(FormulaError::Error);
    }
    let condition = eval_expr(&args[0], lookup);
    if let Value::Error(e) = condition {
        return Value::Error(e);
    }
    if condition.is_truthy() {
        eval_expr(&args[1], lookup)
    } else if args.len() == 3 {
        eval_expr(&args[2], lookup)
    } else {
        // Omitted else branch
        Value::Number(0.0)
    }
}

fn eval_and_or(args: &[Expr], lookup: &dyn CellLookup, is_and: bool) -> Value {
    if args.is_empty() {
        return Value::Error(FormulaError::Error);
    }
    // Short-circuits: later arguments (and their errors) are never evaluated
    // once the result is decided.
    for arg in args {
        let v = eval_expr(arg, lookup);
        if let Value::Error(e) = v {
            return Value::Error(e);
        }
        let truthy = v.is_truthy();
        if is_and && !truthy {
            return Value::Number(0.0);
        }
        if !is_and && truthy {
            return Value::Number(1.0);
        }
    }
    Value::Number(if is_and { 1.0 } else { 0.0 })
}

fn eval_not(args: &[Expr], lookup: &dyn CellLookup) -> Value {
    if args.len() != 1 {
        return Value::Error(FormulaError::Error);
    }
    let v = eval_expr(&args[0], lookup);
    if let Value::Error(e) = v {
        return Value::Error(e);
    }
    Value::Number(if v.is_truthy() { 0.0 } else { 1.0 })
}
