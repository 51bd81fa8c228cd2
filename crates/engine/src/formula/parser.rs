// Formula parser - converts formula strings into AST
// Supports: numbers, strings, cell refs (A1, $A$1), ranges (A1:A5),
// cross-sheet refs (Sheet2!A1), functions (SUM), math (+ - * /),
// comparisons (< > = <= >= <>), and concatenation (&).

use crate::cell_ref::CellRef;

/// Expression AST. Immutable once built; evaluation never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Cell(CellRef),
    SheetCell { sheet: String, cell: CellRef },
    Range { start: CellRef, end: CellRef },
    SheetRange { sheet: String, start: CellRef, end: CellRef },
    Function { name: String, args: Vec<Expr> },
    BinaryOp { op: Op, left: Box<Expr>, right: Box<Expr> },
    Negate(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Lt,
    Gt,
    Eq,
    LtEq,
    GtEq,
    NotEq,
    // String
    Concat,
}

/// Parse a formula string (leading `=` required) into an AST.
pub fn parse(formula: &str) -> Result<Expr, String> {
    let formula = formula.trim();
    let Some(input) = formula.strip_prefix('=') else {
        return Err("Formula must start with =".to_string());
    };

    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("Empty formula".to_string());
    }
    let (expr, pos) = parse_comparison(&tokens, 0)?;
    if pos != tokens.len() {
        return Err(format!("Unexpected token at position {}", pos));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ref(CellRef),
    Range(CellRef, CellRef),
    SheetRef(String, CellRef),
    SheetRange(String, CellRef, CellRef),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Lt,
    Gt,
    Eq,
    LtEq,
    GtEq,
    NotEq,
    Ampersand,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            ',' => { tokens.push(Token::Comma); chars.next(); }
            '&' => { tokens.push(Token::Ampersand); chars.next(); }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => { tokens.push(Token::LtEq); chars.next(); }
                    Some('>') => { tokens.push(Token::NotEq); chars.next(); }
                    _ => tokens.push(Token::Lt),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    tokens.push(Token::GtEq);
                    chars.next();
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '=' => { tokens.push(Token::Eq); chars.next(); }
            '"' => {
                // String literal with backslash-escaped quotes
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => s.push(escaped),
                            None => return Err("Unterminated string literal".to_string()),
                        },
                        Some(ch) => s.push(ch),
                        None => return Err("Unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Str(s));
            }
            'A'..='Z' | 'a'..='z' | '_' => {
                // Cell reference (A1), function name (SUM), or sheet prefix (Sheet1!)
                let ident = scan_ident(&mut chars);

                if chars.peek() == Some(&'!') {
                    chars.next();
                    let cell_text = scan_ident(&mut chars);
                    let Some(start) = CellRef::parse(&cell_text) else {
                        return Err(format!("Invalid sheet reference: {}!{}", ident, cell_text));
                    };
                    if chars.peek() == Some(&':') {
                        chars.next();
                        let end_text = scan_ident(&mut chars);
                        let Some(end) = CellRef::parse(&end_text) else {
                            return Err(format!("Invalid range end: {}", end_text));
                        };
                        tokens.push(Token::SheetRange(ident, start, end));
                    } else {
                        tokens.push(Token::SheetRef(ident, start));
                    }
                } else if let Some(cell) = CellRef::parse(&ident) {
                    push_ref_or_range(cell, &mut chars, &mut tokens)?;
                } else {
                    tokens.push(Token::Ident(ident.to_uppercase()));
                }
            }
            '$' => {
                // Absolute reference marker - must begin a cell reference
                let ident = scan_ident(&mut chars);
                let Some(cell) = CellRef::parse(&ident) else {
                    return Err(format!("Invalid cell reference: {}", ident));
                };
                push_ref_or_range(cell, &mut chars, &mut tokens)?;
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(format!("Unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

/// Collect an identifier-ish run: letters, digits, `_`, `$`.
fn scan_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
            ident.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

/// Emit a Ref token, extending to a Range token if a `:` follows.
fn push_ref_or_range(
    cell: CellRef,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    tokens: &mut Vec<Token>,
) -> Result<(), String> {
    if chars.peek() == Some(&':') {
        chars.next();
        let end_text = scan_ident(chars);
        let Some(end) = CellRef::parse(&end_text) else {
            return Err(format!("Invalid range end: {}", end_text));
        };
        tokens.push(Token::Range(cell, end));
    } else {
        tokens.push(Token::Ref(cell));
    }
    Ok(())
}

// Lowest precedence: at most one comparison per expression
fn parse_comparison(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (left, pos) = parse_concat(tokens, pos)?;

    if pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Lt => Some(Op::Lt),
            Token::Gt => Some(Op::Gt),
            Token::Eq => Some(Op::Eq),
            Token::LtEq => Some(Op::LtEq),
            Token::GtEq => Some(Op::GtEq),
            Token::NotEq => Some(Op::NotEq),
            _ => None,
        };
        if let Some(op) = op {
            let (right, pos) = parse_concat(tokens, pos + 1)?;
            return Ok((
                Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) },
                pos,
            ));
        }
    }

    Ok((left, pos))
}

// String concatenation (&)
fn parse_concat(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_add_sub(tokens, pos)?;

    while pos < tokens.len() {
        if let Token::Ampersand = &tokens[pos] {
            let (right, new_pos) = parse_add_sub(tokens, pos + 1)?;
            left = Expr::BinaryOp {
                op: Op::Concat,
                left: Box::new(left),
                right: Box::new(right),
            };
            pos = new_pos;
        } else {
            break;
        }
    }

    Ok((left, pos))
}

fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_factor(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            _ => break,
        };
        let (right, new_pos) = parse_factor(tokens, pos + 1)?;
        left = Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_factor(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    if pos >= tokens.len() {
        return Err("Unexpected end of expression".to_string());
    }

    match &tokens[pos] {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::Str(s) => Ok((Expr::Text(s.clone()), pos + 1)),
        Token::Ref(cell) => Ok((Expr::Cell(*cell), pos + 1)),
        Token::Range(start, end) => Ok((Expr::Range { start: *start, end: *end }, pos + 1)),
        Token::SheetRef(sheet, cell) => Ok((
            Expr::SheetCell { sheet: sheet.clone(), cell: *cell },
            pos + 1,
        )),
        Token::SheetRange(sheet, start, end) => Ok((
            Expr::SheetRange { sheet: sheet.clone(), start: *start, end: *end },
            pos + 1,
        )),
        Token::Ident(name) => {
            if pos + 1 >= tokens.len() || tokens[pos + 1] != Token::LParen {
                return Err(format!("Expected ( after function name {}", name));
            }
            let (args, new_pos) = parse_function_args(tokens, pos + 2)?;
            Ok((Expr::Function { name: name.clone(), args }, new_pos))
        }
        Token::LParen => {
            let (expr, pos) = parse_comparison(tokens, pos + 1)?;
            match tokens.get(pos) {
                Some(Token::RParen) => Ok((expr, pos + 1)),
                _ => Err("Missing closing parenthesis".to_string()),
            }
        }
        Token::Minus => {
            // Unary minus - right-recursive so it stacks (--5)
            let (expr, pos) = parse_factor(tokens, pos + 1)?;
            Ok((Expr::Negate(Box::new(expr)), pos))
        }
        _ => Err(format!("Unexpected token at position {}", pos)),
    }
}

fn parse_function_args(tokens: &[Token], pos: usize) -> Result<(Vec<Expr>, usize), String> {
    let mut args = Vec::new();
    let mut pos = pos;

    // Empty argument list: SUM()
    if let Some(Token::RParen) = tokens.get(pos) {
        return Ok((args, pos + 1));
    }

    loop {
        let (arg, new_pos) = parse_comparison(tokens, pos)?;
        args.push(arg);
        pos = new_pos;

        match tokens.get(pos) {
            Some(Token::RParen) => return Ok((args, pos + 1)),
            Some(Token::Comma) => pos += 1,
            _ => return Err("Missing closing parenthesis in function call".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(col: usize, row: usize) -> CellRef {
        CellRef::new(col, row)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("=42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse("=.5").unwrap(), Expr::Number(0.5));
    }

    #[test]
    fn test_parse_string_with_escape() {
        assert_eq!(
            parse(r#"="say \"hi\"""#).unwrap(),
            Expr::Text("say \"hi\"".to_string())
        );
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse("=B2").unwrap(), Expr::Cell(cell(1, 1)));
    }

    #[test]
    fn test_parse_absolute_ref() {
        let expr = parse("=$A$1").unwrap();
        match expr {
            Expr::Cell(r) => assert!(r.col_abs && r.row_abs),
            other => panic!("expected Cell, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse("=A1:A3").unwrap(),
            Expr::Range { start: cell(0, 0), end: cell(0, 2) }
        );
    }

    #[test]
    fn test_parse_sheet_ref() {
        assert_eq!(
            parse("=Sheet2!A1").unwrap(),
            Expr::SheetCell { sheet: "Sheet2".to_string(), cell: cell(0, 0) }
        );
    }

    #[test]
    fn test_parse_sheet_range() {
        assert_eq!(
            parse("=Data!A1:B2").unwrap(),
            Expr::SheetRange {
                sheet: "Data".to_string(),
                start: cell(0, 0),
                end: cell(1, 1),
            }
        );
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 2+3*4 parses as 2+(3*4)
        match parse("=2+3*4").unwrap() {
            Expr::BinaryOp { op: Op::Add, right, .. } => {
                assert!(matches!(*right, Expr::BinaryOp { op: Op::Mul, .. }));
            }
            other => panic!("expected Add at top, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // 10-3-2 parses as (10-3)-2
        match parse("=10-3-2").unwrap() {
            Expr::BinaryOp { op: Op::Sub, left, right } => {
                assert!(matches!(*left, Expr::BinaryOp { op: Op::Sub, .. }));
                assert_eq!(*right, Expr::Number(2.0));
            }
            other => panic!("expected Sub at top, got {:?}", other),
        }
    }

    #[test]
    fn test_parens_override_precedence() {
        match parse("=(2+3)*4").unwrap() {
            Expr::BinaryOp { op: Op::Mul, left, .. } => {
                assert!(matches!(*left, Expr::BinaryOp { op: Op::Add, .. }));
            }
            other => panic!("expected Mul at top, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_stacks() {
        assert_eq!(
            parse("=--5").unwrap(),
            Expr::Negate(Box::new(Expr::Negate(Box::new(Expr::Number(5.0)))))
        );
    }

    #[test]
    fn test_comparison_at_lowest_precedence() {
        match parse("=A1+1>B1").unwrap() {
            Expr::BinaryOp { op: Op::Gt, left, .. } => {
                assert!(matches!(*left, Expr::BinaryOp { op: Op::Add, .. }));
            }
            other => panic!("expected Gt at top, got {:?}", other),
        }
    }

    #[test]
    fn test_concat_operator() {
        match parse(r#"="a"&"b""#).unwrap() {
            Expr::BinaryOp { op: Op::Concat, .. } => {}
            other => panic!("expected Concat, got {:?}", other),
        }
    }

    #[test]
    fn test_function_call() {
        match parse("=SUM(A1:A3,B1)").unwrap() {
            Expr::Function { name, args } => {
                assert_eq!(name, "SUM");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_name_lowercased_input() {
        match parse("=sum(1,2)").unwrap() {
            Expr::Function { name, .. } => assert_eq!(name, "SUM"),
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_arg_list() {
        match parse("=SUM()").unwrap() {
            Expr::Function { args, .. } => assert!(args.is_empty()),
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("1+2").is_err(), "missing =");
        assert!(parse("=").is_err(), "empty formula");
        assert!(parse("=1+").is_err(), "trailing operator");
        assert!(parse("=(1+2").is_err(), "unclosed paren");
        assert!(parse("=SUM(1,2").is_err(), "unclosed call");
        assert!(parse("=1 2").is_err(), "leftover tokens");
        assert!(parse("=A1:xyz").is_err(), "malformed range");
        assert!(parse("=Sheet2!zz").is_err(), "malformed sheet ref");
        assert!(parse("=#").is_err(), "unexpected character");
        assert!(parse("=FOO").is_err(), "bare identifier");
    }

    #[test]
    fn test_whitespace_insensitive() {
        assert_eq!(parse("= 1 + 2").unwrap(), parse("=1+2").unwrap());
    }

    #[test]
    fn test_bare_range_parses() {
        // Rejected at evaluation time, not parse time
        assert!(parse("=A1:A3").is_ok());
    }
}
