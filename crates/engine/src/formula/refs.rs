// Text-level reference utilities. These work on the raw formula string, not
// the AST, so they stay usable on formulas that do not currently parse.
// Used for reference highlighting in the formula bar and for shifting
// formulas on copy/fill.

use crate::cell_ref::CellRef;

/// One cell a formula references. Cells belonging to the same range share a
/// `group`, so the grid can paint a range as one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencedCell {
    pub col: usize,
    pub row: usize,
    pub group: usize,
}

/// Pieces of a formula string after a reference-aware scan.
enum Piece {
    /// Copied through untouched: operators, literals, function names
    Verbatim(String),
    /// A same-sheet single reference with its source text
    Single { cell: CellRef, text: String },
    /// A same-sheet range: both endpoints and their source text
    Pair {
        start: CellRef,
        end: CellRef,
        start_text: String,
        end_text: String,
    },
    /// A sheet-qualified reference or range: never extracted or shifted
    Qualified(String),
}

/// All same-sheet cells the formula text references. Ranges expand to every
/// cell in their rectangle under one group id; sheet-qualified references
/// are skipped.
pub fn extract_references(formula: &str) -> Vec<ReferencedCell> {
    let mut out = Vec::new();
    let mut group = 0usize;
    for piece in scan(formula) {
        match piece {
            Piece::Single { cell, .. } => {
                out.push(ReferencedCell { col: cell.col, row: cell.row, group });
                group += 1;
            }
            Piece::Pair { start, end, .. } => {
                let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));
                let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));
                for row in min_row..=max_row {
                    for col in min_col..=max_col {
                        out.push(ReferencedCell { col, row, group });
                    }
                }
                group += 1;
            }
            Piece::Verbatim(_) | Piece::Qualified(_) => {}
        }
    }
    out
}

/// Shift the formula's relative references by (delta_col, delta_row),
/// returning the rewritten text.
///
/// Absolute axes stay put. A reference that would leave the grid keeps its
/// original text unchanged; for a range, either failing endpoint keeps the
/// whole range text. Sheet-qualified references are never touched.
pub fn adjust_formula_references(formula: &str, delta_col: isize, delta_row: isize) -> String {
    let mut out = String::with_capacity(formula.len());
    for piece in scan(formula) {
        match piece {
            Piece::Verbatim(text) | Piece::Qualified(text) => out.push_str(&text),
            Piece::Single { cell, text } => match cell.shifted(delta_col, delta_row) {
                Some(moved) => out.push_str(&moved.to_string()),
                None => out.push_str(&text),
            },
            Piece::Pair { start, end, start_text, end_text } => {
                match (
                    start.shifted(delta_col, delta_row),
                    end.shifted(delta_col, delta_row),
                ) {
                    (Some(a), Some(b)) => {
                        out.push_str(&a.to_string());
                        out.push(':');
                        out.push_str(&b.to_string());
                    }
                    _ => {
                        out.push_str(&start_text);
                        out.push(':');
                        out.push_str(&end_text);
                    }
                }
            }
        }
    }
    out
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn scan(formula: &str) -> Vec<Piece> {
    let chars: Vec<char> = formula.chars().collect();
    let mut pieces = Vec::new();
    let mut verbatim = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // String literals pass through whole, escapes included
        if c == '"' {
            verbatim.push(c);
            i += 1;
            while i < chars.len() {
                verbatim.push(chars[i]);
                if chars[i] == '\\' && i + 1 < chars.len() {
                    verbatim.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                let closed = chars[i] == '"';
                i += 1;
                if closed {
                    break;
                }
            }
            continue;
        }

        if !(c.is_ascii_alphabetic() || c == '$') {
            verbatim.push(c);
            i += 1;
            continue;
        }

        let token_start = i;
        while i < chars.len() && is_token_char(chars[i]) {
            i += 1;
        }
        let token: String = chars[token_start..i].iter().collect();

        // Sheet-qualified: Name!A1 or Name!A1:B2, passed through whole
        if i < chars.len() && chars[i] == '!' {
            let mut qualified = token;
            qualified.push('!');
            i += 1;
            let ref_start = i;
            while i < chars.len() && is_token_char(chars[i]) {
                i += 1;
            }
            qualified.extend(&chars[ref_start..i]);
            if i < chars.len() && chars[i] == ':' {
                qualified.push(':');
                i += 1;
                let end_start = i;
                while i < chars.len() && is_token_char(chars[i]) {
                    i += 1;
                }
                qualified.extend(&chars[end_start..i]);
            }
            flush(&mut pieces, &mut verbatim);
            pieces.push(Piece::Qualified(qualified));
            continue;
        }

        let Some(cell) = CellRef::parse(&token) else {
            // Function name or named range
            verbatim.push_str(&token);
            continue;
        };

        if i < chars.len() && chars[i] == ':' {
            i += 1;
            let end_start = i;
            while i < chars.len() && is_token_char(chars[i]) {
                i += 1;
            }
            let end_text: String = chars[end_start..i].iter().collect();
            if let Some(end) = CellRef::parse(&end_text) {
                flush(&mut pieces, &mut verbatim);
                pieces.push(Piece::Pair { start: cell, end, start_text: token, end_text });
                continue;
            }
            // Not a range after all; keep the colon and rescan the tail
            flush(&mut pieces, &mut verbatim);
            pieces.push(Piece::Single { cell, text: token });
            verbatim.push(':');
            verbatim.push_str(&end_text);
            continue;
        }

        flush(&mut pieces, &mut verbatim);
        pieces.push(Piece::Single { cell, text: token });
    }

    flush(&mut pieces, &mut verbatim);
    pieces
}

fn flush(pieces: &mut Vec<Piece>, verbatim: &mut String) {
    if !verbatim.is_empty() {
        pieces.push(Piece::Verbatim(std::mem::take(verbatim)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(formula: &str) -> Vec<(usize, usize, usize)> {
        extract_references(formula)
            .into_iter()
            .map(|r| (r.col, r.row, r.group))
            .collect()
    }

    #[test]
    fn test_extract_single_refs() {
        assert_eq!(refs("=A1+B2"), vec![(0, 0, 0), (1, 1, 1)]);
    }

    #[test]
    fn test_extract_range_shares_group() {
        assert_eq!(
            refs("=SUM(A1:A3)"),
            vec![(0, 0, 0), (0, 1, 0), (0, 2, 0)]
        );
    }

    #[test]
    fn test_extract_range_then_single_groups() {
        let r = refs("=SUM(A1:A2)+C5");
        assert_eq!(r, vec![(0, 0, 0), (0, 1, 0), (2, 4, 1)]);
    }

    #[test]
    fn test_extract_reversed_range_normalizes() {
        assert_eq!(refs("=SUM(A3:A1)"), vec![(0, 0, 0), (0, 1, 0), (0, 2, 0)]);
    }

    #[test]
    fn test_extract_skips_strings_and_functions() {
        assert_eq!(refs(r#"=IF(A1,"B2","C3")"#), vec![(0, 0, 0)]);
    }

    #[test]
    fn test_extract_skips_sheet_qualified() {
        assert_eq!(refs("=Sheet2!A1+B1"), vec![(1, 0, 0)]);
        assert_eq!(refs("=Data!A1:B2"), vec![]);
    }

    #[test]
    fn test_extract_absolute_refs() {
        assert_eq!(refs("=$A$1"), vec![(0, 0, 0)]);
    }

    #[test]
    fn test_adjust_relative() {
        assert_eq!(adjust_formula_references("=A1+B2", 1, 1), "=B2+C3");
    }

    #[test]
    fn test_adjust_absolute_unchanged() {
        assert_eq!(adjust_formula_references("=$A$1+B1", 5, 5), "=$A$1+G6");
    }

    #[test]
    fn test_adjust_mixed_axes() {
        assert_eq!(adjust_formula_references("=$A1+A$1", 1, 1), "=$A2+B$1");
    }

    #[test]
    fn test_adjust_range() {
        assert_eq!(
            adjust_formula_references("=SUM(A1:B2)", 1, 1),
            "=SUM(B2:C3)"
        );
    }

    #[test]
    fn test_adjust_out_of_bounds_keeps_original() {
        assert_eq!(adjust_formula_references("=Z100+A1", 1, 1), "=Z100+B2");
        assert_eq!(adjust_formula_references("=A1+B1", -1, 0), "=A1+A1");
    }

    #[test]
    fn test_adjust_range_with_one_bad_endpoint_keeps_whole_range() {
        assert_eq!(
            adjust_formula_references("=SUM(Y99:Z100)", 1, 1),
            "=SUM(Y99:Z100)"
        );
    }

    #[test]
    fn test_adjust_leaves_sheet_refs_alone() {
        assert_eq!(
            adjust_formula_references("=Sheet2!A1+A1", 1, 1),
            "=Sheet2!A1+B2"
        );
    }

    #[test]
    fn test_adjust_leaves_strings_alone() {
        assert_eq!(
            adjust_formula_references(r#"=CONCATENATE("A1",B1)"#, 0, 1),
            r#"=CONCATENATE("A1",B2)"#
        );
    }
}
