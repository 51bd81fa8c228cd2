// Named ranges: user-defined aliases for cells or ranges, substituted into
// formula text before parsing. Substitution is textual so names work inside
// any formula position a reference would.

use serde::{Deserialize, Serialize};

use crate::cell_ref::CellRef;
use crate::formula::functions::is_function_name;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    /// Literal reference text the name stands for: "A1" or "A1:B5".
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRangeStore {
    ranges: Vec<NamedRange>,
}

impl NamedRangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a name. The name must be identifier-shaped, must
    /// not collide with cell-reference syntax or a function name, and the
    /// target must be a valid cell or range reference.
    pub fn set(&mut self, name: &str, target: &str) -> Result<(), String> {
        let name = name.trim();
        if !is_valid_name(name) {
            return Err(format!("Invalid name: {}", name));
        }
        if CellRef::parse(name).is_some() {
            return Err(format!("Name {} looks like a cell reference", name));
        }
        if is_function_name(name) {
            return Err(format!("Name {} is a function name", name));
        }
        let target = target.trim();
        if !is_valid_target(target) {
            return Err(format!("Invalid range target: {}", target));
        }

        if let Some(existing) = self
            .ranges
            .iter_mut()
            .find(|r| r.name.eq_ignore_ascii_case(name))
        {
            existing.target = target.to_string();
        } else {
            self.ranges.push(NamedRange {
                name: name.to_string(),
                target: target.to_string(),
            });
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NamedRange> {
        self.ranges.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.ranges.len();
        self.ranges.retain(|r| !r.name.eq_ignore_ascii_case(name));
        self.ranges.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Replace every defined name in the formula text with its target.
    /// Matching is whole-token and case-insensitive; string literals and
    /// sheet names (a token followed by `!`) are left alone.
    pub fn substitute(&self, formula: &str) -> String {
        if self.ranges.is_empty() {
            return formula.to_string();
        }

        let chars: Vec<char> = formula.chars().collect();
        let mut out = String::with_capacity(formula.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '"' {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        out.push(chars[i + 1]);
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

            if !(c.is_ascii_alphabetic() || c == '_') {
                out.push(c);
                i += 1;
                continue;
            }

            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            let is_sheet_prefix = i < chars.len() && chars[i] == '!';

            match (!is_sheet_prefix).then(|| self.get(&token)).flatten() {
                Some(range) => out.push_str(&range.target),
                None => out.push_str(&token),
            }
        }

        out
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_valid_target(target: &str) -> bool {
    match target.split_once(':') {
        Some((a, b)) => CellRef::parse(a).is_some() && CellRef::parse(b).is_some(),
        None => CellRef::parse(target).is_some(),
    }
}
