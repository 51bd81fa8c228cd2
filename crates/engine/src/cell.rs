use serde::{Deserialize, Serialize};

/// The stored scalar content of a cell.
///
/// An explicit tagged union so "cell is empty" and "cell holds text" are
/// never conflated at a consumption site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render for display. Whole numbers drop the decimal point.
    pub fn to_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

/// Display formatting for numbers: integers render without a decimal point.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Semantic tag for a committed cell, used by the grid layer for alignment
/// and format painting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
    Date,
    Currency,
    Percentage,
    #[default]
    Empty,
}

/// One grid cell.
///
/// When `formula` is present, `value` and `display` are the cached result of
/// the last evaluation and are rewritten by every recalculation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default)]
    pub data_type: DataType,
}

impl Cell {
    pub fn number(n: f64) -> Self {
        Self {
            value: CellValue::Number(n),
            formula: None,
            display: Some(format_number(n)),
            data_type: DataType::Number,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        Self {
            display: Some(s.clone()),
            value: CellValue::Text(s),
            formula: None,
            data_type: DataType::Text,
        }
    }

    /// Commit raw user input to a cell.
    ///
    /// Returns `None` for empty/whitespace-only input (the cell is removed
    /// from the sheet). A leading `=` makes a formula cell whose cached value
    /// is filled in by the next recalculation. Otherwise the input is typed
    /// as number, currency, percentage, date, or plain text.
    pub fn from_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('=') {
            return Some(Self {
                value: CellValue::Empty,
                formula: Some(trimmed.to_string()),
                display: None,
                data_type: DataType::Empty,
            });
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            return Some(Self::number(n));
        }

        // Currency: $12.50 or €12.50
        if let Some(rest) = trimmed.strip_prefix('$').or_else(|| trimmed.strip_prefix('€')) {
            if let Ok(n) = rest.trim().parse::<f64>() {
                return Some(Self {
                    value: CellValue::Number(n),
                    formula: None,
                    display: Some(trimmed.to_string()),
                    data_type: DataType::Currency,
                });
            }
        }

        // Percentage: 15% stores 15, tagged so the grid renders the % sign.
        if let Some(rest) = trimmed.strip_suffix('%') {
            if let Ok(n) = rest.trim().parse::<f64>() {
                return Some(Self {
                    value: CellValue::Number(n),
                    formula: None,
                    display: Some(trimmed.to_string()),
                    data_type: DataType::Percentage,
                });
            }
        }

        if looks_like_date(trimmed) {
            return Some(Self {
                display: Some(trimmed.to_string()),
                value: CellValue::Text(trimmed.to_string()),
                formula: None,
                data_type: DataType::Date,
            });
        }

        Some(Self::text(trimmed))
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// The string the grid should render for this cell.
    pub fn display_text(&self) -> String {
        match &self.display {
            Some(d) => d.clone(),
            None => self.value.to_display(),
        }
    }
}

/// Loose date shapes: 2024-01-31 or 1/31/2024.
fn looks_like_date(s: &str) -> bool {
    let iso_like = |parts: &[&str]| {
        parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    };
    let dashed: Vec<&str> = s.split('-').collect();
    if iso_like(&dashed) && dashed[0].len() == 4 {
        return true;
    }
    let slashed: Vec<&str> = s.split('/').collect();
    iso_like(&slashed)
}
