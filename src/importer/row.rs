// ==========================================
// Roster import - sheet rows and value coercion
// ==========================================
// Raw cells arrive untyped. The three coercions below are the
// only way converters read them, and none of them can fail:
// absent / empty / unrepresentable cells yield the caller's default.
// ==========================================

use std::collections::HashMap;
use std::fmt;

/// Tokens read as `true` by `coerce_bool` (compared lowercase)
const TRUTHY: [&str; 5] = ["1", "true", "si", "sí", "yes"];

// ==========================================
// CellValue
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Textual form used by string coercion; None when the cell carries nothing usable
    fn as_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f)?,
            CellValue::Bool(b) => b.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Integral floats print without a fractional part (ids typed as numbers)
fn format_float(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(value.to_string())
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.2e18 {
        Some(value as i64)
    } else {
        None
    }
}

// ==========================================
// SheetRow
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// Spreadsheet row number (header is row 1)
    pub row_number: usize,
    cells: HashMap<String, CellValue>,
}

impl SheetRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Column names present in this row, in no particular order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// True when no cell carries a usable value
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|cell| cell.as_text().is_none())
    }

    /// Trimmed text; numbers are stringified
    pub fn coerce_string(&self, column: &str, default: &str) -> String {
        self.cells
            .get(column)
            .and_then(CellValue::as_text)
            .unwrap_or_else(|| default.to_string())
    }

    /// Like `coerce_string` with an empty default, mapped to None
    pub fn optional_string(&self, column: &str) -> Option<String> {
        self.cells.get(column).and_then(CellValue::as_text)
    }

    pub fn coerce_int(&self, column: &str, default: i64) -> i64 {
        match self.cells.get(column) {
            Some(CellValue::Int(i)) => *i,
            Some(CellValue::Float(f)) => integral(*f).unwrap_or(default),
            Some(CellValue::Text(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
                    .unwrap_or(default)
            }
            _ => default,
        }
    }

    pub fn coerce_bool(&self, column: &str, default: bool) -> bool {
        match self.cells.get(column).and_then(CellValue::as_text) {
            Some(text) => TRUTHY.contains(&text.to_lowercase().as_str()),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SheetRow {
        SheetRow::new(2)
            .with_cell("ci", 4_567_890.0)
            .with_cell("name", "  Ana Quispe ")
            .with_cell("blank", "   ")
            .with_cell("empty", CellValue::Empty)
            .with_cell("nan", f64::NAN)
            .with_cell("frac", 2.5)
            .with_cell("district", " 7 ")
            .with_cell("district_float", "3.0")
            .with_cell("urban_si", "Sí")
            .with_cell("urban_yes", "YES")
            .with_cell("urban_no", "no")
            .with_cell("urban_one", 1_i64)
            .with_cell("urban_bool", true)
    }

    #[test]
    fn test_coerce_string_defaults() {
        let row = row();
        assert_eq!(row.coerce_string("missing", "x"), "x");
        assert_eq!(row.coerce_string("blank", "x"), "x");
        assert_eq!(row.coerce_string("empty", ""), "");
        assert_eq!(row.coerce_string("nan", "d"), "d");
        assert_eq!(row.optional_string("blank"), None);
    }

    #[test]
    fn test_coerce_string_numbers_and_trim() {
        let row = row();
        assert_eq!(row.coerce_string("ci", ""), "4567890");
        assert_eq!(row.coerce_string("frac", ""), "2.5");
        assert_eq!(row.coerce_string("name", ""), "Ana Quispe");
    }

    #[test]
    fn test_coerce_int() {
        let row = row();
        assert_eq!(row.coerce_int("district", 0), 7);
        assert_eq!(row.coerce_int("district_float", 0), 3);
        assert_eq!(row.coerce_int("ci", 0), 4_567_890);
        assert_eq!(row.coerce_int("frac", -1), -1);
        assert_eq!(row.coerce_int("name", -1), -1);
        assert_eq!(row.coerce_int("missing", 9), 9);
        assert_eq!(row.coerce_int("nan", 0), 0);
    }

    #[test]
    fn test_coerce_bool() {
        let row = row();
        assert!(row.coerce_bool("urban_si", false));
        assert!(row.coerce_bool("urban_yes", false));
        assert!(row.coerce_bool("urban_one", false));
        assert!(row.coerce_bool("urban_bool", false));
        assert!(!row.coerce_bool("urban_no", true));
        assert!(row.coerce_bool("missing", true));
        assert!(!row.coerce_bool("blank", false));
    }

    #[test]
    fn test_blank_row_detection() {
        let blank = SheetRow::new(3)
            .with_cell("a", "  ")
            .with_cell("b", CellValue::Empty);
        assert!(blank.is_blank());
        assert!(!row().is_blank());
    }
}
