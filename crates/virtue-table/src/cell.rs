//! Heterogeneous scalar cells.
//!
//! A [`Cell`] is the unit of interchange at every tabular boundary. Sheets
//! mix numbers, text and blanks freely, so the core never assumes a column
//! is homogeneous: it asks a cell for its text form ([`Cell::as_text`]) when
//! building keys and for its numeric form ([`Cell::as_number`]) when summing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar value in a table.
///
/// Serializes untagged, so a JSON row `[null, true, 7, "Short"]` maps to
/// `[Empty, Bool(true), Number(7.0), Text("Short")]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// No value. Serialized as `null`.
    #[default]
    Empty,
    /// A checkbox-style boolean.
    Bool(bool),
    /// Any numeric value. Integers are stored as whole `f64`s.
    Number(f64),
    /// Free text, stored verbatim (untrimmed).
    Text(String),
}

impl Cell {
    /// Returns `true` for [`Cell::Empty`] and for text that is empty after
    /// trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Bool(_) | Cell::Number(_) => false,
        }
    }

    /// Stringify the cell the way a spreadsheet displays it.
    ///
    /// Whole numbers render without a fractional part (`7.0` -> `"7"`), so a
    /// level stored as a number and a level stored as text produce the same
    /// key. Empty cells render as `""`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Trimmed text form, or `None` when the cell is blank.
    pub fn trimmed(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.as_text().trim().to_owned())
    }

    /// Numeric view of the cell.
    ///
    /// Numbers are returned as-is; text is parsed after trimming. Blanks,
    /// booleans and unparseable or non-finite text yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(Cell::from(7).as_text(), "7");
        assert_eq!(Cell::Number(0.25).as_text(), "0.25");
        assert_eq!(Cell::Number(-3.0).as_text(), "-3");
    }

    #[test]
    fn numeric_text_parses_after_trim() {
        assert_eq!(Cell::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Cell::from("twelve").as_number(), None);
        assert_eq!(Cell::from("NaN").as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Bool(true).as_number(), None);
    }

    #[test]
    fn blank_detection() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::from("   ").is_blank());
        assert!(!Cell::from(0).is_blank());
        assert!(!Cell::Bool(false).is_blank());
        assert_eq!(Cell::from("  Short ").trimmed().as_deref(), Some("Short"));
        assert_eq!(Cell::from(" ").trimmed(), None);
    }

    #[test]
    fn untagged_json_round_trip() {
        let row: Vec<Cell> = serde_json::from_str(r#"[null, true, 7, "Short"]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Cell::Empty,
                Cell::Bool(true),
                Cell::Number(7.0),
                Cell::from("Short"),
            ]
        );
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,true,7.0,"Short"]"#);
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Cell::from(None::<&str>), Cell::Empty);
        assert_eq!(Cell::from(Some("x")), Cell::from("x"));
    }
}
