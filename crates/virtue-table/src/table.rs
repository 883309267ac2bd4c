//! Sheet snapshots and flexible column resolution.
//!
//! A [`Table`] is an immutable snapshot of one named sheet: the full grid
//! (`all`, header row included) plus a lowercase header lookup. Data rows are
//! everything after the first row.
//!
//! Column lookup happens once per build through [`ColumnSpec`]: a logical
//! column (e.g. `shipType`) names a preferred header and an ordered synonym
//! list. [`Table::resolve`] tries the preferred header first, then each
//! synonym, all case-insensitively, and fails with
//! [`TableError::MissingColumn`] when nothing matches. Callers resolve their
//! schema up front and then read rows by index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::TableError;

static EMPTY: Cell = Cell::Empty;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An immutable snapshot of a named sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    /// Every row including the header row.
    all: Vec<Vec<Cell>>,
    /// Trimmed, lowercased header text -> column index. Later duplicates win.
    header: HashMap<String, usize>,
}

impl Table {
    /// Build a table from a full grid whose first row is the header.
    pub fn from_rows(name: impl Into<String>, all: Vec<Vec<Cell>>) -> Self {
        let mut header = HashMap::new();
        if let Some(first) = all.first() {
            for (i, cell) in first.iter().enumerate() {
                header.insert(cell.as_text().trim().to_lowercase(), i);
            }
        }
        Self {
            name: name.into(),
            all,
            header,
        }
    }

    /// An existing table with no content at all.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::from_rows(name, Vec::new())
    }

    /// The sheet name this snapshot was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase header name -> column index.
    pub fn header_map(&self) -> &HashMap<String, usize> {
        &self.header
    }

    /// The raw header row, if the table has any rows.
    pub fn header_row(&self) -> Option<&[Cell]> {
        self.all.first().map(Vec::as_slice)
    }

    /// Data rows (everything after the header row).
    pub fn rows(&self) -> &[Vec<Cell>] {
        self.all.get(1..).unwrap_or(&[])
    }

    /// The full grid, header row included.
    pub fn all(&self) -> &[Vec<Cell>] {
        &self.all
    }

    /// Fetch a row by its 1-based sheet row number (row 1 is the header).
    pub fn sheet_row(&self, row_number: usize) -> Option<&[Cell]> {
        row_number
            .checked_sub(1)
            .and_then(|i| self.all.get(i))
            .map(Vec::as_slice)
    }

    /// Returns `true` when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Case-insensitive header lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.get(&name.trim().to_lowercase()).copied()
    }

    /// Cell at `(row, col)` of a data row slice, treating ragged rows as
    /// blank-padded.
    pub fn cell(row: &[Cell], col: usize) -> &Cell {
        row.get(col).unwrap_or(&EMPTY)
    }

    /// Resolve a logical column to an index.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] if neither the preferred header
    /// nor any synonym exists.
    pub fn resolve(&self, spec: &ColumnSpec) -> Result<usize, TableError> {
        std::iter::once(&spec.preferred)
            .chain(spec.synonyms.iter())
            .find_map(|name| self.column(name))
            .ok_or_else(|| TableError::MissingColumn {
                table: self.name.clone(),
                logical: spec.logical.clone(),
                preferred: spec.preferred.clone(),
            })
    }
}

// ---------------------------------------------------------------------------
// ColumnSpec
// ---------------------------------------------------------------------------

/// A logical column with its preferred header and fallback synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Logical name used in error messages (e.g. `"shipType"`).
    pub logical: String,
    /// Header tried first.
    pub preferred: String,
    /// Headers tried in order when the preferred one is absent.
    pub synonyms: Vec<String>,
}

impl ColumnSpec {
    /// A column with no synonyms; it must be present under `preferred`.
    pub fn new(logical: impl Into<String>, preferred: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            preferred: preferred.into(),
            synonyms: Vec::new(),
        }
    }

    /// Attach an ordered synonym list.
    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
