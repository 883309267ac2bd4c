//! Tabular sources and sinks.
//!
//! The core only ever sees storage through two narrow traits:
//!
//! - [`TabularSource::read`] returns a [`Table`] snapshot, failing with
//!   [`TableError::NotFound`] if the sheet does not exist and returning an
//!   empty table when it exists but holds no rows.
//! - [`TabularSink::write`] replaces the entire content of a sheet.
//!
//! [`MemoryWorkbook`] implements both over an ordered map of sheets and can
//! be loaded from / saved to JSON, which is how the headless report binary
//! and the integration tests feed data into the engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cell::Cell;
use crate::table::Table;
use crate::TableError;

/// Read access to named sheets.
pub trait TabularSource {
    /// Snapshot the named sheet.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotFound`] if the sheet does not exist.
    fn read(&self, name: &str) -> Result<Table, TableError>;

    /// Returns `true` if the named sheet exists.
    fn contains(&self, name: &str) -> bool {
        self.read(name).is_ok()
    }
}

/// Write access to named sheets. A write replaces all prior content.
pub trait TabularSink {
    /// Overwrite the named sheet with `rows`, creating it if needed.
    fn write(&mut self, name: &str, rows: Vec<Vec<Cell>>) -> Result<(), TableError>;
}

// ---------------------------------------------------------------------------
// MemoryWorkbook
// ---------------------------------------------------------------------------

/// An in-memory workbook: sheet name -> grid of cells, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryWorkbook {
    sheets: IndexMap<String, Vec<Vec<Cell>>>,
}

impl MemoryWorkbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a workbook from a JSON object of `{ "Sheet": [[cell, ...], ...] }`.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        serde_json::from_str(json).map_err(|e| TableError::Decode {
            details: e.to_string(),
        })
    }

    /// Encode the workbook as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, TableError> {
        serde_json::to_string_pretty(self).map_err(|e| TableError::Decode {
            details: e.to_string(),
        })
    }

    /// Insert or replace a sheet.
    pub fn insert_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) {
        self.sheets.insert(name.into(), rows);
    }

    /// Remove a sheet, returning its rows.
    pub fn remove_sheet(&mut self, name: &str) -> Option<Vec<Vec<Cell>>> {
        self.sheets.shift_remove(name)
    }

    /// Borrow a sheet's raw grid.
    pub fn sheet(&self, name: &str) -> Option<&[Vec<Cell>]> {
        self.sheets.get(name).map(Vec::as_slice)
    }

    /// Sheet names in insertion order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }
}

impl TabularSource for MemoryWorkbook {
    fn read(&self, name: &str) -> Result<Table, TableError> {
        self.sheets
            .get(name)
            .map(|rows| Table::from_rows(name, rows.clone()))
            .ok_or_else(|| TableError::NotFound {
                name: name.to_owned(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }
}

impl TabularSink for MemoryWorkbook {
    fn write(&mut self, name: &str, rows: Vec<Vec<Cell>>) -> Result<(), TableError> {
        info!(sheet = %name, rows = rows.len(), "writing sheet");
        self.sheets.insert(name.to_owned(), rows);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
