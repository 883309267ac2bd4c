//! Virtue Table -- Tabular cells, sheets, sources and the best-effort result cache.
//!
//! This crate is the boundary layer of the Virtue workspace. Everything the
//! normalization and indexing crates consume arrives as a [`Table`] read from
//! a [`TabularSource`], and everything they produce leaves as rows of
//! [`Cell`]s written to a [`TabularSink`]. Derived artifacts (alias tables,
//! mission indexes, parameter maps) are memoized through a [`KvCache`]
//! wrapped in a [`CacheLayer`] that never lets a cache failure escape.
//!
//! # Quick Start
//!
//! ```
//! use virtue_table::prelude::*;
//!
//! let mut book = MemoryWorkbook::new();
//! book.insert_sheet(
//!     "Ship_Parameters",
//!     vec![
//!         vec![Cell::from("Ship type"), Cell::from("Ship level")],
//!         vec![Cell::from("Henerprise"), Cell::from(7)],
//!     ],
//! );
//!
//! let table = book.read("Ship_Parameters").unwrap();
//! let level_col = table.column("ship level").unwrap();
//! assert_eq!(table.rows()[0][level_col].as_text(), "7");
//! ```

#![deny(unsafe_code)]

pub mod cache;
pub mod cell;
pub mod source;
pub mod table;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while reading, resolving or writing tabular data.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The named table does not exist in the source.
    #[error("table '{name}' not found")]
    NotFound { name: String },

    /// A logical column could not be resolved by its preferred name or any
    /// of its synonyms.
    #[error("column '{preferred}' for {logical} not found in '{table}' and no synonyms matched")]
    MissingColumn {
        table: String,
        logical: String,
        preferred: String,
    },

    /// A workbook document could not be decoded or encoded.
    #[error("failed to decode workbook: {details}")]
    Decode { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::cache::{CacheError, CacheLayer, KvCache, MemoryCache};
    pub use crate::cell::Cell;
    pub use crate::source::{MemoryWorkbook, TabularSink, TabularSource};
    pub use crate::table::{ColumnSpec, Table};
    pub use crate::TableError;
}
