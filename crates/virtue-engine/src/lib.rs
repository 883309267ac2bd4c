//! Virtue Engine -- Cached facade over normalization, indexing and BOM netting.
//!
//! This crate wires [`virtue_keys`], [`virtue_index`] and [`virtue_bom`] to a
//! workbook implementing [`TabularSource`](virtue_table::source::TabularSource)
//! and [`TabularSink`](virtue_table::source::TabularSink). Derived artifacts
//! (alias table, mission index, param level map, artifact drop index) are
//! stored in an injected [`KvCache`](virtue_table::cache::KvCache) under
//! config-fingerprinted keys.
//!
//! # Quick Start
//!
//! ```
//! use virtue_engine::prelude::*;
//!
//! let mut book = MemoryWorkbook::new();
//! book.insert_sheet(
//!     "AllArtifactData",
//!     vec![
//!         vec!["shipType".into(), "shipDurationType".into(), "level".into(), "targetArtifact".into()],
//!         vec!["Henerprise".into(), "Epic".into(), 8.into(), "Book of Basan".into()],
//!     ],
//! );
//! book.insert_sheet("Ship_Parameters", vec![vec![
//!     "Ship type".into(), "Ship duration type".into(), "Ship level".into(),
//! ]]);
//!
//! let engine = Engine::new(book, CacheLayer::disabled(), EngineConfig::default());
//! let index = engine.build_index().unwrap();
//! assert_eq!(index.rows_for("HENERPRISE", "EPIC", "8", "BOOK_OF_BASAN"), &[2]);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod engine;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use virtue_bom;
pub use virtue_index;
pub use virtue_keys;
pub use virtue_table;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by [`Engine`](engine::Engine) operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Table(#[from] virtue_table::TableError),

    #[error(transparent)]
    Keys(#[from] virtue_keys::KeyError),

    #[error(transparent)]
    Index(#[from] virtue_index::IndexError),

    #[error(transparent)]
    Bom(#[from] virtue_bom::BomError),

    /// The engine configuration could not be read or parsed.
    #[error("invalid engine config: {details}")]
    Config { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use virtue_bom::prelude::*;
    pub use virtue_index::prelude::*;
    pub use virtue_keys::prelude::*;
    pub use virtue_table::prelude::*;

    pub use crate::config::{CacheTtls, EngineConfig, SheetNames};
    pub use crate::engine::{CacheScope, Engine, HeaderReport, ParamLookup, SampleReport};
    pub use crate::EngineError;
}
