//! Virtue Index -- Canonical re-indexing of mission and artifact-drop tables.
//!
//! This crate turns flat, inconsistently labelled mission rows into lookups
//! keyed by the canonical 4-tuple `(ship type, duration, level, target
//! artifact)`, represented by [`FlightKey`](key::FlightKey).
//!
//! # Modules
//!
//! - [`key`]: [`FlightKey`](key::FlightKey) resolution from raw cells.
//! - [`mission`]: the nested [`MissionIndex`](mission::MissionIndex) of row
//!   references, built from a data sheet.
//! - [`params`]: the [`ParamLevelMap`](params::ParamLevelMap) selecting the
//!   active level per ship/duration pair.
//! - [`project`]: canonical-order projection of the index back into rows,
//!   with the no-match sentinel and column selection.
//! - [`pivot`]: the drop-count pivot into a wide table.
//! - [`drops`]: the artifacts-by-params index and the solver summary.
//! - [`diag`]: read-only diagnostics over the index and parameter map.
//! - [`ranking`]: best ships per fuel class from the totals sheet.

#![deny(unsafe_code)]

pub mod diag;
pub mod drops;
pub mod key;
pub mod mission;
pub mod params;
pub mod pivot;
pub mod project;
pub mod ranking;

mod pairs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building or projecting indexes.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A required table or column is missing.
    #[error(transparent)]
    Table(#[from] virtue_table::TableError),

    /// A column named in a projection does not exist in the result.
    #[error("column not found in output: {name}")]
    UnknownOutputColumn { name: String },

    /// An artifacts table has fewer rows than its header position requires.
    #[error("artifacts table '{table}' is empty or missing header rows (has {rows} rows, header expected at row {header_row})")]
    MissingHeaderRows {
        table: String,
        rows: usize,
        header_row: usize,
    },

    /// An artifacts table header has no artifact columns after the key columns.
    #[error("artifacts table '{table}' header row is missing expected artifact columns")]
    MissingArtifactColumns { table: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::diag::{
        known_ship_keys, levels_for_pair, missing_aliases, param_index_coverage, CoverageReport,
        LevelLookup, LevelMismatch, MissingAliases, PairMismatch, PairMismatchReason,
    };
    pub use crate::drops::{ArtifactDropIndex, DropMap, SolverColumns, SolverSummary};
    pub use crate::key::{FlightKey, SkipReason};
    pub use crate::mission::{BuildStats, MissionColumns, MissionIndex, MissionRow};
    pub use crate::params::{PairKey, ParamColumns, ParamLevelMap};
    pub use crate::pivot::{HeaderLayout, PivotKey, PivotSpec, ValueKey, WideTable};
    pub use crate::project::{ColumnSelection, ProjectOptions, Projection};
    pub use crate::ranking::{
        FuelClass, RankedShip, RankingSpec, SelectionColumns, ShipRanking, ShipSelection, TotalsColumns,
    };
    pub use crate::IndexError;
}
