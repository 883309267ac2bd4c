//! The nested mission index.
//!
//! [`MissionIndex`] maps `ship -> duration -> level -> target` to the list of
//! 1-based sheet row numbers (header is row 1) that carry that key. The
//! source [`Table`] is kept alongside so a projection can re-fetch the exact
//! rows. Rows that cannot produce a [`FlightKey`] are skipped and counted in
//! [`BuildStats`].
//!
//! # Example
//!
//! ```
//! use virtue_index::mission::{MissionColumns, MissionIndex};
//! use virtue_keys::normalize::Normalizer;
//! use virtue_table::prelude::*;
//!
//! let table = Table::from_rows("MissionDataRaw", vec![
//!     vec!["Ship type".into(), "Ship duration type".into(), "level".into(), "target".into()],
//!     vec!["BCR".into(), "Short".into(), 2.into(), "Puzzle cube".into()],
//! ]);
//! let index = MissionIndex::build(&table, &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
//! assert_eq!(index.rows_for("BCR", "SHORT", "2", "PUZZLE_CUBE"), &[2]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_keys::normalize::Normalizer;
use virtue_table::cell::Cell;
use virtue_table::table::{ColumnSpec, Table};

use crate::key::{FlightKey, SkipReason};
use crate::IndexError;

/// `target -> row numbers`
pub type TargetMap = IndexMap<String, Vec<usize>>;
/// `level -> target -> row numbers`
pub type LevelMap = IndexMap<String, TargetMap>;
/// `duration -> level -> target -> row numbers`
pub type DurationMap = IndexMap<String, LevelMap>;

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

/// Preferred header names for the four key columns of a mission data sheet.
///
/// Each logical column also falls back to a fixed synonym list, tried in
/// order after the preferred name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MissionColumns {
    pub ship_type: String,
    pub ship_duration_type: String,
    pub target_artifact: String,
    pub level: String,
}

impl Default for MissionColumns {
    fn default() -> Self {
        Self {
            ship_type: "shipType".to_owned(),
            ship_duration_type: "shipDurationType".to_owned(),
            target_artifact: "targetArtifact".to_owned(),
            level: "level".to_owned(),
        }
    }
}

impl MissionColumns {
    /// Column specs in `[ship, duration, target, level]` order.
    pub fn specs(&self) -> [ColumnSpec; 4] {
        [
            ColumnSpec::new("shipType", &self.ship_type)
                .with_synonyms(["Ship type", "Shiptype", "ship", "ship_name"]),
            ColumnSpec::new("shipDurationType", &self.ship_duration_type).with_synonyms([
                "Ship duration type",
                "durationtype",
                "type",
                "missiontype",
                "duration",
            ]),
            ColumnSpec::new("targetArtifact", &self.target_artifact)
                .with_synonyms(["Target artifact", "target"]),
            ColumnSpec::new("missionLevel", &self.level)
                .with_synonyms(["Mission level", "level", "lvl"]),
        ]
    }
}

/// Resolved column positions for one mission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionSchema {
    pub ship_type: usize,
    pub ship_duration_type: usize,
    pub target_artifact: usize,
    pub level: usize,
}

impl MissionSchema {
    /// Resolve every key column of `table`.
    ///
    /// # Errors
    ///
    /// Fails with the first logical column that has no matching header.
    pub fn resolve(table: &Table, columns: &MissionColumns) -> Result<Self, IndexError> {
        let [ship, duration, target, level] = columns.specs();
        Ok(Self {
            ship_type: table.resolve(&ship)?,
            ship_duration_type: table.resolve(&duration)?,
            target_artifact: table.resolve(&target)?,
            level: table.resolve(&level)?,
        })
    }

    /// Typed view over every data row of `table`.
    pub fn rows<'t>(self, table: &'t Table) -> impl Iterator<Item = MissionRow<'t>> + 't {
        table.rows().iter().enumerate().map(move |(i, row)| MissionRow {
            row_number: i + 2,
            ship_type: Table::cell(row, self.ship_type),
            ship_duration_type: Table::cell(row, self.ship_duration_type),
            level: Table::cell(row, self.level),
            target_artifact: Table::cell(row, self.target_artifact),
        })
    }
}

/// The key cells of one data row, borrowed from the source table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionRow<'t> {
    /// 1-based sheet row number (the header is row 1).
    pub row_number: usize,
    pub ship_type: &'t Cell,
    pub ship_duration_type: &'t Cell,
    pub level: &'t Cell,
    pub target_artifact: &'t Cell,
}

impl MissionRow<'_> {
    /// Normalize this row into a [`FlightKey`].
    pub fn key(&self, normalizer: &Normalizer) -> Result<FlightKey, SkipReason> {
        FlightKey::resolve(
            normalizer,
            self.ship_type,
            self.ship_duration_type,
            self.level,
            self.target_artifact,
        )
    }
}

// ---------------------------------------------------------------------------
// BuildStats
// ---------------------------------------------------------------------------

/// Row counts gathered during an index build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildStats {
    pub indexed: usize,
    pub unmapped_ship: usize,
    pub unmapped_duration: usize,
    pub missing_target: usize,
    pub missing_level: usize,
}

impl BuildStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::UnmappedShip => self.unmapped_ship += 1,
            SkipReason::UnmappedDuration => self.unmapped_duration += 1,
            SkipReason::MissingTarget => self.missing_target += 1,
            SkipReason::MissingLevel => self.missing_level += 1,
        }
    }

    /// Total rows skipped for any reason.
    pub fn skipped(&self) -> usize {
        self.unmapped_ship + self.unmapped_duration + self.missing_target + self.missing_level
    }
}

// ---------------------------------------------------------------------------
// MissionIndex
// ---------------------------------------------------------------------------

/// Row references grouped by canonical flight key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionIndex {
    tree: IndexMap<String, DurationMap>,
    source: Table,
    stats: BuildStats,
}

impl MissionIndex {
    /// An index with no entries over `source`.
    pub fn new(source: Table) -> Self {
        Self {
            tree: IndexMap::new(),
            source,
            stats: BuildStats::default(),
        }
    }

    /// Index every data row of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Table`] if a key column cannot be resolved.
    pub fn build(table: &Table, columns: &MissionColumns, normalizer: &Normalizer) -> Result<Self, IndexError> {
        let schema = MissionSchema::resolve(table, columns)?;
        let mut index = Self::new(table.clone());
        for row in schema.rows(table) {
            match row.key(normalizer) {
                Ok(key) => index.insert(key, row.row_number),
                Err(reason) => index.stats.record_skip(reason),
            }
        }
        debug!(
            table = table.name(),
            indexed = index.stats.indexed,
            skipped = index.stats.skipped(),
            ships = index.tree.len(),
            "mission index built"
        );
        Ok(index)
    }

    /// Append a row reference under `key`. Duplicates are kept.
    pub fn insert(&mut self, key: FlightKey, row_number: usize) {
        self.tree
            .entry(key.ship_type)
            .or_default()
            .entry(key.ship_duration_type)
            .or_default()
            .entry(key.level)
            .or_default()
            .entry(key.target_artifact)
            .or_default()
            .push(row_number);
        self.stats.indexed += 1;
    }

    /// Ship keys in first-seen order.
    pub fn ships(&self) -> impl Iterator<Item = &str> {
        self.tree.keys().map(String::as_str)
    }

    /// Durations recorded for `ship`, or `None` if the ship is unknown.
    pub fn durations(&self, ship: &str) -> Option<&DurationMap> {
        self.tree.get(ship)
    }

    /// Level buckets recorded for `(ship, duration)`.
    pub fn levels(&self, ship: &str, duration: &str) -> Option<&LevelMap> {
        self.tree.get(ship)?.get(duration)
    }

    /// Row numbers for a full key; empty if any branch is absent.
    pub fn rows_for(&self, ship: &str, duration: &str, level: &str, target: &str) -> &[usize] {
        self.levels(ship, duration)
            .and_then(|levels| levels.get(level))
            .and_then(|targets| targets.get(target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The source snapshot the row numbers refer to.
    pub fn source(&self) -> &Table {
        &self.source
    }

    /// Build counters.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Total number of indexed row references.
    pub fn len(&self) -> usize {
        self.stats.indexed
    }

    /// Returns `true` if no row was indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    fn sample() -> Table {
        Table::from_rows(
            "MissionDataRaw",
            vec![
                text(&["shipType", "shipDurationType", "level", "targetArtifact", "drops"]),
                text(&["Henny", "Epic", "8", "Book of Basan", "3"]),
                text(&["BCR", "short", "2", "Puzzle cube", "1"]),
                text(&["", "short", "2", "Puzzle cube", "1"]),
                text(&["BCR", "short", "", "Puzzle cube", "1"]),
                text(&["BCR", "short", "2", "", "1"]),
                text(&["BCR", "short", "2", "Puzzle cube", "4"]),
            ],
        )
    }

    #[test]
    fn row_numbers_are_one_based_with_header_offset() {
        let index = MissionIndex::build(&sample(), &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
        assert_eq!(index.rows_for("BCR", "SHORT", "2", "PUZZLE_CUBE"), &[3, 7]);
        assert_eq!(index.rows_for("HENNY", "EPIC", "8", "BOOK_OF_BASAN"), &[2]);
    }

    #[test]
    fn skipped_rows_are_counted_by_reason() {
        let index = MissionIndex::build(&sample(), &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
        let stats = index.stats();
        assert_eq!(stats.indexed, 3);
        assert_eq!(stats.unmapped_ship, 1);
        assert_eq!(stats.missing_level, 1);
        assert_eq!(stats.missing_target, 1);
        assert_eq!(stats.skipped(), 3);
    }

    #[test]
    fn absent_branch_yields_no_rows() {
        let index = MissionIndex::build(&sample(), &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
        assert!(index.rows_for("VOYEGGER", "SHORT", "2", "PUZZLE_CUBE").is_empty());
        assert!(index.rows_for("BCR", "SHORT", "9", "PUZZLE_CUBE").is_empty());
        assert!(index.levels("BCR", "EPIC").is_none());
    }

    #[test]
    fn synonyms_resolve_when_preferred_missing() {
        let table = Table::from_rows(
            "raw",
            vec![
                text(&["ship_name", "missiontype", "lvl", "target"]),
                text(&["BCR", "Long", "1", "Gold meteorite"]),
            ],
        );
        let index = MissionIndex::build(&table, &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
        assert_eq!(index.rows_for("BCR", "LONG", "1", "GOLD_METEORITE"), &[2]);
    }

    #[test]
    fn missing_column_names_logical_column() {
        let table = Table::from_rows("raw", vec![text(&["ship", "duration", "level"])]);
        let err = MissionIndex::build(&table, &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap_err();
        assert!(err.to_string().contains("targetArtifact"), "{err}");
    }

    #[test]
    fn header_only_table_builds_empty_index() {
        let table = Table::from_rows("raw", vec![text(&["ship", "duration", "level", "target"])]);
        let index = MissionIndex::build(&table, &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn serde_round_trip_preserves_order() {
        let index = MissionIndex::build(&sample(), &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
        let json = serde_json::to_string(&index).unwrap();
        let back: MissionIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
        assert_eq!(back.ships().collect::<Vec<_>>(), vec!["HENNY", "BCR"]);
    }
}
