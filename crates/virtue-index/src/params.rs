//! Active level per `(ship, duration)` pair.
//!
//! The ship-parameters sheet names, for each ship and duration, the level a
//! player currently flies. Projection uses it to pick one level bucket per
//! pair. Unlike the data sheet, the three columns here have no synonyms and
//! must all be present.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_keys::kind::KeyKind;
use virtue_keys::normalize::Normalizer;
use virtue_table::cell::Cell;
use virtue_table::table::{ColumnSpec, Table};

use crate::IndexError;

/// Header names of the ship-parameters sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParamColumns {
    pub ship_type: String,
    pub ship_duration_type: String,
    pub level: String,
}

impl Default for ParamColumns {
    fn default() -> Self {
        Self {
            ship_type: "Ship type".to_owned(),
            ship_duration_type: "Ship duration type".to_owned(),
            level: "Ship level".to_owned(),
        }
    }
}

impl ParamColumns {
    fn specs(&self) -> [ColumnSpec; 3] {
        [
            ColumnSpec::new("shipType", &self.ship_type),
            ColumnSpec::new("shipDurationType", &self.ship_duration_type),
            ColumnSpec::new("level", &self.level),
        ]
    }
}

/// One row of the ship-parameters sheet, level kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRow<'t> {
    pub ship_type: &'t Cell,
    pub ship_duration_type: &'t Cell,
    pub level: &'t Cell,
}

/// Read the typed rows of a ship-parameters table.
///
/// # Errors
///
/// Returns [`IndexError::Table`] if any of the three columns is missing.
pub fn param_rows<'t>(table: &'t Table, columns: &ParamColumns) -> Result<Vec<ParamRow<'t>>, IndexError> {
    let [ship, duration, level] = columns.specs();
    let (ship, duration, level) = (table.resolve(&ship)?, table.resolve(&duration)?, table.resolve(&level)?);
    Ok(table
        .rows()
        .iter()
        .map(|row| ParamRow {
            ship_type: Table::cell(row, ship),
            ship_duration_type: Table::cell(row, duration),
            level: Table::cell(row, level),
        })
        .collect())
}

/// Canonical `(ship, duration)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub ship_type: String,
    pub ship_duration_type: String,
}

impl PairKey {
    pub fn new(ship_type: impl Into<String>, ship_duration_type: impl Into<String>) -> Self {
        Self {
            ship_type: ship_type.into(),
            ship_duration_type: ship_duration_type.into(),
        }
    }
}

/// `(ship, duration) -> level`, later rows overwriting earlier ones.
///
/// Serialized as a list of `[pair, level]` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamLevelMap {
    #[serde(with = "crate::pairs")]
    levels: IndexMap<PairKey, Cell>,
}

impl ParamLevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a ship-parameters table.
    ///
    /// Rows whose ship or duration normalizes to nothing are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Table`] if any configured column is missing.
    pub fn build(table: &Table, columns: &ParamColumns, normalizer: &Normalizer) -> Result<Self, IndexError> {
        let mut map = Self::new();
        let mut skipped = 0usize;
        for row in param_rows(table, columns)? {
            let ship = normalizer.normalize(KeyKind::ShipType, row.ship_type);
            let duration = normalizer.normalize(KeyKind::ShipDurationType, row.ship_duration_type);
            match (ship, duration) {
                (Some(ship), Some(duration)) => map.insert(PairKey::new(ship, duration), row.level.clone()),
                _ => skipped += 1,
            }
        }
        debug!(table = table.name(), pairs = map.len(), skipped, "param level map built");
        Ok(map)
    }

    /// Set the level for a pair, replacing any earlier value.
    pub fn insert(&mut self, pair: PairKey, level: Cell) {
        self.levels.insert(pair, level);
    }

    /// The level cell configured for a pair, verbatim.
    pub fn level(&self, ship: &str, duration: &str) -> Option<&Cell> {
        self.levels.get(&PairKey::new(ship, duration))
    }

    /// The level key to project for a pair: the configured level as trimmed
    /// text, or `default_level` when the pair is absent or its level blank.
    pub fn active_level(&self, ship: &str, duration: &str, default_level: &str) -> String {
        self.level(ship, duration)
            .and_then(Cell::trimmed)
            .unwrap_or_else(|| default_level.to_owned())
    }

    /// Entries in first-inserted order.
    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Cell)> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_rows(
            "Ship_Parameters",
            vec![
                vec!["Ship type".into(), "Ship duration type".into(), "Ship level".into()],
                vec!["Henny".into(), "Epic".into(), 2.into()],
                vec!["BCR".into(), "Short".into(), "".into()],
                vec!["".into(), "Short".into(), 4.into()],
                vec!["Henny".into(), "epic".into(), 3.into()],
            ],
        )
    }

    #[test]
    fn later_rows_overwrite() {
        let map = ParamLevelMap::build(&table(), &ParamColumns::default(), &Normalizer::with_default_rules()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.level("HENNY", "EPIC"), Some(&Cell::Number(3.0)));
        assert_eq!(map.active_level("HENNY", "EPIC", "0"), "3");
    }

    #[test]
    fn blank_or_absent_level_uses_default() {
        let map = ParamLevelMap::build(&table(), &ParamColumns::default(), &Normalizer::with_default_rules()).unwrap();
        assert_eq!(map.active_level("BCR", "SHORT", "0"), "0");
        assert_eq!(map.active_level("VOYEGGER", "LONG", "0"), "0");
    }

    #[test]
    fn missing_column_fails_fast() {
        let t = Table::from_rows("p", vec![vec!["Ship type".into(), "Ship level".into()]]);
        assert!(ParamLevelMap::build(&t, &ParamColumns::default(), &Normalizer::with_default_rules()).is_err());
    }

    #[test]
    fn serializes_as_entry_list() {
        let mut map = ParamLevelMap::new();
        map.insert(PairKey::new("BCR", "SHORT"), Cell::from(2));
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"[[{"ship_type":"BCR","ship_duration_type":"SHORT"},2.0]]"#);
        let back: ParamLevelMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
