//! Drop-count pivot into a wide table.
//!
//! Raw mission rows carry one drop observation each: a ship/duration/level/
//! target key, an artifact type/tier/rarity, and a count. [`WideTable`] sums
//! the count per key into one column per artifact variant, zero-filling
//! every cell no row touched.
//!
//! Keys are tuple-like structs over the column values; the `" | "` join is
//! only their display form.
//!
//! # Column order
//!
//! Value-key columns whose first segment is a canonical artifact come first,
//! by canonical position (ties by display key); all others follow sorted by
//! display key. Manually listed undroppable variants are always present.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_keys::kind::{CanonicalOrders, KeyKind};
use virtue_table::cell::Cell;
use virtue_table::table::{ColumnSpec, Table};

use crate::IndexError;

const SEPARATOR: &str = " | ";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Row key of a wide table: the values of the key columns, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PivotKey(pub Vec<String>);

/// Column key of a wide table: the values of the value columns, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueKey(pub Vec<String>);

impl ValueKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Parse a `" | "`-joined display key.
    pub fn parse(display: &str) -> Self {
        Self(display.split('|').map(|s| s.trim().to_owned()).collect())
    }

    /// The first segment, which names the artifact.
    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Segment `i`, or `""` when the key is shorter.
    pub fn segment(&self, i: usize) -> &str {
        self.0.get(i).map_or("", String::as_str)
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(SEPARATOR))
    }
}

impl fmt::Display for PivotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(SEPARATOR))
    }
}

/// Artifact variants that never appear in drop data but must still get a
/// column.
pub fn default_undroppables() -> Vec<ValueKey> {
    let mut keys = Vec::new();
    for rarity in ["COMMON", "EPIC", "LEGENDARY"] {
        keys.push(ValueKey::new(["BOOK_OF_BASAN", "3", rarity]));
    }
    for rarity in ["COMMON", "RARE", "EPIC", "LEGENDARY"] {
        keys.push(ValueKey::new(["TACHYON_DEFLECTOR", "3", rarity]));
    }
    for stone in ["CLARITY_STONE", "DILITHIUM_STONE", "PROPHECY_STONE"] {
        keys.push(ValueKey::new([stone, "2", "COMMON"]));
    }
    keys
}

// ---------------------------------------------------------------------------
// PivotSpec
// ---------------------------------------------------------------------------

/// Which columns form the row key, the column key and the measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PivotSpec {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub measure_column: String,
    /// Value keys injected even when unobserved.
    pub undroppables: Vec<ValueKey>,
}

impl Default for PivotSpec {
    fn default() -> Self {
        Self {
            key_columns: ["Ship type", "Ship duration type", "Ship level", "Target artifact"]
                .map(str::to_owned)
                .to_vec(),
            value_columns: ["Artifact type", "Artifact tier", "Artifact rarity"].map(str::to_owned).to_vec(),
            measure_column: "Total drops".to_owned(),
            undroppables: default_undroppables(),
        }
    }
}

/// How [`WideTable::to_rows`] renders the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderLayout {
    /// One header row: key column names, then value-key display names.
    #[default]
    Single,
    /// One row per value column holding that segment of every value key
    /// (key column names on the first, blanks below), then the single row.
    Stacked,
}

// ---------------------------------------------------------------------------
// WideTable
// ---------------------------------------------------------------------------

/// Summed measure per `(pivot key, value key)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    key_columns: Vec<String>,
    value_columns: Vec<String>,
    value_keys: Vec<ValueKey>,
    cells: IndexMap<PivotKey, HashMap<ValueKey, f64>>,
}

impl WideTable {
    /// Sum `spec.measure_column` over every data row of `table`.
    ///
    /// Non-numeric or missing measures count as zero.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Table`] if any named column is missing.
    pub fn aggregate(table: &Table, spec: &PivotSpec, orders: &CanonicalOrders) -> Result<Self, IndexError> {
        let resolve = |name: &String| table.resolve(&ColumnSpec::new(name, name));
        let key_cols = spec.key_columns.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
        let value_cols = spec.value_columns.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
        let measure_col = resolve(&spec.measure_column)?;

        let mut cells: IndexMap<PivotKey, HashMap<ValueKey, f64>> = IndexMap::new();
        let mut observed: IndexSet<ValueKey> = IndexSet::new();
        for row in table.rows() {
            let pivot = PivotKey(parts(row, &key_cols));
            let value = ValueKey(parts(row, &value_cols));
            let measure = Table::cell(row, measure_col).as_number().unwrap_or(0.0);
            if !observed.contains(&value) {
                observed.insert(value.clone());
            }
            *cells.entry(pivot).or_default().entry(value).or_insert(0.0) += measure;
        }

        observed.extend(spec.undroppables.iter().cloned());
        let mut value_keys: Vec<ValueKey> = observed.into_iter().collect();
        sort_value_keys(&mut value_keys, orders);

        debug!(
            table = table.name(),
            rows = cells.len(),
            columns = value_keys.len(),
            "pivot aggregated"
        );
        Ok(Self {
            key_columns: spec.key_columns.clone(),
            value_columns: spec.value_columns.clone(),
            value_keys,
            cells,
        })
    }

    /// Column keys in output order.
    pub fn value_keys(&self) -> &[ValueKey] {
        &self.value_keys
    }

    /// Row keys in first-seen order.
    pub fn pivot_keys(&self) -> impl Iterator<Item = &PivotKey> {
        self.cells.keys()
    }

    /// Summed measure, zero when no row contributed.
    pub fn get(&self, pivot: &PivotKey, value: &ValueKey) -> f64 {
        self.cells
            .get(pivot)
            .and_then(|row| row.get(value))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of row keys.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Render as sheet rows.
    pub fn to_rows(&self, layout: HeaderLayout) -> Vec<Vec<Cell>> {
        let mut out = Vec::with_capacity(self.cells.len() + self.value_columns.len() + 1);
        let key_header: Vec<Cell> = self.key_columns.iter().map(|c| Cell::from(c.as_str())).collect();

        if layout == HeaderLayout::Stacked {
            for i in 0..self.value_columns.len() {
                let mut row = if i == 0 {
                    key_header.clone()
                } else {
                    vec![Cell::from(""); self.key_columns.len()]
                };
                row.extend(self.value_keys.iter().map(|vk| Cell::from(vk.segment(i))));
                out.push(row);
            }
        }

        let mut header = key_header;
        header.extend(self.value_keys.iter().map(|vk| Cell::Text(vk.to_string())));
        out.push(header);

        for (pivot, values) in &self.cells {
            let mut row: Vec<Cell> = pivot.0.iter().map(|p| Cell::from(p.as_str())).collect();
            row.extend(
                self.value_keys
                    .iter()
                    .map(|vk| Cell::Number(values.get(vk).copied().unwrap_or(0.0))),
            );
            out.push(row);
        }
        out
    }
}

fn parts(row: &[Cell], cols: &[usize]) -> Vec<String> {
    cols.iter().map(|&c| Table::cell(row, c).as_text().trim().to_owned()).collect()
}

fn sort_value_keys(keys: &mut [ValueKey], orders: &CanonicalOrders) {
    let position = |k: &ValueKey| k.head().and_then(|h| orders.position(KeyKind::TargetArtifact, h));
    keys.sort_by(|a, b| {
        let by_display = || a.to_string().cmp(&b.to_string());
        match (position(a), position(b)) {
            (Some(pa), Some(pb)) => pa.cmp(&pb).then_with(by_display),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => by_display(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drops() -> Table {
        let row = |s: &str, d: &str, l: &str, t: &str, a: &str, tier: &str, r: &str, n: f64| -> Vec<Cell> {
            vec![s.into(), d.into(), l.into(), t.into(), a.into(), tier.into(), r.into(), n.into()]
        };
        Table::from_rows(
            "MissionDataRaw",
            vec![
                vec![
                    "Ship type".into(),
                    "Ship duration type".into(),
                    "Ship level".into(),
                    "Target artifact".into(),
                    "Artifact type".into(),
                    "Artifact tier".into(),
                    "Artifact rarity".into(),
                    "Total drops".into(),
                ],
                row("BCR", "SHORT", "0", "UNKNOWN", "ZZZ_THING", "1", "COMMON", 1.0),
                row("BCR", "SHORT", "0", "UNKNOWN", "PUZZLE_CUBE", "1", "COMMON", 4.0),
                row("BCR", "SHORT", "0", "UNKNOWN", "GOLD_METEORITE", "1", "COMMON", 2.0),
                row("BCR", "SHORT", "0", "UNKNOWN", "PUZZLE_CUBE", "1", "COMMON", 3.0),
                row("BCR", "LONG", "1", "UNKNOWN", "GOLD_METEORITE", "2", "COMMON", 5.0),
            ],
        )
    }

    fn spec_without_undroppables() -> PivotSpec {
        PivotSpec {
            undroppables: Vec::new(),
            ..PivotSpec::default()
        }
    }

    #[test]
    fn sums_measure_per_key() {
        let wide = WideTable::aggregate(&drops(), &spec_without_undroppables(), &CanonicalOrders::default()).unwrap();
        let short = PivotKey(vec!["BCR".into(), "SHORT".into(), "0".into(), "UNKNOWN".into()]);
        assert_eq!(wide.get(&short, &ValueKey::parse("PUZZLE_CUBE | 1 | COMMON")), 7.0);
        assert_eq!(wide.len(), 2);
    }

    #[test]
    fn canonical_artifacts_first_then_display_order() {
        let wide = WideTable::aggregate(&drops(), &spec_without_undroppables(), &CanonicalOrders::default()).unwrap();
        let names: Vec<String> = wide.value_keys().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "GOLD_METEORITE | 1 | COMMON",
                "GOLD_METEORITE | 2 | COMMON",
                "PUZZLE_CUBE | 1 | COMMON",
                "ZZZ_THING | 1 | COMMON",
            ]
        );
    }

    #[test]
    fn untouched_cells_are_zero() {
        let wide = WideTable::aggregate(&drops(), &spec_without_undroppables(), &CanonicalOrders::default()).unwrap();
        let rows = wide.to_rows(HeaderLayout::Single);
        let long = &rows[2];
        assert_eq!(long[..4], [Cell::from("BCR"), Cell::from("LONG"), Cell::from("1"), Cell::from("UNKNOWN")]);
        assert_eq!(long[4..], [Cell::Number(0.0), Cell::Number(5.0), Cell::Number(0.0), Cell::Number(0.0)]);
    }

    #[test]
    fn undroppables_add_zero_columns() {
        let wide = WideTable::aggregate(&drops(), &PivotSpec::default(), &CanonicalOrders::default()).unwrap();
        let basan = ValueKey::parse("BOOK_OF_BASAN | 3 | EPIC");
        assert!(wide.value_keys().contains(&basan));
        assert_eq!(wide.value_keys().len(), 4 + default_undroppables().len());
        for pivot in wide.pivot_keys() {
            assert_eq!(wide.get(pivot, &basan), 0.0);
        }
    }

    #[test]
    fn stacked_layout_splits_segments() {
        let wide = WideTable::aggregate(&drops(), &spec_without_undroppables(), &CanonicalOrders::default()).unwrap();
        let rows = wide.to_rows(HeaderLayout::Stacked);
        assert_eq!(rows.len(), 4 + 2);
        assert_eq!(rows[0][0], Cell::from("Ship type"));
        assert_eq!(rows[0][4], Cell::from("GOLD_METEORITE"));
        assert_eq!(rows[1][0], Cell::from(""));
        assert_eq!(rows[1][5], Cell::from("2"));
        assert_eq!(rows[2][4], Cell::from("COMMON"));
        assert_eq!(rows[3][4], Cell::from("GOLD_METEORITE | 1 | COMMON"));
    }

    #[test]
    fn missing_measure_column_is_an_error() {
        let spec = PivotSpec {
            measure_column: "Flights".into(),
            ..spec_without_undroppables()
        };
        assert!(WideTable::aggregate(&drops(), &spec, &CanonicalOrders::default()).is_err());
    }
}
