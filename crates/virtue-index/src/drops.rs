//! Artifact drops per flight key, and the solver summary built on them.
//!
//! The artifacts-by-params sheet is a wide table (typically the stacked
//! layout written by [`WideTable`](crate::pivot::WideTable)): four key
//! columns followed by one column per artifact, with the full header on a
//! configurable row. [`ArtifactDropIndex`] keeps, per [`FlightKey`], only the
//! non-zero artifact values.
//!
//! [`SolverSummary`] multiplies those per-flight drops by the flight counts
//! of a solver sheet and totals them per artifact.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use virtue_keys::normalize::Normalizer;
use virtue_table::cell::Cell;
use virtue_table::table::{ColumnSpec, Table};

use crate::key::FlightKey;
use crate::IndexError;

/// Sparse `artifact column -> drop value`, non-zero entries only.
pub type DropMap = IndexMap<String, f64>;

/// Number of leading key columns in an artifacts-by-params row.
const KEY_COLUMNS: usize = 4;

// ---------------------------------------------------------------------------
// ArtifactDropIndex
// ---------------------------------------------------------------------------

/// [`DropMap`] per flight key, plus the artifact header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDropIndex {
    artifact_headers: Vec<String>,
    #[serde(with = "crate::pairs")]
    drops: IndexMap<FlightKey, DropMap>,
}

impl ArtifactDropIndex {
    /// Read a wide artifacts table whose full header sits at 0-based row
    /// `header_row`; data starts on the next row.
    ///
    /// A table consisting of just the `sentinel` row yields an empty index.
    /// Blank rows, sentinel rows and rows without a complete key are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MissingHeaderRows`] if the table ends before the
    /// header row, and [`IndexError::MissingArtifactColumns`] if the header
    /// has no columns past the key.
    pub fn build(table: &Table, header_row: usize, sentinel: &str, normalizer: &Normalizer) -> Result<Self, IndexError> {
        let all = table.all();
        if all.len() == 1 && is_sentinel(&all[0], sentinel) {
            debug!(table = table.name(), "artifacts table holds only the sentinel");
            return Ok(Self::default());
        }
        let Some(header) = all.get(header_row) else {
            return Err(IndexError::MissingHeaderRows {
                table: table.name().to_owned(),
                rows: all.len(),
                header_row: header_row + 1,
            });
        };
        if header.len() <= KEY_COLUMNS {
            return Err(IndexError::MissingArtifactColumns {
                table: table.name().to_owned(),
            });
        }
        let artifact_headers: Vec<String> = header[KEY_COLUMNS..]
            .iter()
            .map(|c| c.as_text().trim().to_owned())
            .collect();

        let mut drops = IndexMap::new();
        let mut skipped = 0usize;
        for row in &all[header_row + 1..] {
            if row.iter().take(KEY_COLUMNS).all(Cell::is_blank) || is_sentinel(row, sentinel) {
                skipped += 1;
                continue;
            }
            let key = FlightKey::resolve(
                normalizer,
                Table::cell(row, 0),
                Table::cell(row, 1),
                Table::cell(row, 2),
                Table::cell(row, 3),
            );
            match key {
                Ok(key) => {
                    drops.insert(key, drop_map(&artifact_headers, row));
                }
                Err(_) => skipped += 1,
            }
        }

        debug!(
            table = table.name(),
            keys = drops.len(),
            artifacts = artifact_headers.len(),
            skipped,
            "artifact drop index built"
        );
        Ok(Self { artifact_headers, drops })
    }

    /// Artifact column names in sheet order (blank names kept as `""`).
    pub fn artifact_headers(&self) -> &[String] {
        &self.artifact_headers
    }

    /// Drops recorded for `key`.
    pub fn get(&self, key: &FlightKey) -> Option<&DropMap> {
        self.drops.get(key)
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }
}

fn is_sentinel(row: &[Cell], sentinel: &str) -> bool {
    row.first().is_some_and(|c| c.as_text().trim() == sentinel)
}

fn drop_map(headers: &[String], row: &[Cell]) -> DropMap {
    headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .filter_map(|(i, name)| {
            let value = Table::cell(row, KEY_COLUMNS + i).as_number()?;
            (value != 0.0).then(|| (name.clone(), value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Solver summary
// ---------------------------------------------------------------------------

/// Header names of the solver sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverColumns {
    pub ship_type: String,
    pub ship_duration_type: String,
    pub level: String,
    pub target_artifact: String,
    pub flights: String,
}

impl Default for SolverColumns {
    fn default() -> Self {
        Self {
            ship_type: "Ship type".to_owned(),
            ship_duration_type: "Ship duration type".to_owned(),
            level: "Ship level".to_owned(),
            target_artifact: "Target artifact".to_owned(),
            flights: "Flights".to_owned(),
        }
    }
}

/// Expected drops per artifact for a solver's flight plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSummary {
    totals: Vec<(String, f64)>,
    missing_keys: Vec<FlightKey>,
}

impl SolverSummary {
    /// Header of [`SolverSummary::to_rows`].
    pub const HEADER: [&'static str; 2] = ["Artifact", "Average Drops"];

    /// Total `drop x flights` per artifact over every solver row with a
    /// non-zero numeric flight count.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Table`] if the solver sheet has rows but lacks
    /// one of the configured columns.
    pub fn compute(
        index: &ArtifactDropIndex,
        solver: &Table,
        columns: &SolverColumns,
        normalizer: &Normalizer,
    ) -> Result<Self, IndexError> {
        if solver.all().is_empty() {
            return Ok(Self {
                totals: Vec::new(),
                missing_keys: Vec::new(),
            });
        }
        let col = |name: &String| solver.resolve(&ColumnSpec::new(name, name));
        let ship = col(&columns.ship_type)?;
        let duration = col(&columns.ship_duration_type)?;
        let level = col(&columns.level)?;
        let target = col(&columns.target_artifact)?;
        let flights = col(&columns.flights)?;

        let mut totals: IndexMap<&str, f64> = IndexMap::new();
        let mut missing_keys = Vec::new();
        for row in solver.rows() {
            let Some(count) = Table::cell(row, flights).as_number().filter(|n| *n != 0.0) else {
                continue;
            };
            let Ok(key) = FlightKey::resolve(
                normalizer,
                Table::cell(row, ship),
                Table::cell(row, duration),
                Table::cell(row, level),
                Table::cell(row, target),
            ) else {
                continue;
            };
            let Some(drops) = index.get(&key) else {
                missing_keys.push(key);
                continue;
            };
            for (artifact, drop) in drops {
                *totals.entry(artifact.as_str()).or_insert(0.0) += drop * count;
            }
        }

        if !missing_keys.is_empty() {
            let keys: Vec<String> = missing_keys.iter().map(ToString::to_string).collect();
            warn!(count = missing_keys.len(), keys = ?keys, "no artifact row found for solver keys");
        }

        let totals = index
            .artifact_headers()
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| (name.clone(), totals.get(name.as_str()).copied().unwrap_or(0.0)))
            .collect();
        Ok(Self { totals, missing_keys })
    }

    /// `(artifact, total)` in artifact-header order.
    pub fn totals(&self) -> &[(String, f64)] {
        &self.totals
    }

    /// Solver keys with no row in the drop index.
    pub fn missing_keys(&self) -> &[FlightKey] {
        &self.missing_keys
    }

    /// Render as sheet rows under [`SolverSummary::HEADER`].
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        let mut out = vec![Self::HEADER.iter().map(|h| Cell::from(*h)).collect::<Vec<_>>()];
        out.extend(
            self.totals
                .iter()
                .map(|(name, total)| vec![Cell::from(name.as_str()), Cell::Number(*total)]),
        );
        out
    }
}
