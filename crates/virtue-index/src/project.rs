//! Canonical-order projection of a [`MissionIndex`] back into rows.
//!
//! Walks ships, then durations, in canonical order (unknown keys optionally
//! appended in first-seen order), picks the active level bucket per pair from
//! the [`ParamLevelMap`], and emits each target's source rows in stored
//! order. An empty result is always exactly one sentinel row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_keys::kind::{CanonicalOrders, KeyKind};
use virtue_table::cell::Cell;
use virtue_table::table::Table;

use crate::mission::MissionIndex;
use crate::params::ParamLevelMap;
use crate::IndexError;

/// Result-header names picked by [`Projection::keys_only`], in output order.
const KEY_RESULT_COLUMNS: [&str; 4] = ["ship type", "ship duration type", "ship level", "target artifact"];

/// Header written by [`Projection::keys_only`].
const KEY_OUTPUT_HEADER: [&str; 4] = ["shipType", "shipDurationType", "level", "targetArtifact"];

/// Knobs controlling a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectOptions {
    /// Emit the source header as the first row.
    pub include_header_row: bool,
    /// Append non-canonical keys after canonical ones.
    pub include_unknowns: bool,
    /// Level used for pairs absent from the parameter map.
    pub default_level: String,
    /// Text of the single placeholder cell returned for an empty result.
    pub sentinel: String,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            include_header_row: true,
            include_unknowns: true,
            default_level: "0".to_owned(),
            sentinel: "(no matches)".to_owned(),
        }
    }
}

/// Which columns of a projection to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnSelection {
    #[default]
    All,
    /// The leftmost N columns; N is clamped to at least 1.
    FirstN(usize),
    /// Columns by header name, case-insensitive, in the order given.
    Named(Vec<String>),
}

/// Rows produced by [`project`].
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    rows: Vec<Vec<Cell>>,
    header: Vec<Cell>,
    matched: usize,
}

/// Project `index` into rows.
pub fn project(
    index: &MissionIndex,
    params: &ParamLevelMap,
    orders: &CanonicalOrders,
    options: &ProjectOptions,
) -> Projection {
    let source = index.source();
    let header = source.header_row().map(<[Cell]>::to_vec).unwrap_or_default();
    let mut rows = Vec::new();
    if options.include_header_row {
        rows.push(header.clone());
    }

    let mut matched = 0usize;
    for ship in orders.order_observed(KeyKind::ShipType, index.ships(), options.include_unknowns) {
        let Some(durations) = index.durations(ship) else {
            continue;
        };
        let observed = durations.keys().map(String::as_str);
        for duration in orders.order_observed(KeyKind::ShipDurationType, observed, options.include_unknowns) {
            let level = params.active_level(ship, duration, &options.default_level);
            let Some(targets) = durations.get(duration).and_then(|levels| levels.get(&level)) else {
                continue;
            };
            let observed = targets.keys().map(String::as_str);
            for target in orders.order_observed(KeyKind::TargetArtifact, observed, options.include_unknowns) {
                for &row_number in targets.get(target).map(Vec::as_slice).unwrap_or(&[]) {
                    if let Some(row) = source.sheet_row(row_number) {
                        rows.push(row.to_vec());
                        matched += 1;
                    }
                }
            }
        }
    }

    debug!(table = source.name(), matched, "projection complete");
    if matched == 0 {
        rows = vec![vec![Cell::Text(options.sentinel.clone())]];
    }
    Projection { rows, header, matched }
}

impl Projection {
    /// Output rows, header first when requested.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    /// Number of data rows emitted.
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Returns `true` if the result is the sentinel row.
    pub fn is_no_match(&self) -> bool {
        self.matched == 0
    }

    /// Apply a column selection.
    ///
    /// The sentinel result is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownOutputColumn`] if a named column is not
    /// in the result header.
    pub fn select(&self, selection: &ColumnSelection) -> Result<Vec<Vec<Cell>>, IndexError> {
        if self.is_no_match() {
            return Ok(self.rows.clone());
        }
        match selection {
            ColumnSelection::All => Ok(self.rows.clone()),
            ColumnSelection::FirstN(n) => {
                let n = (*n).max(1);
                Ok(self.rows.iter().map(|row| row.iter().take(n).cloned().collect()).collect())
            }
            ColumnSelection::Named(names) => {
                let lookup = self.header_lookup();
                let picks = names
                    .iter()
                    .map(|name| {
                        lookup
                            .get(name.trim().to_lowercase().as_str())
                            .copied()
                            .ok_or_else(|| IndexError::UnknownOutputColumn { name: name.clone() })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(pick(&picks, &self.rows))
            }
        }
    }

    /// The four key columns only, under a `shipType, shipDurationType,
    /// level, targetArtifact` header.
    ///
    /// The sentinel result is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownOutputColumn`] if the result header
    /// lacks one of the key columns.
    pub fn keys_only(&self) -> Result<Vec<Vec<Cell>>, IndexError> {
        if self.is_no_match() {
            return Ok(self.rows.clone());
        }
        let lookup = self.header_lookup();
        let picks = KEY_RESULT_COLUMNS
            .iter()
            .map(|name| {
                lookup
                    .get(*name)
                    .copied()
                    .ok_or_else(|| IndexError::UnknownOutputColumn { name: (*name).to_owned() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let data = &self.rows[self.rows.len() - self.matched..];
        let mut out = vec![KEY_OUTPUT_HEADER.iter().map(|h| Cell::from(*h)).collect::<Vec<_>>()];
        out.extend(pick(&picks, data));
        Ok(out)
    }

    fn header_lookup(&self) -> HashMap<String, usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(i, cell)| (cell.as_text().trim().to_lowercase(), i))
            .collect()
    }
}

fn pick(picks: &[usize], rows: &[Vec<Cell>]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| picks.iter().map(|&c| Table::cell(row, c).clone()).collect())
        .collect()
}
