//! Read-only diagnostics over a [`MissionIndex`] and [`ParamLevelMap`].
//!
//! These answer the usual "why is my result empty?" questions: which levels
//! exist for a pair, which configured pairs or levels the data lacks, and
//! which raw labels have no curated alias.

use std::cmp::Ordering;

use serde::Serialize;
use virtue_keys::kind::KeyKind;
use virtue_keys::normalize::Normalizer;
use virtue_table::table::Table;

use crate::mission::MissionIndex;
use crate::params::{param_rows, ParamColumns, ParamLevelMap};
use crate::IndexError;

// ---------------------------------------------------------------------------
// Levels for a pair
// ---------------------------------------------------------------------------

/// Outcome of [`levels_for_pair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum LevelLookup {
    /// The ship is not in the index; lists the ships that are.
    UnknownShip { available: Vec<String> },
    /// The duration is not recorded for the ship; lists those that are.
    UnknownDuration { available: Vec<String> },
    /// Level buckets present, sorted numerically.
    Levels { levels: Vec<String> },
}

/// Level buckets present for canonical `(ship, duration)`.
pub fn levels_for_pair(index: &MissionIndex, ship: &str, duration: &str) -> LevelLookup {
    let Some(durations) = index.durations(ship) else {
        return LevelLookup::UnknownShip {
            available: index.ships().map(str::to_owned).collect(),
        };
    };
    let Some(levels) = durations.get(duration) else {
        return LevelLookup::UnknownDuration {
            available: durations.keys().cloned().collect(),
        };
    };
    LevelLookup::Levels {
        levels: sorted_levels(levels.keys()),
    }
}

/// Sort level keys numerically; non-numeric keys go last, alphabetically.
fn sorted_levels<'a>(levels: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = levels.cloned().collect();
    out.sort_by(|a, b| match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    out
}

// ---------------------------------------------------------------------------
// Param -> index coverage
// ---------------------------------------------------------------------------

/// Why a configured pair has no index branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PairMismatchReason {
    UnknownShip,
    UnknownDuration,
}

/// A configured pair the index does not know at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairMismatch {
    pub ship_type: String,
    pub ship_duration_type: String,
    pub level: String,
    pub reason: PairMismatchReason,
}

/// A configured pair whose configured level has no bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMismatch {
    pub ship_type: String,
    pub ship_duration_type: String,
    pub level: String,
    /// Levels the index does have for the pair, sorted numerically.
    pub present: Vec<String>,
}

/// Result of [`param_index_coverage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    /// Configured pairs whose level bucket exists.
    pub matched: usize,
    pub missing_pairs: Vec<PairMismatch>,
    pub missing_levels: Vec<LevelMismatch>,
}

impl CoverageReport {
    /// Returns `true` if every configured pair resolves to a level bucket.
    pub fn is_complete(&self) -> bool {
        self.missing_pairs.is_empty() && self.missing_levels.is_empty()
    }
}

/// Check every configured pair against the index.
pub fn param_index_coverage(index: &MissionIndex, params: &ParamLevelMap, default_level: &str) -> CoverageReport {
    let mut report = CoverageReport::default();
    for (pair, _) in params.iter() {
        let (ship, duration) = (pair.ship_type.as_str(), pair.ship_duration_type.as_str());
        let level = params.active_level(ship, duration, default_level);
        let mismatch = |reason| PairMismatch {
            ship_type: ship.to_owned(),
            ship_duration_type: duration.to_owned(),
            level: level.clone(),
            reason,
        };
        match levels_for_pair(index, ship, duration) {
            LevelLookup::UnknownShip { .. } => report.missing_pairs.push(mismatch(PairMismatchReason::UnknownShip)),
            LevelLookup::UnknownDuration { .. } => {
                report.missing_pairs.push(mismatch(PairMismatchReason::UnknownDuration))
            }
            LevelLookup::Levels { levels } if levels.contains(&level) => report.matched += 1,
            LevelLookup::Levels { levels } => report.missing_levels.push(LevelMismatch {
                ship_type: ship.to_owned(),
                ship_duration_type: duration.to_owned(),
                level,
                present: levels,
            }),
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Key listings
// ---------------------------------------------------------------------------

/// Indexed ship keys, sorted, optionally filtered by a case-insensitive
/// substring.
pub fn known_ship_keys(index: &MissionIndex, filter: Option<&str>) -> Vec<String> {
    let needle = filter.map(|f| f.trim().to_uppercase()).filter(|f| !f.is_empty());
    let mut ships: Vec<String> = index
        .ships()
        .filter(|s| needle.as_deref().map_or(true, |n| s.to_uppercase().contains(n)))
        .map(str::to_owned)
        .collect();
    ships.sort();
    ships
}

/// Raw params-sheet labels with no curated alias, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingAliases {
    pub ship_types: Vec<String>,
    pub ship_duration_types: Vec<String>,
}

impl MissingAliases {
    pub fn is_empty(&self) -> bool {
        self.ship_types.is_empty() && self.ship_duration_types.is_empty()
    }
}

/// List ship and duration labels in the params sheet that resolve only
/// through rules or the upper-snake fallback.
///
/// # Errors
///
/// Returns [`IndexError::Table`] if the params sheet lacks a configured
/// column.
pub fn missing_aliases(
    params: &Table,
    columns: &ParamColumns,
    normalizer: &Normalizer,
) -> Result<MissingAliases, IndexError> {
    let mut out = MissingAliases::default();
    for row in param_rows(params, columns)? {
        for (kind, cell, list) in [
            (KeyKind::ShipType, row.ship_type, &mut out.ship_types),
            (KeyKind::ShipDurationType, row.ship_duration_type, &mut out.ship_duration_types),
        ] {
            let Some(label) = cell.trimmed() else {
                continue;
            };
            if !normalizer.has_alias(kind, cell) && !list.contains(&label) {
                list.push(label);
            }
        }
    }
    Ok(out)
}
