//! Engine configuration.
//!
//! Every field has a default matching the reference workbook layout, so a
//! config file only needs to name what differs:
//!
//! ```
//! use virtue_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "sheets": { "data": "Missions" } }"#).unwrap();
//! assert_eq!(config.sheets.data, "Missions");
//! assert_eq!(config.sheets.params, "Ship_Parameters");
//! assert_eq!(config.projection.default_level, "0");
//! ```
//!
//! # Cache keys
//!
//! Cached artifacts are keyed by a namespace, the source sheet name, and a
//! blake3 fingerprint of the config section that shapes the value, so a
//! config change never serves an entry built under the old settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use virtue_bom::model::{BomColumns, InventoryColumns};
use virtue_index::drops::SolverColumns;
use virtue_index::mission::MissionColumns;
use virtue_index::params::ParamColumns;
use virtue_index::pivot::PivotSpec;
use virtue_index::project::ProjectOptions;
use virtue_index::ranking::RankingSpec;
use virtue_keys::alias::AliasColumns;
use virtue_keys::kind::CanonicalOrders;

use crate::EngineError;

/// Cache key of the artifacts-by-params drop index.
pub const ARTIFACTS_CACHE_KEY: &str = "artifactsByParams:index:v1";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Sheet names read and written by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetNames {
    /// Raw mission rows, indexed and pivoted.
    pub data: String,
    /// Destination of the wide drop table.
    pub raw_mission_table: String,
    pub params: String,
    pub aliases: String,
    /// Optional `kind, pattern, canonical` rule rows.
    pub rules: String,
    /// Destination of the projection.
    pub results: String,
    /// Wide artifacts-by-params table read by the drop index.
    pub artifacts: String,
    pub solver: String,
    pub solver_summary: String,
    pub bom: String,
    pub inventory: String,
    pub bom_rollup: String,
    /// Per-ship totals with a percentage score.
    pub totals: String,
    /// Optional `Ship, Include` checkbox rows limiting the ranking.
    pub ship_selection: String,
    /// Destination of the best-ship blocks.
    pub best_ships: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            data: "AllArtifactData".to_owned(),
            raw_mission_table: "MissionDataRaw".to_owned(),
            params: "Ship_Parameters".to_owned(),
            aliases: "Aliases".to_owned(),
            rules: "AliasRules".to_owned(),
            results: "ArtifactsByParams".to_owned(),
            artifacts: "ArtifactsByParams".to_owned(),
            solver: "NewSolver".to_owned(),
            solver_summary: "SolverSummary".to_owned(),
            bom: "BOM_Data".to_owned(),
            inventory: "Inventory_Stock".to_owned(),
            bom_rollup: "BOM_Rollup".to_owned(),
            totals: "Totals".to_owned(),
            ship_selection: "ShipSelection".to_owned(),
            best_ships: "Comparison".to_owned(),
        }
    }
}

/// Cache lifetimes in seconds. Zero disables caching for that artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheTtls {
    pub index_secs: u64,
    pub params_secs: u64,
    pub aliases_secs: u64,
    pub artifacts_secs: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            index_secs: 0,
            params_secs: 0,
            aliases_secs: 0,
            artifacts_secs: 300,
        }
    }
}

impl CacheTtls {
    pub fn index(&self) -> Duration {
        Duration::from_secs(self.index_secs)
    }

    pub fn params(&self) -> Duration {
        Duration::from_secs(self.params_secs)
    }

    pub fn aliases(&self) -> Duration {
        Duration::from_secs(self.aliases_secs)
    }

    pub fn artifacts(&self) -> Duration {
        Duration::from_secs(self.artifacts_secs)
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sheets: SheetNames,
    pub mission_columns: MissionColumns,
    pub param_columns: ParamColumns,
    pub alias_columns: AliasColumns,
    pub solver_columns: SolverColumns,
    pub bom_columns: BomColumns,
    pub inventory_columns: InventoryColumns,
    /// Default level, header/unknown flags and the no-match sentinel.
    pub projection: ProjectOptions,
    /// Pivot columns and undroppable value keys.
    pub pivot: PivotSpec,
    /// Totals layout, fuel classes and per-class limits.
    pub ranking: RankingSpec,
    /// 0-based row of the full header in the artifacts sheet.
    pub artifacts_header_row: usize,
    pub cache: CacheTtls,
    pub canonical_orders: CanonicalOrders,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sheets: SheetNames::default(),
            mission_columns: MissionColumns::default(),
            param_columns: ParamColumns::default(),
            alias_columns: AliasColumns::default(),
            solver_columns: SolverColumns::default(),
            bom_columns: BomColumns::default(),
            inventory_columns: InventoryColumns::default(),
            projection: ProjectOptions::default(),
            pivot: PivotSpec::default(),
            ranking: RankingSpec::default(),
            artifacts_header_row: 3,
            cache: CacheTtls::default(),
            canonical_orders: CanonicalOrders::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Config {
            details: e.to_string(),
        })
    }

    /// Read and parse a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(|e| EngineError::Config {
            details: format!("{}: {e}", path.display()),
        })?;
        Self::from_json_str(&json)
    }

    /// Cache key of the alias table.
    pub fn aliases_cache_key(&self) -> String {
        cache_key("aliases", &self.sheets.aliases, &(&self.sheets.rules, &self.alias_columns))
    }

    /// Cache key of the mission index.
    pub fn index_cache_key(&self) -> String {
        cache_key(
            "index",
            &self.sheets.data,
            &(&self.mission_columns, &self.sheets.aliases, &self.sheets.rules),
        )
    }

    /// Cache key of the param level map.
    pub fn params_cache_key(&self) -> String {
        cache_key(
            "paramMap",
            &self.sheets.params,
            &(&self.param_columns, &self.sheets.aliases, &self.sheets.rules),
        )
    }

    /// Cache key of the artifacts drop index.
    pub fn artifacts_cache_key(&self) -> String {
        let section = (&self.sheets.artifacts, self.artifacts_header_row, &self.projection.sentinel);
        format!("{ARTIFACTS_CACHE_KEY}:{}", fingerprint(&section))
    }
}

fn cache_key<T: Serialize>(namespace: &str, sheet: &str, section: &T) -> String {
    format!("{namespace}:{sheet}:{}", fingerprint(section))
}

/// Short blake3 fingerprint of a config section's JSON form.
pub fn fingerprint<T: Serialize>(section: &T) -> String {
    let bytes = serde_json::to_vec(section).unwrap_or_default();
    let hex = blake3::hash(&bytes).to_hex();
    hex.as_str()[..16].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.sheets, SheetNames::default());
        assert_eq!(config.cache.artifacts(), Duration::from_secs(300));
        assert_eq!(config.cache.index(), Duration::ZERO);
        assert_eq!(config.artifacts_header_row, 3);
        assert!(config.projection.include_header_row);
        assert!(config.projection.include_unknowns);
    }

    #[test]
    fn ranking_section_merges_with_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "ranking": { "infiniteFuelLimit": 1, "columns": { "score": "Score" } } }"#)
                .unwrap();
        assert_eq!(config.ranking.infinite_fuel_limit, 1);
        assert_eq!(config.ranking.fuel_limited_limit, 5);
        assert_eq!(config.ranking.columns.score, "Score");
        assert_eq!(config.ranking.columns.ship, "Ship");
        assert_eq!(config.sheets.best_ships, "Comparison");
    }

    #[test]
    fn explicit_header_row_is_kept() {
        let config = EngineConfig::from_json_str(r#"{ "artifactsHeaderRow": 0 }"#).unwrap();
        assert_eq!(config.artifacts_header_row, 0);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ nope"),
            Err(EngineError::Config { .. })
        ));
    }

    #[test]
    fn cache_keys_change_with_shaping_config() {
        let a = EngineConfig::from_json_str("{}").unwrap();
        let mut b = a.clone();
        b.mission_columns.level = "lvl".into();
        assert!(a.index_cache_key().starts_with("index:AllArtifactData:"));
        assert_ne!(a.index_cache_key(), b.index_cache_key());
        assert_eq!(a.params_cache_key(), b.params_cache_key());
        assert!(a.artifacts_cache_key().starts_with(ARTIFACTS_CACHE_KEY));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint(&"x"), fingerprint(&"x"));
        assert_eq!(fingerprint(&"x").len(), 16);
    }
}
