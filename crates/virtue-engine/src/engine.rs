//! The cached engine facade.
//!
//! [`Engine`] owns a workbook, a [`CacheLayer`] and an [`EngineConfig`].
//! Read-side operations need only [`TabularSource`]; the `write_*` family
//! additionally needs [`TabularSink`].
//!
//! Derived artifacts follow one pattern: look up the config-fingerprinted
//! key, rebuild from the source sheet on a miss, then store the fully built
//! value. Cache failures never surface; they degrade to a rebuild.

use serde::Serialize;
use tracing::{debug, info};
use virtue_bom::explode::{rollup_rows, Bom, Inventory};
use virtue_bom::model::{load_edges, load_inventory};
use virtue_index::diag::{self, CoverageReport, LevelLookup, MissingAliases};
use virtue_index::drops::{ArtifactDropIndex, SolverSummary};
use virtue_index::mission::{MissionIndex, MissionSchema};
use virtue_index::params::{param_rows, PairKey, ParamLevelMap};
use virtue_index::pivot::{HeaderLayout, WideTable};
use virtue_index::project::{project, ColumnSelection, Projection};
use virtue_index::ranking::{FuelClass, ShipRanking, ShipSelection};
use virtue_keys::alias::{AliasBootstrap, AliasTable};
use virtue_keys::kind::KeyKind;
use virtue_keys::normalize::Normalizer;
use virtue_keys::rules::RuleTable;
use virtue_table::cache::CacheLayer;
use virtue_table::cell::Cell;
use virtue_table::source::{TabularSink, TabularSource};
use virtue_table::table::Table;
use virtue_table::TableError;

use crate::config::EngineConfig;
use crate::EngineError;

/// Number of entries listed per section by [`Engine::sample`].
const SAMPLE_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Which cached artifacts [`Engine::clear_cache`] drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Index,
    Params,
    Aliases,
    ArtifactsIndex,
    All,
}

/// Configured level for one normalized ship/duration pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamLookup {
    pub ship_type: String,
    pub ship_duration_type: String,
    /// `None` when the params sheet has no row for the pair.
    pub level: Option<Cell>,
}

/// Header rows of the data and params sheets, as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderReport {
    pub data: Vec<String>,
    pub params: Vec<String>,
}

/// A peek at the first indexed ships and configured pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    pub ships: Vec<String>,
    pub pairs: Vec<PairKey>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Cached facade over a workbook.
#[derive(Debug)]
pub struct Engine<W> {
    workbook: W,
    cache: CacheLayer,
    config: EngineConfig,
}

impl<W> Engine<W> {
    pub fn new(workbook: W, cache: CacheLayer, config: EngineConfig) -> Self {
        Self {
            workbook,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workbook(&self) -> &W {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut W {
        &mut self.workbook
    }

    pub fn into_workbook(self) -> W {
        self.workbook
    }

    /// Drop cached artifacts in `scope`.
    pub fn clear_cache(&self, scope: CacheScope) {
        let keys = match scope {
            CacheScope::Index => vec![self.config.index_cache_key()],
            CacheScope::Params => vec![self.config.params_cache_key()],
            CacheScope::Aliases => vec![self.config.aliases_cache_key()],
            CacheScope::ArtifactsIndex => vec![self.config.artifacts_cache_key()],
            CacheScope::All => vec![
                self.config.index_cache_key(),
                self.config.params_cache_key(),
                self.config.aliases_cache_key(),
                self.config.artifacts_cache_key(),
            ],
        };
        for key in &keys {
            self.cache.remove(key);
        }
        debug!(?scope, keys = keys.len(), "cache cleared");
    }
}

// -- sources and keys --------------------------------------------------------

impl<W: TabularSource> Engine<W> {
    /// Read a sheet, mapping absence to `None`.
    fn read_optional(&self, name: &str) -> Result<Option<Table>, EngineError> {
        match self.workbook.read(name) {
            Ok(table) => Ok(Some(table)),
            Err(TableError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The alias table; empty when the aliases sheet is absent.
    pub fn aliases(&self) -> Result<AliasTable, EngineError> {
        let key = self.config.aliases_cache_key();
        if let Some(cached) = self.cache.get_json::<AliasTable>(&key) {
            return Ok(cached);
        }
        let aliases = match self.read_optional(&self.config.sheets.aliases)? {
            Some(table) => AliasTable::from_table(&table, &self.config.alias_columns),
            None => {
                debug!(sheet = %self.config.sheets.aliases, "aliases sheet absent -- using empty table");
                AliasTable::new()
            }
        };
        self.cache.put_json(&key, &aliases, self.config.cache.aliases());
        Ok(aliases)
    }

    /// Built-in heuristic rules followed by any rows of the rules sheet.
    pub fn rules(&self) -> Result<RuleTable, EngineError> {
        let mut rules = RuleTable::with_defaults();
        if let Some(table) = self.read_optional(&self.config.sheets.rules)? {
            rules.extend_from_table(&table)?;
        }
        Ok(rules)
    }

    pub fn normalizer(&self) -> Result<Normalizer, EngineError> {
        Ok(Normalizer::new(self.aliases()?, self.rules()?))
    }

    /// Canonical token for a raw label, `None` when unmappable.
    pub fn normalize(&self, kind: KeyKind, raw: &Cell) -> Result<Option<String>, EngineError> {
        Ok(self.normalizer()?.normalize(kind, raw))
    }

    // -- indexes ---------------------------------------------------------------

    /// The mission index over the data sheet.
    ///
    /// # Errors
    ///
    /// Fails if the data sheet is absent or a key column cannot be resolved.
    pub fn build_index(&self) -> Result<MissionIndex, EngineError> {
        let key = self.config.index_cache_key();
        if let Some(cached) = self.cache.get_json::<MissionIndex>(&key) {
            return Ok(cached);
        }
        let table = self.workbook.read(&self.config.sheets.data)?;
        let index = MissionIndex::build(&table, &self.config.mission_columns, &self.normalizer()?)?;
        self.cache.put_json(&key, &index, self.config.cache.index());
        Ok(index)
    }

    /// The configured level per ship/duration pair.
    ///
    /// # Errors
    ///
    /// Fails if the params sheet is absent or lacks a configured column.
    pub fn build_param_level_map(&self) -> Result<ParamLevelMap, EngineError> {
        let key = self.config.params_cache_key();
        if let Some(cached) = self.cache.get_json::<ParamLevelMap>(&key) {
            return Ok(cached);
        }
        let table = self.workbook.read(&self.config.sheets.params)?;
        let map = ParamLevelMap::build(&table, &self.config.param_columns, &self.normalizer()?)?;
        self.cache.put_json(&key, &map, self.config.cache.params());
        Ok(map)
    }

    /// The drop index over the artifacts-by-params sheet.
    ///
    /// `force_refresh` skips the cache lookup; the rebuilt index still
    /// replaces the cached entry.
    pub fn artifacts_index(&self, force_refresh: bool) -> Result<ArtifactDropIndex, EngineError> {
        let key = self.config.artifacts_cache_key();
        if !force_refresh {
            if let Some(cached) = self.cache.get_json::<ArtifactDropIndex>(&key) {
                return Ok(cached);
            }
        }
        let table = self.workbook.read(&self.config.sheets.artifacts)?;
        let index = ArtifactDropIndex::build(
            &table,
            self.config.artifacts_header_row,
            &self.config.projection.sentinel,
            &self.normalizer()?,
        )?;
        self.cache.put_json(&key, &index, self.config.cache.artifacts());
        Ok(index)
    }

    // -- projections -------------------------------------------------------------

    /// The mission index projected in canonical order under the active levels.
    pub fn results(&self) -> Result<Projection, EngineError> {
        let index = self.build_index()?;
        let params = self.build_param_level_map()?;
        Ok(project(
            &index,
            &params,
            &self.config.canonical_orders,
            &self.config.projection,
        ))
    }

    /// [`results`](Self::results) restricted to a column subset.
    pub fn project_columns(&self, selection: &ColumnSelection) -> Result<Vec<Vec<Cell>>, EngineError> {
        Ok(self.results()?.select(selection)?)
    }

    /// Pivot the data sheet into the wide drop table.
    pub fn aggregate(&self) -> Result<WideTable, EngineError> {
        let table = self.workbook.read(&self.config.sheets.data)?;
        Ok(WideTable::aggregate(
            &table,
            &self.config.pivot,
            &self.config.canonical_orders,
        )?)
    }

    /// Distinct raw labels from the params sheet (when its columns resolve)
    /// and the data sheet, proposed as identity aliases.
    pub fn bootstrap_aliases(&self) -> Result<AliasBootstrap, EngineError> {
        let mut bootstrap = AliasBootstrap::new();
        if let Some(params) = self.read_optional(&self.config.sheets.params)? {
            match param_rows(&params, &self.config.param_columns) {
                Ok(rows) => {
                    for row in rows {
                        if let Some(ship) = row.ship_type.trimmed() {
                            bootstrap.observe(KeyKind::ShipType, &ship);
                        }
                        if let Some(duration) = row.ship_duration_type.trimmed() {
                            bootstrap.observe(KeyKind::ShipDurationType, &duration);
                        }
                    }
                }
                Err(e) => debug!(error = %e, "params sheet skipped for alias bootstrap"),
            }
        }

        let data = self.workbook.read(&self.config.sheets.data)?;
        let schema = MissionSchema::resolve(&data, &self.config.mission_columns)?;
        bootstrap
            .observe_column(KeyKind::ShipType, &data, schema.ship_type)
            .observe_column(KeyKind::ShipDurationType, &data, schema.ship_duration_type)
            .observe_column(KeyKind::TargetArtifact, &data, schema.target_artifact);
        Ok(bootstrap)
    }

    // -- solver and BOM ----------------------------------------------------------

    /// Expected drops per artifact over the solver sheet's flights.
    pub fn solver_summary(&self) -> Result<SolverSummary, EngineError> {
        let index = self.artifacts_index(false)?;
        let solver = self.workbook.read(&self.config.sheets.solver)?;
        Ok(SolverSummary::compute(
            &index,
            &solver,
            &self.config.solver_columns,
            &self.normalizer()?,
        )?)
    }

    /// Net leaf requirements for `quantity` units of `item`. The BOM and
    /// inventory sheets are read fresh on every call.
    ///
    /// # Errors
    ///
    /// Fails if either sheet is absent, a quantity is invalid, or the BOM
    /// has a cycle on the exploded path.
    pub fn rollup_bom(&self, item: &str, quantity: f64) -> Result<Vec<(String, f64)>, EngineError> {
        let bom = self.workbook.read(&self.config.sheets.bom)?;
        let stock = self.workbook.read(&self.config.sheets.inventory)?;
        let bom = Bom::from_edges(load_edges(&bom, &self.config.bom_columns)?);
        let stock = Inventory::from_records(load_inventory(&stock, &self.config.inventory_columns)?);
        Ok(bom.rollup(item, quantity, &stock)?)
    }

    // -- ranking -------------------------------------------------------------------

    /// Best ships per fuel class from the totals sheet. Without a selection
    /// sheet every ship is eligible.
    ///
    /// # Errors
    ///
    /// Fails if the totals sheet is absent or either sheet lacks a
    /// configured column.
    pub fn best_ships(&self) -> Result<ShipRanking, EngineError> {
        let spec = &self.config.ranking;
        let selection = match self.read_optional(&self.config.sheets.ship_selection)? {
            Some(table) => ShipSelection::from_table(&table, &spec.selection_columns)?,
            None => ShipSelection::All,
        };
        let totals = self.workbook.read(&self.config.sheets.totals)?;
        Ok(ShipRanking::rank(&totals, &selection, spec)?)
    }

    // -- diagnostics ---------------------------------------------------------------

    /// Level buckets indexed for a pair, given raw labels.
    pub fn levels_for_pair(&self, ship: &str, duration: &str) -> Result<LevelLookup, EngineError> {
        let normalizer = self.normalizer()?;
        let ship = normalizer.normalize_str(KeyKind::ShipType, ship).unwrap_or_default();
        let duration = normalizer
            .normalize_str(KeyKind::ShipDurationType, duration)
            .unwrap_or_default();
        Ok(diag::levels_for_pair(&self.build_index()?, &ship, &duration))
    }

    /// Configured level for a pair, given raw labels.
    pub fn param_for_pair(&self, ship: &str, duration: &str) -> Result<ParamLookup, EngineError> {
        let normalizer = self.normalizer()?;
        let ship_type = normalizer.normalize_str(KeyKind::ShipType, ship).unwrap_or_default();
        let ship_duration_type = normalizer
            .normalize_str(KeyKind::ShipDurationType, duration)
            .unwrap_or_default();
        let level = self
            .build_param_level_map()?
            .level(&ship_type, &ship_duration_type)
            .cloned();
        Ok(ParamLookup {
            ship_type,
            ship_duration_type,
            level,
        })
    }

    pub fn headers(&self) -> Result<HeaderReport, EngineError> {
        let header = |name: &str| -> Result<Vec<String>, EngineError> {
            let table = self.workbook.read(name)?;
            Ok(table
                .header_row()
                .map(|row| row.iter().map(Cell::as_text).collect())
                .unwrap_or_default())
        };
        Ok(HeaderReport {
            data: header(&self.config.sheets.data)?,
            params: header(&self.config.sheets.params)?,
        })
    }

    pub fn sample(&self) -> Result<SampleReport, EngineError> {
        let index = self.build_index()?;
        let params = self.build_param_level_map()?;
        Ok(SampleReport {
            ships: index.ships().take(SAMPLE_LIMIT).map(str::to_owned).collect(),
            pairs: params.iter().take(SAMPLE_LIMIT).map(|(pair, _)| pair.clone()).collect(),
        })
    }

    /// Configured pairs with no index branch or no bucket at their level.
    pub fn coverage(&self) -> Result<CoverageReport, EngineError> {
        Ok(diag::param_index_coverage(
            &self.build_index()?,
            &self.build_param_level_map()?,
            &self.config.projection.default_level,
        ))
    }

    /// Indexed ship keys, optionally filtered by a case-insensitive substring.
    pub fn known_ships(&self, filter: Option<&str>) -> Result<Vec<String>, EngineError> {
        Ok(diag::known_ship_keys(&self.build_index()?, filter))
    }

    /// Params-sheet labels that resolve without an alias entry.
    pub fn missing_aliases(&self) -> Result<MissingAliases, EngineError> {
        let params = self.workbook.read(&self.config.sheets.params)?;
        Ok(diag::missing_aliases(
            &params,
            &self.config.param_columns,
            &self.normalizer()?,
        )?)
    }
}

// -- writers -------------------------------------------------------------------

impl<W: TabularSource + TabularSink> Engine<W> {
    /// Replace `sheet` with `rows`. Overwriting the artifacts source drops the
    /// cached drop index built from it.
    fn write_sheet(&mut self, sheet: &str, rows: Vec<Vec<Cell>>) -> Result<usize, EngineError> {
        let count = rows.len();
        self.workbook.write(sheet, rows)?;
        if sheet == self.config.sheets.artifacts {
            self.clear_cache(CacheScope::ArtifactsIndex);
        }
        Ok(count)
    }

    /// Write the projection to the results sheet. Returns the rows written.
    pub fn write_results(&mut self) -> Result<usize, EngineError> {
        let projection = self.results()?;
        let matched = projection.matched();
        let sheet = self.config.sheets.results.clone();
        let written = self.write_sheet(&sheet, projection.into_rows())?;
        info!(sheet = %sheet, matched, "results written");
        Ok(written)
    }

    /// Write the four key columns of the projection to the results sheet.
    pub fn write_results_keys_only(&mut self) -> Result<usize, EngineError> {
        let rows = self.results()?.keys_only()?;
        let sheet = self.config.sheets.results.clone();
        self.write_sheet(&sheet, rows)
    }

    /// Pivot the data sheet and write it to the raw mission table sheet.
    pub fn write_raw_mission_table(&mut self, layout: HeaderLayout) -> Result<usize, EngineError> {
        let wide = self.aggregate()?;
        let sheet = self.config.sheets.raw_mission_table.clone();
        let written = self.write_sheet(&sheet, wide.to_rows(layout))?;
        info!(sheet = %sheet, keys = wide.len(), columns = wide.value_keys().len(), "wide table written");
        Ok(written)
    }

    /// Write bootstrap alias rows to the aliases sheet and drop every cached
    /// artifact, since all of them were normalized through the old aliases.
    pub fn write_alias_bootstrap(&mut self) -> Result<usize, EngineError> {
        let rows = self.bootstrap_aliases()?.to_sheet();
        let sheet = self.config.sheets.aliases.clone();
        let written = self.write_sheet(&sheet, rows)?;
        self.clear_cache(CacheScope::All);
        Ok(written)
    }

    pub fn write_solver_summary(&mut self) -> Result<usize, EngineError> {
        let rows = self.solver_summary()?.to_rows();
        let sheet = self.config.sheets.solver_summary.clone();
        self.write_sheet(&sheet, rows)
    }

    /// Write both ranking blocks side by side to the best-ships sheet.
    pub fn write_best_ships(&mut self) -> Result<usize, EngineError> {
        let ranking = self.best_ships()?;
        let sheet = self.config.sheets.best_ships.clone();
        let written = self.write_sheet(&sheet, ranking.to_rows())?;
        info!(
            sheet = %sheet,
            fuel_limited = ranking.get(FuelClass::FuelLimited).len(),
            infinite_fuel = ranking.get(FuelClass::InfiniteFuel).len(),
            "best ships written"
        );
        Ok(written)
    }

    pub fn write_bom_rollup(&mut self, item: &str, quantity: f64) -> Result<usize, EngineError> {
        let rows = rollup_rows(&self.rollup_bom(item, quantity)?);
        let sheet = self.config.sheets.bom_rollup.clone();
        self.write_sheet(&sheet, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use virtue_table::source::MemoryWorkbook;

    fn engine(sheets: Vec<(&str, Vec<Vec<Cell>>)>) -> Engine<MemoryWorkbook> {
        let mut book = MemoryWorkbook::new();
        for (name, rows) in sheets {
            book.insert_sheet(name, rows);
        }
        Engine::new(book, CacheLayer::disabled(), EngineConfig::default())
    }

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    #[test]
    fn absent_aliases_sheet_is_empty_table() {
        let e = engine(vec![]);
        assert!(e.aliases().unwrap().is_empty());
    }

    #[test]
    fn rules_sheet_extends_defaults() {
        let e = engine(vec![(
            "AliasRules",
            vec![row(&["kind", "pattern", "canonical"]), row(&["shipType", "ENTERPRISE", "HENERPRISE"])],
        )]);
        assert_eq!(
            e.normalize(KeyKind::ShipType, &Cell::from("enterprise")).unwrap(),
            Some("HENERPRISE".to_owned())
        );
    }

    #[test]
    fn missing_data_sheet_is_not_found() {
        let e = engine(vec![]);
        assert!(matches!(
            e.build_index(),
            Err(EngineError::Table(TableError::NotFound { .. }))
        ));
    }

    #[test]
    fn bom_requires_both_sheets() {
        let e = engine(vec![("BOM_Data", vec![row(&["Parent", "Component", "Quantity"])])]);
        assert!(matches!(
            e.rollup_bom("A", 1.0),
            Err(EngineError::Table(TableError::NotFound { .. }))
        ));
    }

    #[test]
    fn param_lookup_normalizes_raw_labels() {
        let e = engine(vec![(
            "Ship_Parameters",
            vec![
                row(&["Ship type", "Ship duration type", "Ship level"]),
                row(&["Henerprise", "Epic", "8"]),
            ],
        )]);
        let lookup = e.param_for_pair("henerprise", "epic").unwrap();
        assert_eq!(lookup.ship_type, "HENERPRISE");
        assert_eq!(lookup.level, Some(Cell::from("8")));
        assert_eq!(e.param_for_pair("BCR", "SHORT").unwrap().level, None);
    }
}
