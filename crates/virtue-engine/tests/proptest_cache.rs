//! Property: serving artifacts from the cache never changes results.

use std::sync::Arc;

use proptest::prelude::*;
use virtue_engine::prelude::*;

const SHIPS: &[&str] = &["Henerprise", "BCR", "chicken one", "Mystery Ship", "  voyegger "];
const DURATIONS: &[&str] = &["Short", "long", "Epic", "tutorial", ""];
const TARGETS: &[&str] = &["Gold meteorite", "Puzzle cube", "Book of Basan", "Odd Rock"];
const ARTIFACTS: &[&str] = &["GOLD_METEORITE", "PUZZLE_CUBE", "Odd Rock"];
const RARITIES: &[&str] = &["COMMON", "RARE", "EPIC"];

/// A data row in pivot layout; drops carry full f64 precision.
fn mission_row() -> impl Strategy<Value = Vec<Cell>> {
    (
        0..SHIPS.len(),
        0..DURATIONS.len(),
        0u32..3,
        0..TARGETS.len(),
        (0..ARTIFACTS.len(), 1u32..4, 0..RARITIES.len()),
        0.0f64..50.0,
    )
        .prop_map(|(s, d, level, t, (a, tier, r), drops)| {
            vec![
                Cell::from(SHIPS[s]),
                Cell::from(DURATIONS[d]),
                Cell::from(level),
                Cell::from(TARGETS[t]),
                Cell::from(ARTIFACTS[a]),
                Cell::from(tier),
                Cell::from(RARITIES[r]),
                Cell::from(drops),
            ]
        })
}

fn param_row() -> impl Strategy<Value = Vec<Cell>> {
    let level = prop_oneof![(0u32..3).prop_map(f64::from), 0.0f64..3.0];
    (0..SHIPS.len(), 0..DURATIONS.len(), level)
        .prop_map(|(s, d, level)| vec![Cell::from(SHIPS[s]), Cell::from(DURATIONS[d]), Cell::from(level)])
}

fn solver_row() -> impl Strategy<Value = Vec<Cell>> {
    (0..SHIPS.len(), 0..DURATIONS.len(), 0u32..3, 0..TARGETS.len(), 0.0f64..20.0).prop_map(
        |(s, d, level, t, flights)| {
            vec![
                Cell::from(SHIPS[s]),
                Cell::from(DURATIONS[d]),
                Cell::from(level),
                Cell::from(TARGETS[t]),
                Cell::from(flights),
            ]
        },
    )
}

fn with_header(header: &[&str], rows: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let mut sheet = vec![header.iter().map(|h| Cell::from(*h)).collect::<Vec<_>>()];
    sheet.extend(rows);
    sheet
}

fn config(ttl_secs: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.mission_columns.level = "Ship level".into();
    config.cache = CacheTtls {
        index_secs: ttl_secs,
        params_secs: ttl_secs,
        aliases_secs: ttl_secs,
        artifacts_secs: ttl_secs,
    };
    config
}

/// Data, params and solver sheets, plus the stacked pivot of the data sheet
/// as the artifacts-by-params source.
fn workbook(missions: Vec<Vec<Cell>>, params: Vec<Vec<Cell>>, solver: Vec<Vec<Cell>>) -> MemoryWorkbook {
    let mut book = MemoryWorkbook::new();
    book.insert_sheet(
        "AllArtifactData",
        with_header(
            &[
                "Ship type",
                "Ship duration type",
                "Ship level",
                "Target artifact",
                "Artifact type",
                "Artifact tier",
                "Artifact rarity",
                "Total drops",
            ],
            missions,
        ),
    );
    book.insert_sheet(
        "Ship_Parameters",
        with_header(&["Ship type", "Ship duration type", "Ship level"], params),
    );
    book.insert_sheet(
        "NewSolver",
        with_header(
            &["Ship type", "Ship duration type", "Ship level", "Target artifact", "Flights"],
            solver,
        ),
    );

    let mut seed = Engine::new(book, CacheLayer::disabled(), config(0));
    let wide = seed.aggregate().unwrap();
    seed.workbook_mut()
        .insert_sheet("ArtifactsByParams", wide.to_rows(HeaderLayout::Stacked));
    seed.into_workbook()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn cached_results_match_fresh_results(
        missions in prop::collection::vec(mission_row(), 0..24),
        params in prop::collection::vec(param_row(), 0..6),
        solver in prop::collection::vec(solver_row(), 0..8),
    ) {
        let book = workbook(missions, params, solver);
        let fresh = Engine::new(book.clone(), CacheLayer::disabled(), config(0));
        let cached = Engine::new(book, CacheLayer::new(Arc::new(MemoryCache::new())), config(60));

        let expected = fresh.results().unwrap();
        // First call populates the cache, second is served from it.
        prop_assert_eq!(&cached.results().unwrap(), &expected);
        prop_assert_eq!(&cached.results().unwrap(), &expected);
        prop_assert_eq!(cached.coverage().unwrap(), fresh.coverage().unwrap());

        let params = fresh.build_param_level_map().unwrap();
        prop_assert_eq!(&cached.build_param_level_map().unwrap(), &params);
        prop_assert_eq!(&cached.build_param_level_map().unwrap(), &params);

        let drops = fresh.artifacts_index(false).unwrap();
        prop_assert_eq!(&cached.artifacts_index(false).unwrap(), &drops);
        prop_assert_eq!(&cached.artifacts_index(false).unwrap(), &drops);

        // Served from the cached drop index built above.
        prop_assert_eq!(cached.solver_summary().unwrap(), fresh.solver_summary().unwrap());
    }
}
