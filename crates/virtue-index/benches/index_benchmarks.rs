//! Index build, projection and pivot throughput.
//!
//! Synthetic mission sheets are generated from a fixed-seed PCG stream so runs
//! are comparable. Labels mix canonical tokens with raw spellings so the
//! normalizer exercises aliases, rules and the fallback.
//!
//! Run with: `cargo bench --bench index_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use virtue_index::prelude::*;
use virtue_index::project::project;
use virtue_keys::prelude::*;
use virtue_table::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SHIPS: &[&str] = &["Atreggies Henliner", "BCR", "chicken one", "Henny", "Defihent", "VOYEGGER"];
const DURATIONS: &[&str] = &["short", "Long", "EPIC", "tutorial"];
const TARGETS: &[&str] = &["Puzzle cube", "GOLD_METEORITE", "book of basan", "Unknown", "Lunar stone"];
const RARITIES: &[&str] = &["COMMON", "RARE", "EPIC", "LEGENDARY"];

fn normalizer() -> Normalizer {
    let mut aliases = AliasTable::new();
    aliases.insert(KeyKind::ShipType, "Henny", "HENERPRISE");
    Normalizer::new(aliases, RuleTable::with_defaults())
}

/// A raw drop sheet with `rows` data rows.
fn synthetic_sheet(rows: usize) -> Table {
    let mut rng = Pcg64::seed_from_u64(0x5eed);
    let mut all = Vec::with_capacity(rows + 1);
    all.push(
        [
            "Ship type",
            "Ship duration type",
            "level",
            "Target artifact",
            "Artifact type",
            "Artifact tier",
            "Artifact rarity",
            "Total drops",
        ]
        .iter()
        .map(|h| Cell::from(*h))
        .collect::<Vec<_>>(),
    );
    for _ in 0..rows {
        let pick = |rng: &mut Pcg64, list: &[&str]| Cell::from(list[rng.gen_range(0..list.len())]);
        all.push(vec![
            pick(&mut rng, SHIPS),
            pick(&mut rng, DURATIONS),
            Cell::from(rng.gen_range(0..9i32)),
            pick(&mut rng, TARGETS),
            pick(&mut rng, TARGETS),
            Cell::from(rng.gen_range(1..5i32)),
            pick(&mut rng, RARITIES),
            Cell::from(rng.gen_range(0..20i32)),
        ]);
    }
    Table::from_rows("MissionDataRaw", all)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_index_build(c: &mut Criterion) {
    let n = normalizer();
    let mut group = c.benchmark_group("mission_index_build");
    for rows in [1_000usize, 10_000] {
        let sheet = synthetic_sheet(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &sheet, |b, sheet| {
            b.iter(|| MissionIndex::build(black_box(sheet), &MissionColumns::default(), &n).unwrap());
        });
    }
    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let n = normalizer();
    let index = MissionIndex::build(&synthetic_sheet(10_000), &MissionColumns::default(), &n).unwrap();
    let orders = CanonicalOrders::default();
    let options = ProjectOptions::default();
    let params = ParamLevelMap::new();
    c.bench_function("projection_10k_rows", |b| {
        b.iter(|| project(black_box(&index), &params, &orders, &options));
    });
}

fn bench_pivot(c: &mut Criterion) {
    let sheet = synthetic_sheet(10_000);
    let spec = PivotSpec {
        key_columns: ["Ship type", "Ship duration type", "level", "Target artifact"]
            .map(str::to_owned)
            .to_vec(),
        ..PivotSpec::default()
    };
    let orders = CanonicalOrders::default();
    c.bench_function("pivot_10k_rows", |b| {
        b.iter(|| WideTable::aggregate(black_box(&sheet), &spec, &orders).unwrap());
    });
}

criterion_group!(benches, bench_index_build, bench_projection, bench_pivot);
criterion_main!(benches);
