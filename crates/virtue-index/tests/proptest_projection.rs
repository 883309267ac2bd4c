//! Property tests for projection ordering.
//!
//! Whatever order rows arrive in, a projection over canonical keys must come
//! out sorted by canonical position, and every indexed row must appear.

use proptest::prelude::*;
use virtue_index::prelude::*;
use virtue_index::project::project;
use virtue_keys::prelude::*;
use virtue_table::prelude::*;

const SHIPS: [&str; 4] = ["BCR", "CHICKEN_ONE", "HENERPRISE", "ATREGGIES"];
const DURATIONS: [&str; 3] = ["EPIC", "SHORT", "LONG"];
const TARGETS: [&str; 4] = ["PUZZLE_CUBE", "UNKNOWN", "BOOK_OF_BASAN", "GOLD_METEORITE"];

fn key_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    (0..SHIPS.len(), 0..DURATIONS.len(), 0..TARGETS.len())
}

fn table(keys: &[(usize, usize, usize)]) -> Table {
    let mut all = vec![vec![
        Cell::from("shipType"),
        Cell::from("shipDurationType"),
        Cell::from("level"),
        Cell::from("targetArtifact"),
    ]];
    for &(s, d, t) in keys {
        all.push(vec![
            Cell::from(SHIPS[s]),
            Cell::from(DURATIONS[d]),
            Cell::from(0),
            Cell::from(TARGETS[t]),
        ]);
    }
    Table::from_rows("MissionDataRaw", all)
}

fn projected_keys(keys: &[(usize, usize, usize)]) -> Vec<(usize, usize, usize)> {
    let orders = CanonicalOrders::default();
    let index = MissionIndex::build(&table(keys), &MissionColumns::default(), &Normalizer::with_default_rules()).unwrap();
    let options = ProjectOptions {
        include_header_row: false,
        ..ProjectOptions::default()
    };
    let p = project(&index, &ParamLevelMap::new(), &orders, &options);
    if p.is_no_match() {
        return Vec::new();
    }
    p.rows()
        .iter()
        .map(|r| {
            let pos = |kind, cell: &Cell| orders.position(kind, &cell.as_text()).unwrap();
            (
                pos(KeyKind::ShipType, &r[0]),
                pos(KeyKind::ShipDurationType, &r[1]),
                pos(KeyKind::TargetArtifact, &r[3]),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn projection_is_sorted_and_complete(keys in prop::collection::vec(key_strategy(), 0..40)) {
        let out = projected_keys(&keys);
        prop_assert_eq!(out.len(), keys.len());
        let mut sorted = out.clone();
        sorted.sort();
        prop_assert_eq!(out, sorted);
    }

    #[test]
    fn insertion_order_does_not_matter(keys in prop::collection::vec(key_strategy(), 0..40)) {
        let mut reversed = keys.clone();
        reversed.reverse();
        prop_assert_eq!(projected_keys(&keys), projected_keys(&reversed));
    }
}
