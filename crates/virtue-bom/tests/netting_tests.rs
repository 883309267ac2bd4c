//! Netting tests driven from sheet-shaped tables, plus property tests for
//! the zero short-circuit and netting conservation.

use proptest::prelude::*;
use virtue_bom::prelude::*;
use virtue_table::prelude::*;

fn bom_sheet() -> Table {
    Table::from_rows(
        "BOM_Data",
        vec![
            vec!["Parent".into(), "Component".into(), "Quantity".into()],
            vec!["Bike".into(), "Wheel".into(), 2.into()],
            vec!["Bike".into(), "Frame".into(), 1.into()],
            vec!["Wheel".into(), "Spoke".into(), 32.into()],
            vec!["Wheel".into(), "Rim".into(), 1.into()],
            vec!["Frame".into(), "Tube".into(), "3".into()],
        ],
    )
}

fn inventory_sheet() -> Table {
    Table::from_rows(
        "Inventory_Stock",
        vec![
            vec!["Component".into(), "On Hand".into()],
            vec!["Wheel".into(), 1.into()],
            vec!["Spoke".into(), 10.into()],
            vec!["Tube".into(), "0.5".into()],
        ],
    )
}

fn load() -> (Bom, Inventory) {
    let edges = load_edges(&bom_sheet(), &BomColumns::default()).unwrap();
    let stock = load_inventory(&inventory_sheet(), &InventoryColumns::default()).unwrap();
    (Bom::from_edges(edges), Inventory::from_records(stock))
}

// -- sheet-driven -------------------------------------------------------------

#[test]
fn multi_level_rollup_nets_at_every_level() {
    let (bom, stock) = load();
    let out = bom.rollup("Bike", 2.0, &stock).unwrap();
    // Wheels: 4 - 1 = 3 -> spokes 96 - 10 = 86, rims 3. Frames 2 -> tubes 6 - 0.5.
    assert_eq!(
        out,
        vec![
            ("Spoke".to_owned(), 86.0),
            ("Rim".to_owned(), 3.0),
            ("Tube".to_owned(), 5.5),
        ]
    );
}

#[test]
fn rollup_rows_start_with_header() {
    let (bom, stock) = load();
    let rows = rollup_rows(&bom.rollup("Bike", 1.0, &stock).unwrap());
    assert_eq!(rows[0], ROLLUP_HEADER.iter().map(|h| Cell::from(*h)).collect::<Vec<_>>());
    assert_eq!(rows.len(), 4);
}

#[test]
fn empty_sheets_mean_leaf_with_no_stock() {
    let edges = load_edges(&Table::empty("BOM_Data"), &BomColumns::default()).unwrap();
    let stock = load_inventory(&Table::empty("Inventory_Stock"), &InventoryColumns::default()).unwrap();
    let out = Bom::from_edges(edges).rollup("Bike", 3.0, &Inventory::from_records(stock)).unwrap();
    assert_eq!(out, vec![("Bike".to_owned(), 3.0)]);
}

// -- properties ---------------------------------------------------------------

/// Edges over items `0..8` that only point to higher-numbered items, so the
/// graph is acyclic.
fn dag_strategy() -> impl Strategy<Value = Vec<BomEdge>> {
    prop::collection::vec((0u8..7, 1u8..8, 1u64..4), 0..16).prop_map(|raw| {
        raw.into_iter()
            .filter(|(p, c, _)| p < c)
            .map(|(p, c, q)| BomEdge::new(format!("I{p}"), format!("I{c}"), q))
            .collect()
    })
}

fn stock_strategy() -> impl Strategy<Value = Vec<InventoryRecord>> {
    prop::collection::vec((0u8..8, 0u32..20), 0..8).prop_map(|raw| {
        raw.into_iter()
            .map(|(i, q)| InventoryRecord::new(format!("I{i}"), f64::from(q)))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn zero_demand_yields_nothing(edges in dag_strategy(), stock in stock_strategy()) {
        let bom = Bom::from_edges(edges);
        let out = bom.rollup("I0", 0.0, &Inventory::from_records(stock)).unwrap();
        prop_assert!(out.is_empty());
    }

    #[test]
    fn leaf_netting_conserves_quantity(qty in 0u32..1000, per in 1u64..10, on_hand in 0u32..5000) {
        let bom = Bom::from_edges([BomEdge::new("A", "B", per)]);
        let stock = Inventory::from_records([InventoryRecord::new("B", f64::from(on_hand))]);
        let out = bom.rollup("A", f64::from(qty), &stock).unwrap();
        let gross = f64::from(qty) * per as f64;
        let expected = (gross - f64::from(on_hand)).max(0.0);
        let got = out.iter().find(|(c, _)| c == "B").map_or(0.0, |(_, q)| *q);
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn stock_never_increases_requirements(edges in dag_strategy(), stock in stock_strategy(), qty in 1u32..50) {
        let bom = Bom::from_edges(edges);
        let with_stock = bom.rollup("I0", f64::from(qty), &Inventory::from_records(stock)).unwrap();
        let without = bom.rollup("I0", f64::from(qty), &Inventory::default()).unwrap();
        for (component, q) in &with_stock {
            let baseline = without.iter().find(|(c, _)| c == component).map_or(0.0, |(_, b)| *b);
            prop_assert!(*q <= baseline, "{component}: {q} > {baseline}");
        }
    }
}
