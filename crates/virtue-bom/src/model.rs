//! Typed BOM and inventory records, read from tables.

use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_table::cell::Cell;
use virtue_table::table::{ColumnSpec, Table};

use crate::BomError;

/// One `parent -> component x quantity` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEdge {
    pub parent: String,
    pub component: String,
    /// Units of `component` per unit of `parent`.
    pub quantity: u64,
}

impl BomEdge {
    pub fn new(parent: impl Into<String>, component: impl Into<String>, quantity: u64) -> Self {
        Self {
            parent: parent.into(),
            component: component.into(),
            quantity,
        }
    }
}

/// On-hand stock of one component. May be fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub component: String,
    pub on_hand: f64,
}

impl InventoryRecord {
    pub fn new(component: impl Into<String>, on_hand: f64) -> Self {
        Self {
            component: component.into(),
            on_hand,
        }
    }
}

/// Header names of the BOM sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BomColumns {
    pub parent: String,
    pub component: String,
    pub quantity: String,
}

impl Default for BomColumns {
    fn default() -> Self {
        Self {
            parent: "Parent".to_owned(),
            component: "Component".to_owned(),
            quantity: "Quantity".to_owned(),
        }
    }
}

/// Header names of the inventory sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryColumns {
    pub component: String,
    pub on_hand: String,
}

impl Default for InventoryColumns {
    fn default() -> Self {
        Self {
            component: "Component".to_owned(),
            on_hand: "On Hand".to_owned(),
        }
    }
}

fn resolve(table: &Table, name: &str) -> Result<usize, BomError> {
    Ok(table.resolve(&ColumnSpec::new(name, name))?)
}

/// Read BOM edges in sheet order.
///
/// Rows with a blank parent or component are skipped. Quantities are read as
/// numbers and truncated toward zero.
///
/// # Errors
///
/// Returns [`BomError::Table`] if a column is missing and
/// [`BomError::InvalidBomQuantity`] if a quantity is blank, non-numeric or
/// negative.
pub fn load_edges(table: &Table, columns: &BomColumns) -> Result<Vec<BomEdge>, BomError> {
    if table.all().is_empty() {
        return Ok(Vec::new());
    }
    let parent_col = resolve(table, &columns.parent)?;
    let component_col = resolve(table, &columns.component)?;
    let quantity_col = resolve(table, &columns.quantity)?;

    let mut edges = Vec::new();
    for (i, row) in table.rows().iter().enumerate() {
        let (Some(parent), Some(component)) = (
            Table::cell(row, parent_col).trimmed(),
            Table::cell(row, component_col).trimmed(),
        ) else {
            continue;
        };
        let raw = Table::cell(row, quantity_col);
        let Some(quantity) = parse_quantity(raw) else {
            return Err(BomError::InvalidBomQuantity {
                parent,
                component,
                row: i + 2,
                value: raw.as_text(),
            });
        };
        edges.push(BomEdge {
            parent,
            component,
            quantity,
        });
    }
    debug!(table = table.name(), edges = edges.len(), "BOM edges loaded");
    Ok(edges)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_quantity(cell: &Cell) -> Option<u64> {
    cell.as_number()
        .filter(|n| *n >= 0.0 && *n < u64::MAX as f64)
        .map(|n| n.trunc() as u64)
}

/// Read inventory records in sheet order.
///
/// Rows with a blank component are skipped; unparseable stock counts as zero.
///
/// # Errors
///
/// Returns [`BomError::Table`] if a column is missing.
pub fn load_inventory(table: &Table, columns: &InventoryColumns) -> Result<Vec<InventoryRecord>, BomError> {
    if table.all().is_empty() {
        return Ok(Vec::new());
    }
    let component_col = resolve(table, &columns.component)?;
    let on_hand_col = resolve(table, &columns.on_hand)?;
    let records: Vec<InventoryRecord> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let component = Table::cell(row, component_col).trimmed()?;
            let on_hand = Table::cell(row, on_hand_col).as_number().unwrap_or(0.0);
            Some(InventoryRecord { component, on_hand })
        })
        .collect();
    debug!(table = table.name(), records = records.len(), "inventory loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bom_table(rows: Vec<Vec<Cell>>) -> Table {
        let mut all = vec![vec!["Parent".into(), "Component".into(), "Quantity".into()]];
        all.extend(rows);
        Table::from_rows("BOM_Data", all)
    }

    #[test]
    fn edges_load_in_order_and_truncate() {
        let t = bom_table(vec![
            vec!["A".into(), "B".into(), 2.into()],
            vec![" A ".into(), "C".into(), "3.7".into()],
            vec!["".into(), "D".into(), 1.into()],
        ]);
        let edges = load_edges(&t, &BomColumns::default()).unwrap();
        assert_eq!(edges, vec![BomEdge::new("A", "B", 2), BomEdge::new("A", "C", 3)]);
    }

    #[test]
    fn malformed_quantity_is_an_error() {
        let t = bom_table(vec![
            vec!["A".into(), "B".into(), 2.into()],
            vec!["A".into(), "C".into(), "lots".into()],
        ]);
        let err = load_edges(&t, &BomColumns::default()).unwrap_err();
        assert!(matches!(err, BomError::InvalidBomQuantity { row: 3, ref value, .. } if value == "lots"));
    }

    #[test]
    fn negative_quantity_is_an_error() {
        let t = bom_table(vec![vec!["A".into(), "B".into(), (-1).into()]]);
        assert!(load_edges(&t, &BomColumns::default()).is_err());
    }

    #[test]
    fn inventory_defaults_unparseable_to_zero() {
        let t = Table::from_rows(
            "Inventory_Stock",
            vec![
                vec!["Component".into(), "On Hand".into()],
                vec!["B".into(), "2.5".into()],
                vec!["C".into(), "n/a".into()],
                vec!["".into(), 4.into()],
            ],
        );
        let inv = load_inventory(&t, &InventoryColumns::default()).unwrap();
        assert_eq!(inv, vec![InventoryRecord::new("B", 2.5), InventoryRecord::new("C", 0.0)]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let t = Table::from_rows("Inventory_Stock", vec![vec!["Component".into()]]);
        assert!(matches!(
            load_inventory(&t, &InventoryColumns::default()),
            Err(BomError::Table(_))
        ));
    }
}
