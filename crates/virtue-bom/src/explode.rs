//! Netted explosion.
//!
//! At each item, on-hand stock is subtracted from the gross requirement.
//! Whatever remains is either recorded (leaf) or multiplied down each child
//! edge (assembly). Stock is not consumed: a component reached along two
//! paths is netted against its full stock both times.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;
use virtue_table::cell::Cell;

use crate::model::{BomEdge, InventoryRecord};
use crate::BomError;

/// Header of [`rollup_rows`].
pub const ROLLUP_HEADER: [&str; 2] = ["Component", "Net Quantity Required (to order/build)"];

/// Child edges grouped by parent, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bom {
    children: HashMap<String, Vec<(String, u64)>>,
}

impl Bom {
    pub fn from_edges(edges: impl IntoIterator<Item = BomEdge>) -> Self {
        let mut children: HashMap<String, Vec<(String, u64)>> = HashMap::new();
        for edge in edges {
            children
                .entry(edge.parent)
                .or_default()
                .push((edge.component, edge.quantity));
        }
        Self { children }
    }

    /// Child edges of `item`; empty for a leaf.
    pub fn children(&self, item: &str) -> &[(String, u64)] {
        self.children.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Propagate `gross` units of `item` into `acc`.
    ///
    /// # Errors
    ///
    /// Returns [`BomError::CyclicBom`] if an assembly with outstanding demand
    /// is reached again below itself.
    pub fn explode(&self, item: &str, gross: f64, inventory: &Inventory, acc: &mut Requirements) -> Result<(), BomError> {
        let mut path = Vec::new();
        self.explode_inner(item, gross, inventory, acc, &mut path)
    }

    fn explode_inner(
        &self,
        item: &str,
        gross: f64,
        inventory: &Inventory,
        acc: &mut Requirements,
        path: &mut Vec<String>,
    ) -> Result<(), BomError> {
        let net = (gross - inventory.on_hand(item)).max(0.0);
        if net == 0.0 {
            return Ok(());
        }
        let children = self.children(item);
        if children.is_empty() {
            acc.add(item, net);
            return Ok(());
        }
        if path.iter().any(|p| p == item) {
            let mut cycle = path.clone();
            cycle.push(item.to_owned());
            return Err(BomError::CyclicBom { path: cycle });
        }
        path.push(item.to_owned());
        for (component, per_parent) in children {
            #[allow(clippy::cast_precision_loss)]
            let child_gross = net * *per_parent as f64;
            self.explode_inner(component, child_gross, inventory, acc, path)?;
        }
        path.pop();
        Ok(())
    }

    /// Net requirements for `quantity` units of `item`: entries with a
    /// positive total, in first-accumulated order.
    ///
    /// # Errors
    ///
    /// Returns [`BomError::CyclicBom`] on a cycle.
    pub fn rollup(&self, item: &str, quantity: f64, inventory: &Inventory) -> Result<Vec<(String, f64)>, BomError> {
        let mut acc = Requirements::default();
        self.explode(item, quantity, inventory, &mut acc)?;
        let out = acc.into_positive();
        debug!(item, quantity, components = out.len(), "BOM rolled up");
        Ok(out)
    }
}

/// On-hand stock by component. Later records replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    on_hand: HashMap<String, f64>,
}

impl Inventory {
    pub fn from_records(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        Self {
            on_hand: records.into_iter().map(|r| (r.component, r.on_hand)).collect(),
        }
    }

    /// Stock of `item`, zero when unlisted.
    pub fn on_hand(&self, item: &str) -> f64 {
        self.on_hand.get(item).copied().unwrap_or(0.0)
    }
}

/// Per-request accumulator of leaf requirements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirements {
    totals: IndexMap<String, f64>,
}

impl Requirements {
    pub fn add(&mut self, item: &str, quantity: f64) {
        *self.totals.entry(item.to_owned()).or_insert(0.0) += quantity;
    }

    pub fn get(&self, item: &str) -> Option<f64> {
        self.totals.get(item).copied()
    }

    /// Entries with a positive total, in first-accumulated order.
    pub fn into_positive(self) -> Vec<(String, f64)> {
        self.totals.into_iter().filter(|(_, q)| *q > 0.0).collect()
    }
}

/// Render a rollup under [`ROLLUP_HEADER`].
pub fn rollup_rows(rollup: &[(String, f64)]) -> Vec<Vec<Cell>> {
    let mut out = vec![ROLLUP_HEADER.iter().map(|h| Cell::from(*h)).collect::<Vec<_>>()];
    out.extend(
        rollup
            .iter()
            .map(|(component, qty)| vec![Cell::from(component.as_str()), Cell::Number(*qty)]),
    );
    out
}
