//! Virtue BOM -- Netted bill-of-materials explosion.
//!
//! Given a parent/component/quantity edge list and on-hand stock, computes
//! how much of each leaf component must be ordered or built to produce a
//! quantity of a top-level assembly. Stock is netted at every level before
//! demand propagates to children.
//!
//! # Example
//!
//! ```
//! use virtue_bom::prelude::*;
//!
//! let bom = Bom::from_edges(vec![BomEdge::new("A", "B", 2)]);
//! let stock = Inventory::from_records(vec![InventoryRecord::new("B", 5.0)]);
//! assert_eq!(bom.rollup("A", 10.0, &stock).unwrap(), vec![("B".to_owned(), 15.0)]);
//! ```

#![deny(unsafe_code)]

pub mod explode;
pub mod model;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or exploding a bill of materials.
#[derive(Debug, thiserror::Error)]
pub enum BomError {
    /// A BOM or inventory table or column is missing.
    #[error(transparent)]
    Table(#[from] virtue_table::TableError),

    /// A quantity cell could not be read as a non-negative integer.
    #[error("invalid BOM quantity '{value}' for {parent} -> {component} at row {row}")]
    InvalidBomQuantity {
        parent: String,
        component: String,
        row: usize,
        value: String,
    },

    /// The explosion revisited an item already on the active path.
    #[error("cyclic BOM: {}", path.join(" -> "))]
    CyclicBom { path: Vec<String> },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::explode::{rollup_rows, Bom, Inventory, Requirements, ROLLUP_HEADER};
    pub use crate::model::{load_edges, load_inventory, BomColumns, BomEdge, InventoryColumns, InventoryRecord};
    pub use crate::BomError;
}
