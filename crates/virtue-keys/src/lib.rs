//! Virtue Keys -- Canonical key kinds, alias tables and label normalization.
//!
//! Mission data arrives with free-text labels: `"Atreggies Henliner"`,
//! `"atreggies"`, `"ATREGGIES"` all mean the same ship. This crate maps such
//! labels to canonical upper-snake tokens so that downstream indexes can key
//! on them.
//!
//! # Modules
//!
//! - [`kind`]: the three key kinds and their canonical order lists.
//! - [`alias`]: curated `kind, alias, canonical` tables and the bootstrap
//!   generator that seeds them from observed data.
//! - [`rules`]: ordered, data-driven heuristic patterns per kind.
//! - [`normalize`]: the [`Normalizer`](normalize::Normalizer) combining
//!   aliases, rules and the upper-snake fallback.
//!
//! # Example
//!
//! ```
//! use virtue_keys::prelude::*;
//!
//! let mut aliases = AliasTable::new();
//! aliases.insert(KeyKind::ShipType, "Henny", "HENERPRISE");
//! let normalizer = Normalizer::new(aliases, RuleTable::with_defaults());
//!
//! assert_eq!(normalizer.normalize_str(KeyKind::ShipType, "Henny").as_deref(), Some("HENERPRISE"));
//! assert_eq!(normalizer.normalize_str(KeyKind::ShipType, "Defihent").as_deref(), Some("CHICKFIANT"));
//! assert_eq!(normalizer.normalize_str(KeyKind::ShipType, "new ship").as_deref(), Some("NEW_SHIP"));
//! assert_eq!(normalizer.normalize_str(KeyKind::ShipType, "   "), None);
//! ```

#![deny(unsafe_code)]

pub mod alias;
pub mod kind;
pub mod normalize;
pub mod rules;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading key configuration.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// A kind name did not match any known [`KeyKind`](kind::KeyKind).
    #[error("unknown key kind '{name}'. Known kinds: [shipType, shipDurationType, targetArtifact]")]
    UnknownKind { name: String },

    /// A heuristic rule pattern failed to compile.
    #[error("invalid {kind} rule pattern '{pattern}': {details}")]
    InvalidPattern {
        kind: String,
        pattern: String,
        details: String,
    },

    /// A rules table lacked a required column.
    #[error(transparent)]
    Table(#[from] virtue_table::TableError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::alias::{AliasBootstrap, AliasColumns, AliasRow, AliasTable};
    pub use crate::kind::{CanonicalOrders, KeyKind};
    pub use crate::normalize::{upper_snake, Normalizer};
    pub use crate::rules::{HeuristicRule, RuleSpec, RuleTable};
    pub use crate::KeyError;
}
