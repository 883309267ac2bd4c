//! Key kinds and their canonical order lists.
//!
//! Each [`KeyKind`] owns a fixed, ordered list of canonical tokens. The list
//! serves two purposes: deciding whether an observed token is "known", and
//! giving output a deterministic order that does not depend on the order rows
//! happened to arrive in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KeyError;

// ---------------------------------------------------------------------------
// KeyKind
// ---------------------------------------------------------------------------

/// One of the three normalized key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyKind {
    /// Ship type, e.g. `HENERPRISE`.
    ShipType,
    /// Mission duration, e.g. `SHORT`.
    ShipDurationType,
    /// Artifact a mission targets, e.g. `BOOK_OF_BASAN`.
    TargetArtifact,
}

impl KeyKind {
    /// All kinds in declaration order.
    pub const ALL: [KeyKind; 3] = [
        KeyKind::ShipType,
        KeyKind::ShipDurationType,
        KeyKind::TargetArtifact,
    ];

    /// The name used in alias and rule tables.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::ShipType => "shipType",
            KeyKind::ShipDurationType => "shipDurationType",
            KeyKind::TargetArtifact => "targetArtifact",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyKind {
    type Err = KeyError;

    /// Parses the table name of a kind, ignoring case and surrounding space.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        KeyKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| KeyError::UnknownKind {
                name: trimmed.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// CanonicalOrders
// ---------------------------------------------------------------------------

const SHIP_TYPES: &[&str] = &[
    "CHICKEN_ONE",
    "CHICKEN_NINE",
    "ATREGGIES",
    "CHICKEN_HEAVY",
    "BCR",
    "MILLENIUM_CHICKEN",
    "CORELLIHEN_CORVETTE",
    "GALEGGTICA",
    "CHICKFIANT",
    "VOYEGGER",
    "HENERPRISE",
];

const DURATION_TYPES: &[&str] = &["TUTORIAL", "SHORT", "LONG", "EPIC"];

const TARGET_ARTIFACTS: &[&str] = &[
    "UNKNOWN",
    "GOLD_METEORITE",
    "TAU_CETI_GEODE",
    "SOLAR_TITANIUM",
    "LUNAR_TOTEM",
    "DEMETERS_NECKLACE",
    "TUNGSTEN_ANKH",
    "PUZZLE_CUBE",
    "INTERSTELLAR_COMPASS",
    "QUANTUM_METRONOME",
    "MERCURYS_LENS",
    "ORNATE_GUSSET",
    "THE_CHALICE",
    "BOOK_OF_BASAN",
    "PHOENIX_FEATHER",
    "VIAL_MARTIAN_DUST",
    "AURELIAN_BROOCH",
    "CARVED_RAINSTICK",
    "BEAK_OF_MIDAS",
    "SHIP_IN_A_BOTTLE",
    "TACHYON_DEFLECTOR",
    "DILITHIUM_MONOCLE",
    "TITANIUM_ACTUATOR",
    "NEODYMIUM_MEDALLION",
    "LIGHT_OF_EGGENDIL",
    "LUNAR_STONE_FRAGMENT",
    "LUNAR_STONE",
    "QUANTUM_STONE_FRAGMENT",
    "QUANTUM_STONE",
    "TACHYON_STONE_FRAGMENT",
    "TACHYON_STONE",
    "SOUL_STONE_FRAGMENT",
    "SOUL_STONE",
    "DILITHIUM_STONE_FRAGMENT",
    "DILITHIUM_STONE",
    "SHELL_STONE_FRAGMENT",
    "SHELL_STONE",
    "TERRA_STONE_FRAGMENT",
    "TERRA_STONE",
    "LIFE_STONE_FRAGMENT",
    "LIFE_STONE",
    "PROPHECY_STONE_FRAGMENT",
    "PROPHECY_STONE",
    "CLARITY_STONE_FRAGMENT",
    "CLARITY_STONE",
];

/// The canonical order list for every kind.
///
/// Defaults to the game's ship, duration and artifact enumerations; a
/// config file may replace any list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanonicalOrders {
    /// Ship types in display order.
    pub ship_type: Vec<String>,
    /// Duration types in display order.
    pub ship_duration_type: Vec<String>,
    /// Target artifacts in display order.
    pub target_artifact: Vec<String>,
}

impl Default for CanonicalOrders {
    fn default() -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| (*s).to_owned()).collect() };
        Self {
            ship_type: owned(SHIP_TYPES),
            ship_duration_type: owned(DURATION_TYPES),
            target_artifact: owned(TARGET_ARTIFACTS),
        }
    }
}

impl CanonicalOrders {
    /// The order list for `kind`.
    pub fn for_kind(&self, kind: KeyKind) -> &[String] {
        match kind {
            KeyKind::ShipType => &self.ship_type,
            KeyKind::ShipDurationType => &self.ship_duration_type,
            KeyKind::TargetArtifact => &self.target_artifact,
        }
    }

    /// Position of `token` in the order list for `kind`.
    pub fn position(&self, kind: KeyKind, token: &str) -> Option<usize> {
        self.for_kind(kind).iter().position(|t| t == token)
    }

    /// Returns `true` if `token` is canonical for `kind`.
    pub fn contains(&self, kind: KeyKind, token: &str) -> bool {
        self.position(kind, token).is_some()
    }

    /// Order observed keys: canonical keys first (in canonical order), then,
    /// if `include_unknowns`, the remaining observed keys in the order given.
    pub fn order_observed<'a, I>(&self, kind: KeyKind, observed: I, include_unknowns: bool) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let observed: Vec<&'a str> = observed.into_iter().collect();
        let mut out: Vec<&'a str> = self
            .for_kind(kind)
            .iter()
            .filter_map(|c| observed.iter().copied().find(|o| *o == c.as_str()))
            .collect();
        if include_unknowns {
            for key in &observed {
                if !self.contains(kind, key) && !out.contains(key) {
                    out.push(*key);
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in KeyKind::ALL {
            assert_eq!(kind.as_str().parse::<KeyKind>().unwrap(), kind);
        }
        assert_eq!(" SHIPTYPE ".parse::<KeyKind>().unwrap(), KeyKind::ShipType);
        assert!(matches!(
            "shipLevel".parse::<KeyKind>(),
            Err(KeyError::UnknownKind { .. })
        ));
    }

    #[test]
    fn kind_serializes_as_table_name() {
        let json = serde_json::to_string(&KeyKind::ShipDurationType).unwrap();
        assert_eq!(json, "\"shipDurationType\"");
    }

    #[test]
    fn default_orders_are_upper_snake_and_unique() {
        let orders = CanonicalOrders::default();
        for kind in KeyKind::ALL {
            let list = orders.for_kind(kind);
            for (i, token) in list.iter().enumerate() {
                assert_eq!(crate::normalize::upper_snake(token), *token);
                assert_eq!(orders.position(kind, token), Some(i));
            }
        }
        assert_eq!(orders.ship_type.len(), 11);
        assert_eq!(orders.ship_duration_type.len(), 4);
    }

    #[test]
    fn order_observed_puts_canonical_first_then_unknowns_in_seen_order() {
        let orders = CanonicalOrders::default();
        let observed = ["ZETA_SHIP", "HENERPRISE", "ALPHA_SHIP", "CHICKEN_ONE"];
        assert_eq!(
            orders.order_observed(KeyKind::ShipType, observed, true),
            vec!["CHICKEN_ONE", "HENERPRISE", "ZETA_SHIP", "ALPHA_SHIP"]
        );
        assert_eq!(
            orders.order_observed(KeyKind::ShipType, observed, false),
            vec!["CHICKEN_ONE", "HENERPRISE"]
        );
    }

    #[test]
    fn partial_config_keeps_default_lists() {
        let orders: CanonicalOrders =
            serde_json::from_str(r#"{ "shipDurationType": ["SHORT", "STANDARD"] }"#).unwrap();
        assert_eq!(orders.ship_duration_type, vec!["SHORT", "STANDARD"]);
        assert_eq!(orders.ship_type.len(), 11);
    }
}
