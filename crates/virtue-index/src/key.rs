//! The canonical 4-tuple key.
//!
//! A [`FlightKey`] identifies one mission configuration: ship type, duration,
//! level and target artifact. Ship, duration and target are normalized
//! through a [`Normalizer`]; the level is taken verbatim (trimmed text), as
//! it is a number rather than a label.

use serde::{Deserialize, Serialize};
use virtue_keys::kind::KeyKind;
use virtue_keys::normalize::Normalizer;
use virtue_table::cell::Cell;

/// Why a row could not produce a [`FlightKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Ship type was blank.
    UnmappedShip,
    /// Duration was blank.
    UnmappedDuration,
    /// Target artifact was blank.
    MissingTarget,
    /// Level was blank.
    MissingLevel,
}

/// Canonical `(ship, duration, level, target)` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub ship_type: String,
    pub ship_duration_type: String,
    pub level: String,
    pub target_artifact: String,
}

impl FlightKey {
    /// Build a key from already canonical parts.
    pub fn new(
        ship_type: impl Into<String>,
        ship_duration_type: impl Into<String>,
        level: impl Into<String>,
        target_artifact: impl Into<String>,
    ) -> Self {
        Self {
            ship_type: ship_type.into(),
            ship_duration_type: ship_duration_type.into(),
            level: level.into(),
            target_artifact: target_artifact.into(),
        }
    }

    /// Normalize raw cells into a key.
    ///
    /// # Errors
    ///
    /// Returns the first [`SkipReason`] that applies, checked in the order
    /// ship, duration, target, level.
    pub fn resolve(
        normalizer: &Normalizer,
        ship: &Cell,
        duration: &Cell,
        level: &Cell,
        target: &Cell,
    ) -> Result<Self, SkipReason> {
        let ship_type = normalizer
            .normalize(KeyKind::ShipType, ship)
            .ok_or(SkipReason::UnmappedShip)?;
        let ship_duration_type = normalizer
            .normalize(KeyKind::ShipDurationType, duration)
            .ok_or(SkipReason::UnmappedDuration)?;
        let target_artifact = normalizer
            .normalize(KeyKind::TargetArtifact, target)
            .ok_or(SkipReason::MissingTarget)?;
        let level = level.trimmed().ok_or(SkipReason::MissingLevel)?;
        Ok(Self {
            ship_type,
            ship_duration_type,
            level,
            target_artifact,
        })
    }
}

impl std::fmt::Display for FlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.ship_type, self.ship_duration_type, self.level, self.target_artifact
        )
    }
}
