//! Heuristic pattern rules.
//!
//! After alias lookups miss, the normalizer consults an ordered list of
//! `(pattern -> canonical)` rules for the kind. Patterns are matched
//! case-insensitively against the whole label (they are anchored on
//! compile). The first matching rule wins.
//!
//! The built-in rules cover the display names and historical typos seen in
//! exported mission data. Additional rules are data: a sheet with
//! `kind, pattern, canonical` columns is appended after the built-ins via
//! [`RuleTable::extend_from_table`].

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use virtue_table::table::{ColumnSpec, Table};

use crate::kind::KeyKind;
use crate::normalize::upper_snake;
use crate::KeyError;

const DEFAULT_RULES: &[(KeyKind, &str, &str)] = &[
    (KeyKind::ShipType, r"ATREGGIES(?:[_\s-]?HENLINER)?", "ATREGGIES"),
    (KeyKind::ShipType, r"CORNISH[\s-]?HEN[\s-]?CORVETTE", "CORELLIHEN_CORVETTE"),
    (KeyKind::ShipType, r"DEFIHENT", "CHICKFIANT"),
    (KeyKind::ShipType, r"VOYEGGER", "VOYEGGER"),
    (KeyKind::ShipType, r"HENERPRISE", "HENERPRISE"),
    (KeyKind::ShipType, r"CHICKEN[\s-]?ONE", "CHICKEN_ONE"),
    (KeyKind::ShipType, r"CHICKEN[\s-]?NINE", "CHICKEN_NINE"),
    (KeyKind::ShipType, r"CHICKEN[\s-]?HEAVY", "CHICKEN_HEAVY"),
    (KeyKind::ShipType, r"BCR", "BCR"),
    (KeyKind::ShipType, r"MILLEN(IA|IU)M[\s-]?CHICKEN", "MILLENIUM_CHICKEN"),
    (KeyKind::ShipType, r"GALEGG(T|TT)ICA", "GALEGGTICA"),
    (KeyKind::ShipDurationType, r"SHORT", "SHORT"),
    (KeyKind::ShipDurationType, r"STANDARD", "STANDARD"),
    (KeyKind::ShipDurationType, r"EXTENDED", "EXTENDED"),
    (KeyKind::ShipDurationType, r"TUTORIAL", "TUTORIAL"),
];

// ---------------------------------------------------------------------------
// RuleSpec
// ---------------------------------------------------------------------------

/// The built-in ship and duration rules, uncompiled, in match order.
pub fn default_specs() -> Vec<RuleSpec> {
    DEFAULT_RULES
        .iter()
        .map(|(kind, pattern, canonical)| RuleSpec {
            kind: *kind,
            pattern: (*pattern).to_owned(),
            canonical: (*canonical).to_owned(),
        })
        .collect()
}

/// The uncompiled, serializable form of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Kind the rule applies to.
    pub kind: KeyKind,
    /// Unanchored regular expression, matched case-insensitively.
    pub pattern: String,
    /// Canonical token produced on match.
    pub canonical: String,
}

// ---------------------------------------------------------------------------
// HeuristicRule
// ---------------------------------------------------------------------------

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct HeuristicRule {
    spec: RuleSpec,
    regex: Regex,
}

impl HeuristicRule {
    /// Compile a rule. The pattern is wrapped as `(?i)^(?:pattern)$`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidPattern`] if the pattern does not compile.
    pub fn compile(spec: RuleSpec) -> Result<Self, KeyError> {
        let regex = Regex::new(&format!("(?i)^(?:{})$", spec.pattern)).map_err(|e| {
            KeyError::InvalidPattern {
                kind: spec.kind.to_string(),
                pattern: spec.pattern.clone(),
                details: e.to_string(),
            }
        })?;
        Ok(Self { spec, regex })
    }

    /// Returns `true` if the whole label matches.
    pub fn matches(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    /// The rule's source form.
    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    /// The canonical token this rule produces.
    pub fn canonical(&self) -> &str {
        &self.spec.canonical
    }
}

// ---------------------------------------------------------------------------
// RuleTable
// ---------------------------------------------------------------------------

/// Ordered heuristic rules per kind.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: IndexMap<KeyKind, Vec<HeuristicRule>>,
}

impl RuleTable {
    /// A table with no rules at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the built-in ship and duration rules.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for spec in default_specs() {
            match HeuristicRule::compile(spec) {
                Ok(rule) => table.push(rule),
                Err(e) => warn!(error = %e, "built-in rule skipped"),
            }
        }
        table
    }

    /// Append a compiled rule after the existing rules of its kind.
    pub fn push(&mut self, rule: HeuristicRule) {
        self.rules.entry(rule.spec.kind).or_default().push(rule);
    }

    /// Compile and append a rule.
    pub fn add(&mut self, kind: KeyKind, pattern: &str, canonical: &str) -> Result<(), KeyError> {
        self.push(HeuristicRule::compile(RuleSpec {
            kind,
            pattern: pattern.to_owned(),
            canonical: canonical.to_owned(),
        })?);
        Ok(())
    }

    /// Append rules read from a `kind, pattern, canonical` sheet.
    ///
    /// Rows with a blank field or an unknown kind are skipped. Canonical
    /// values are stored upper-snaked.
    ///
    /// # Errors
    ///
    /// Fails if a column is missing or a pattern does not compile.
    pub fn extend_from_table(&mut self, table: &Table) -> Result<usize, KeyError> {
        if table.header_row().is_none() {
            return Ok(0);
        }
        let c_kind = table.resolve(&ColumnSpec::new("kind", "kind"))?;
        let c_pattern = table.resolve(&ColumnSpec::new("pattern", "pattern"))?;
        let c_canon = table.resolve(&ColumnSpec::new("canonical", "canonical"))?;

        let mut added = 0;
        for row in table.rows() {
            let (Some(kind), Some(pattern), Some(canon)) = (
                Table::cell(row, c_kind).trimmed(),
                Table::cell(row, c_pattern).trimmed(),
                Table::cell(row, c_canon).trimmed(),
            ) else {
                continue;
            };
            let Ok(kind) = kind.parse::<KeyKind>() else {
                debug!(kind = %kind, "skipping rule with unknown kind");
                continue;
            };
            self.add(kind, &pattern, &upper_snake(&canon))?;
            added += 1;
        }
        debug!(sheet = %table.name(), added, "loaded heuristic rules");
        Ok(added)
    }

    /// Rules for `kind`, in match order.
    pub fn rules_for(&self, kind: KeyKind) -> &[HeuristicRule] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First rule of `kind` matching `label`.
    pub fn apply(&self, kind: KeyKind, label: &str) -> Option<&str> {
        self.rules_for(kind)
            .iter()
            .find(|r| r.matches(label))
            .map(HeuristicRule::canonical)
    }

    /// Total number of rules across kinds.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use virtue_table::cell::Cell;

    #[test]
    fn every_default_rule_compiles() {
        for spec in default_specs() {
            let pattern = spec.pattern.clone();
            assert!(HeuristicRule::compile(spec).is_ok(), "built-in pattern {pattern} failed to compile");
        }
        let table = RuleTable::with_defaults();
        assert_eq!(table.len(), DEFAULT_RULES.len());
        assert_eq!(table.rules_for(KeyKind::ShipType).len(), 11);
        assert_eq!(table.rules_for(KeyKind::ShipDurationType).len(), 4);
        assert!(table.rules_for(KeyKind::TargetArtifact).is_empty());
    }

    #[test]
    fn ship_display_names_and_typos() {
        let t = RuleTable::with_defaults();
        let ship = |s| t.apply(KeyKind::ShipType, s);
        assert_eq!(ship("Atreggies Henliner"), Some("ATREGGIES"));
        assert_eq!(ship("atreggies"), Some("ATREGGIES"));
        assert_eq!(ship("Atreggies_Henliner"), Some("ATREGGIES"));
        assert_eq!(ship("Cornish-Hen Corvette"), Some("CORELLIHEN_CORVETTE"));
        assert_eq!(ship("Defihent"), Some("CHICKFIANT"));
        assert_eq!(ship("Millenia Chicken"), Some("MILLENIUM_CHICKEN"));
        assert_eq!(ship("Millenium-Chicken"), Some("MILLENIUM_CHICKEN"));
        assert_eq!(ship("Galeggttica"), Some("GALEGGTICA"));
        assert_eq!(ship("chicken heavy"), Some("CHICKEN_HEAVY"));
    }

    #[test]
    fn rules_are_anchored() {
        let t = RuleTable::with_defaults();
        assert_eq!(t.apply(KeyKind::ShipType, "BCR2"), None);
        assert_eq!(t.apply(KeyKind::ShipType, "The Henerprise"), None);
        assert_eq!(t.apply(KeyKind::ShipDurationType, "shortish"), None);
    }

    #[test]
    fn table_rules_append_after_defaults() {
        let mut t = RuleTable::with_defaults();
        let sheet = Table::from_rows(
            "Rules",
            vec![
                vec![Cell::from("kind"), Cell::from("pattern"), Cell::from("canonical")],
                vec![Cell::from("shipDurationType"), Cell::from("LONG(ER)?"), Cell::from("long")],
                vec![Cell::from("shipType"), Cell::from("BCR"), Cell::from("NOT_REACHED")],
                vec![Cell::from("bogus"), Cell::from("X"), Cell::from("Y")],
                vec![Cell::from("shipType"), Cell::Empty, Cell::from("Y")],
            ],
        );
        assert_eq!(t.extend_from_table(&sheet).unwrap(), 2);
        assert_eq!(t.apply(KeyKind::ShipDurationType, "Longer"), Some("LONG"));
        // Earlier built-in rule still wins.
        assert_eq!(t.apply(KeyKind::ShipType, "bcr"), Some("BCR"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut t = RuleTable::new();
        let err = t.add(KeyKind::ShipType, "(unclosed", "X").unwrap_err();
        assert!(matches!(err, KeyError::InvalidPattern { .. }));
    }

    #[test]
    fn rules_sheet_missing_column_fails() {
        let mut t = RuleTable::new();
        let sheet = Table::from_rows(
            "Rules",
            vec![vec![Cell::from("kind"), Cell::from("canonical")]],
        );
        assert!(matches!(
            t.extend_from_table(&sheet),
            Err(KeyError::Table(_))
        ));
    }
}
