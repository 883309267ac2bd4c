//! Label normalization.
//!
//! [`Normalizer::normalize`] maps a raw cell to a canonical token. The steps,
//! first match wins:
//!
//! 1. Trim and stringify; a blank value is unmappable (`None`).
//! 2. Exact alias lookup of the trimmed text.
//! 3. Alias lookup of the upper-snake form.
//! 4. Heuristic rules for the kind, tried against the trimmed text and then
//!    against its upper-snake form.
//! 5. The upper-snake form itself.
//!
//! Canonical tokens are fixed points: normalizing a token returns it
//! unchanged, as long as the alias table does not chain one canonical token
//! to another.

use virtue_table::cell::Cell;

use crate::alias::AliasTable;
use crate::kind::KeyKind;
use crate::rules::RuleTable;

/// Trim, collapse runs of whitespace and hyphens to a single `_`, uppercase.
///
/// Idempotent: `upper_snake(&upper_snake(s)) == upper_snake(s)`.
pub fn upper_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            in_run = false;
            out.extend(ch.to_uppercase());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Resolves raw labels to canonical tokens using aliases and rules.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: AliasTable,
    rules: RuleTable,
}

impl Normalizer {
    /// Combine an alias table with a rule table.
    pub fn new(aliases: AliasTable, rules: RuleTable) -> Self {
        Self { aliases, rules }
    }

    /// Built-in rules and no aliases.
    pub fn with_default_rules() -> Self {
        Self::new(AliasTable::new(), RuleTable::with_defaults())
    }

    /// The alias table in use.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// The rule table in use.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Normalize a raw cell. Returns `None` when the cell is blank.
    pub fn normalize(&self, kind: KeyKind, raw: &Cell) -> Option<String> {
        self.normalize_str(kind, &raw.as_text())
    }

    /// Normalize raw text. Returns `None` when the text is blank.
    pub fn normalize_str(&self, kind: KeyKind, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(canon) = self.aliases.lookup(kind, raw) {
            return Some(canon.to_owned());
        }
        let up = upper_snake(raw);
        if let Some(canon) = self.aliases.lookup(kind, &up) {
            return Some(canon.to_owned());
        }
        if let Some(canon) = self
            .rules
            .apply(kind, raw)
            .or_else(|| self.rules.apply(kind, &up))
        {
            return Some(canon.to_owned());
        }
        Some(up)
    }

    /// Returns `true` if `raw` (or its upper-snake form) has an alias entry.
    pub fn has_alias(&self, kind: KeyKind, raw: &Cell) -> bool {
        self.aliases.covers(kind, &raw.as_text())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
