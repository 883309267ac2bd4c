//! Alias tables and the alias bootstrap generator.
//!
//! An [`AliasTable`] maps, per [`KeyKind`], raw labels to canonical tokens.
//! It is loaded from a sheet with `kind, alias, canonical` columns. Every
//! row registers two entries: the alias exactly as written, and its
//! upper-snake form, both pointing at the canonical token. Many aliases may
//! share a canonical token; a repeated alias is overwritten by the later row.
//!
//! [`AliasBootstrap`] goes the other way: it scans observed data for the
//! distinct labels in use and proposes identity rows (`alias ->
//! UPPER_SNAKE(alias)`) to seed a sheet for manual curation.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_table::cell::Cell;
use virtue_table::table::Table;

use crate::kind::KeyKind;
use crate::normalize::upper_snake;

// ---------------------------------------------------------------------------
// AliasColumns
// ---------------------------------------------------------------------------

/// Header names of an alias sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasColumns {
    pub kind: String,
    pub alias: String,
    pub canonical: String,
}

impl Default for AliasColumns {
    fn default() -> Self {
        Self {
            kind: "kind".to_owned(),
            alias: "alias".to_owned(),
            canonical: "canonical".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// AliasRow
// ---------------------------------------------------------------------------

/// One `kind, alias, canonical` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRow {
    pub kind: KeyKind,
    pub alias: String,
    pub canonical: String,
}

impl AliasRow {
    /// The header row of an alias sheet.
    pub fn header() -> Vec<Cell> {
        vec![
            Cell::from("kind"),
            Cell::from("alias"),
            Cell::from("canonical"),
        ]
    }

    /// This record as a sheet row.
    pub fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.kind.as_str()),
            Cell::from(self.alias.as_str()),
            Cell::from(self.canonical.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// AliasTable
// ---------------------------------------------------------------------------

/// kind -> raw label (or its upper-snake form) -> canonical token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    maps: IndexMap<KeyKind, IndexMap<String, String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            maps: KeyKind::ALL
                .into_iter()
                .map(|k| (k, IndexMap::new()))
                .collect(),
        }
    }
}

impl AliasTable {
    /// An empty table with all three kinds present.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load aliases from a sheet.
    ///
    /// Never fails: a sheet missing any of the three columns yields an empty
    /// table. Rows with a blank field or an unknown kind are skipped.
    /// Canonical values are stored upper-snaked.
    pub fn from_table(table: &Table, columns: &AliasColumns) -> Self {
        let mut out = Self::new();
        let (Some(c_kind), Some(c_alias), Some(c_canon)) = (
            table.column(&columns.kind),
            table.column(&columns.alias),
            table.column(&columns.canonical),
        ) else {
            debug!(sheet = %table.name(), "alias sheet lacks kind/alias/canonical columns -- using empty table");
            return out;
        };

        let mut skipped = 0usize;
        for row in table.rows() {
            let (Some(kind), Some(alias), Some(canon)) = (
                Table::cell(row, c_kind).trimmed(),
                Table::cell(row, c_alias).trimmed(),
                Table::cell(row, c_canon).trimmed(),
            ) else {
                skipped += 1;
                continue;
            };
            match kind.parse::<KeyKind>() {
                Ok(kind) => out.insert(kind, &alias, &canon),
                Err(_) => {
                    debug!(kind = %kind, alias = %alias, "skipping alias with unknown kind");
                    skipped += 1;
                }
            }
        }
        debug!(sheet = %table.name(), entries = out.len(), skipped, "loaded alias table");
        out
    }

    /// Register `alias` (and its upper-snake form) for `kind`.
    ///
    /// The canonical value is stored upper-snaked (see [`upper_snake`]) so
    /// that it compares equal to the tokens of the canonical orders and the
    /// built-in rules: `"Cornish-Hen corvette"` is stored as
    /// `"CORNISH_HEN_CORVETTE"`.
    pub fn insert(&mut self, kind: KeyKind, alias: &str, canonical: &str) {
        let alias = alias.trim();
        let canon = upper_snake(canonical);
        let map = self.maps.entry(kind).or_default();
        map.insert(alias.to_owned(), canon.clone());
        map.insert(upper_snake(alias), canon);
    }

    /// Look up a label exactly as given.
    pub fn lookup(&self, kind: KeyKind, label: &str) -> Option<&str> {
        self.maps
            .get(&kind)
            .and_then(|m| m.get(label))
            .map(String::as_str)
    }

    /// Returns `true` if the trimmed label or its upper-snake form has an entry.
    pub fn covers(&self, kind: KeyKind, label: &str) -> bool {
        let label = label.trim();
        self.lookup(kind, label).is_some() || self.lookup(kind, &upper_snake(label)).is_some()
    }

    /// Entries for one kind, in registration order.
    pub fn entries(&self, kind: KeyKind) -> impl Iterator<Item = (&str, &str)> {
        self.maps
            .get(&kind)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Total entries across kinds (exact and upper-snake forms both count).
    pub fn len(&self) -> usize {
        self.maps.values().map(IndexMap::len).sum()
    }

    /// Returns `true` if no kind has any entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// AliasBootstrap
// ---------------------------------------------------------------------------

/// Collects distinct observed labels per kind and proposes identity aliases.
#[derive(Debug, Clone, Default)]
pub struct AliasBootstrap {
    seen: IndexMap<KeyKind, IndexSet<String>>,
}

impl AliasBootstrap {
    /// Start an empty scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every non-blank value of column `col` in `table` as a `kind`
    /// label. Labels are trimmed; the first occurrence fixes the order.
    pub fn observe_column(&mut self, kind: KeyKind, table: &Table, col: usize) -> &mut Self {
        for row in table.rows() {
            if let Some(label) = Table::cell(row, col).trimmed() {
                self.seen.entry(kind).or_default().insert(label);
            }
        }
        self
    }

    /// Record a single label.
    pub fn observe(&mut self, kind: KeyKind, label: &str) -> &mut Self {
        let label = label.trim();
        if !label.is_empty() {
            self.seen.entry(kind).or_default().insert(label.to_owned());
        }
        self
    }

    /// Proposed rows, grouped by kind in first-observed kind order.
    pub fn rows(&self) -> Vec<AliasRow> {
        self.seen
            .iter()
            .flat_map(|(kind, labels)| {
                labels.iter().map(move |label| AliasRow {
                    kind: *kind,
                    alias: label.clone(),
                    canonical: upper_snake(label),
                })
            })
            .collect()
    }

    /// Proposed rows as a sheet, header included.
    pub fn to_sheet(&self) -> Vec<Vec<Cell>> {
        std::iter::once(AliasRow::header())
            .chain(self.rows().iter().map(AliasRow::to_cells))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
