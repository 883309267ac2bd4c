//! Best-ship ranking over the per-ship totals sheet.
//!
//! Every totals row carries a percentage score. Rows are kept when the ship
//! selection allows them, split by fuel class, sorted by score (highest
//! first, ties in sheet order) and cut to a per-class limit.
//!
//! Ship names match a class or a selection entry by whole-word prefix,
//! case-insensitively: `"BCR"` matches `"bcr (gold)"` but not `"BCRX"`.

use serde::{Deserialize, Serialize};
use tracing::debug;
use virtue_table::cell::Cell;
use virtue_table::table::{ColumnSpec, Table};

use crate::IndexError;

/// Header of each block in [`ShipRanking::to_rows`].
pub const RANKING_HEADER: [&str; 8] = [
    "Ship",
    "Target",
    "Hours",
    "Ships/Tank",
    "Artis/Ship",
    "Artis/Tank",
    "Artis/Day",
    "% Score",
];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Header names of the totals sheet, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TotalsColumns {
    pub ship: String,
    pub target: String,
    pub hours: String,
    pub ships_per_tank: String,
    pub artis_per_ship: String,
    pub artis_per_tank: String,
    pub artis_per_day: String,
    pub score: String,
}

impl Default for TotalsColumns {
    fn default() -> Self {
        let [ship, target, hours, ships_per_tank, artis_per_ship, artis_per_tank, artis_per_day, score] =
            RANKING_HEADER.map(str::to_owned);
        Self {
            ship,
            target,
            hours,
            ships_per_tank,
            artis_per_ship,
            artis_per_tank,
            artis_per_day,
            score,
        }
    }
}

impl TotalsColumns {
    fn names(&self) -> [&str; 8] {
        [
            self.ship.as_str(),
            self.target.as_str(),
            self.hours.as_str(),
            self.ships_per_tank.as_str(),
            self.artis_per_ship.as_str(),
            self.artis_per_tank.as_str(),
            self.artis_per_day.as_str(),
            self.score.as_str(),
        ]
    }
}

/// Header names of the ship selection sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionColumns {
    pub ship: String,
    pub include: String,
}

impl Default for SelectionColumns {
    fn default() -> Self {
        Self {
            ship: "Ship".to_owned(),
            include: "Include".to_owned(),
        }
    }
}

/// Fuel classes, per-class limits and the totals sheet layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankingSpec {
    /// 0-based row of the totals header; data starts on the next row.
    pub header_row: usize,
    pub columns: TotalsColumns,
    pub selection_columns: SelectionColumns,
    /// Ship name prefixes of fuel-limited ships.
    pub fuel_limited: Vec<String>,
    /// Ship name prefixes of ships that fly without fuel.
    pub infinite_fuel: Vec<String>,
    pub fuel_limited_limit: usize,
    pub infinite_fuel_limit: usize,
}

impl Default for RankingSpec {
    fn default() -> Self {
        Self {
            header_row: 1,
            columns: TotalsColumns::default(),
            selection_columns: SelectionColumns::default(),
            fuel_limited: ["Defihent", "Voyegger", "Henerprise", "Atreggies Henliner"]
                .map(str::to_owned)
                .to_vec(),
            infinite_fuel: [
                "Chicken One",
                "Chicken Nine",
                "Chicken Heavy",
                "BCR",
                "Quintillion Chicken",
                "Cornish-Hen Corvette",
                "Galeggtica",
            ]
            .map(str::to_owned)
            .to_vec(),
            fuel_limited_limit: 5,
            infinite_fuel_limit: 3,
        }
    }
}

/// Which ranking block a ship belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FuelClass {
    FuelLimited,
    InfiniteFuel,
}

impl RankingSpec {
    /// Fuel class of `ship`; fuel-limited prefixes are tried first.
    pub fn classify(&self, ship: &str) -> Option<FuelClass> {
        if self.fuel_limited.iter().any(|p| matches_prefix(ship, p)) {
            Some(FuelClass::FuelLimited)
        } else if self.infinite_fuel.iter().any(|p| matches_prefix(ship, p)) {
            Some(FuelClass::InfiniteFuel)
        } else {
            None
        }
    }

    fn limit(&self, class: FuelClass) -> usize {
        match class {
            FuelClass::FuelLimited => self.fuel_limited_limit,
            FuelClass::InfiniteFuel => self.infinite_fuel_limit,
        }
    }
}

/// `true` if `prefix` starts `ship` as whole words, ignoring case and
/// surrounding whitespace.
pub fn matches_prefix(ship: &str, prefix: &str) -> bool {
    let ship = ship.trim().to_lowercase();
    let prefix = prefix.trim().to_lowercase();
    ship.strip_prefix(prefix.as_str())
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

// ---------------------------------------------------------------------------
// ShipSelection
// ---------------------------------------------------------------------------

/// Ships eligible for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShipSelection {
    /// No selection sheet: every ship is eligible.
    All,
    /// Only ships starting with one of these prefixes.
    Only(Vec<String>),
}

impl ShipSelection {
    /// Checked, non-blank ship names of a selection sheet.
    ///
    /// A checkbox counts as checked when it is `true`, a non-zero number or
    /// text other than `false`, `no` or `0`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Table`] if the sheet has rows but lacks one of
    /// the configured columns.
    pub fn from_table(table: &Table, columns: &SelectionColumns) -> Result<Self, IndexError> {
        if table.all().is_empty() {
            return Ok(Self::Only(Vec::new()));
        }
        let ship = table.resolve(&ColumnSpec::new("ship", &columns.ship))?;
        let include = table.resolve(&ColumnSpec::new("include", &columns.include))?;
        let names = table
            .rows()
            .iter()
            .filter(|row| is_checked(Table::cell(row, include)))
            .filter_map(|row| Table::cell(row, ship).trimmed())
            .collect();
        Ok(Self::Only(names))
    }

    pub fn allows(&self, ship: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(prefixes) => prefixes.iter().any(|p| matches_prefix(ship, p)),
        }
    }
}

fn is_checked(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => false,
        Cell::Bool(b) => *b,
        Cell::Number(n) => *n != 0.0 && !n.is_nan(),
        Cell::Text(s) => {
            let s = s.trim();
            !s.is_empty() && !["false", "no", "0"].iter().any(|f| s.eq_ignore_ascii_case(f))
        }
    }
}

// ---------------------------------------------------------------------------
// ShipRanking
// ---------------------------------------------------------------------------

/// One ranked totals row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedShip {
    pub ship: String,
    pub score: f64,
    /// Source cells in [`RANKING_HEADER`] order.
    pub cells: Vec<Cell>,
}

/// Top ships per fuel class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShipRanking {
    fuel_limited: Vec<RankedShip>,
    infinite_fuel: Vec<RankedShip>,
}

impl ShipRanking {
    /// Rank the totals sheet.
    ///
    /// Rows without a ship name or without a numeric score are skipped, as
    /// are ships outside `selection` or outside both fuel classes.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Table`] if the header row lacks one of the
    /// configured columns.
    pub fn rank(totals: &Table, selection: &ShipSelection, spec: &RankingSpec) -> Result<Self, IndexError> {
        let Some(grid) = totals.all().get(spec.header_row..).filter(|g| !g.is_empty()) else {
            debug!(table = totals.name(), header_row = spec.header_row, "totals sheet has no header row");
            return Ok(Self::default());
        };
        let table = Table::from_rows(totals.name(), grid.to_vec());
        let cols = spec
            .columns
            .names()
            .map(|name| table.resolve(&ColumnSpec::new(name, name)));
        let cols = cols.into_iter().collect::<Result<Vec<_>, _>>()?;
        let (ship_col, score_col) = (cols[0], cols[7]);

        let mut ranking = Self::default();
        let mut skipped = 0usize;
        for row in table.rows() {
            let (Some(ship), Some(score)) = (
                Table::cell(row, ship_col).trimmed(),
                Table::cell(row, score_col).as_number(),
            ) else {
                skipped += 1;
                continue;
            };
            if !selection.allows(&ship) {
                continue;
            }
            let Some(class) = spec.classify(&ship) else {
                continue;
            };
            let cells = cols.iter().map(|&c| Table::cell(row, c).clone()).collect();
            ranking.block_mut(class).push(RankedShip { ship, score, cells });
        }

        for class in [FuelClass::FuelLimited, FuelClass::InfiniteFuel] {
            let block = ranking.block_mut(class);
            block.sort_by(|a, b| b.score.total_cmp(&a.score));
            block.truncate(spec.limit(class));
        }
        debug!(
            table = totals.name(),
            fuel_limited = ranking.fuel_limited.len(),
            infinite_fuel = ranking.infinite_fuel.len(),
            skipped,
            "ships ranked"
        );
        Ok(ranking)
    }

    /// Ranked ships of `class`, best first.
    pub fn get(&self, class: FuelClass) -> &[RankedShip] {
        match class {
            FuelClass::FuelLimited => &self.fuel_limited,
            FuelClass::InfiniteFuel => &self.infinite_fuel,
        }
    }

    fn block_mut(&mut self, class: FuelClass) -> &mut Vec<RankedShip> {
        match class {
            FuelClass::FuelLimited => &mut self.fuel_limited,
            FuelClass::InfiniteFuel => &mut self.infinite_fuel,
        }
    }

    /// Render both blocks side by side: fuel-limited ships in the first
    /// eight columns, one blank column, then infinite-fuel ships. Each block
    /// has its own header; the shorter block is padded with blanks.
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        let width = RANKING_HEADER.len();
        let header: Vec<Cell> = RANKING_HEADER.iter().map(|h| Cell::from(*h)).collect();
        let block_row = |block: &[RankedShip], i: usize| {
            block
                .get(i)
                .map_or_else(|| vec![Cell::Empty; width], |ship| ship.cells.clone())
        };

        let mut out = Vec::with_capacity(1 + self.fuel_limited.len().max(self.infinite_fuel.len()));
        let mut first = header.clone();
        first.push(Cell::Empty);
        first.extend(header);
        out.push(first);
        for i in 0..self.fuel_limited.len().max(self.infinite_fuel.len()) {
            let mut row = block_row(&self.fuel_limited, i);
            row.push(Cell::Empty);
            row.extend(block_row(&self.infinite_fuel, i));
            out.push(row);
        }
        out
    }
}
