//! Arbitrage check results and grid highlighting.
//!
//! The external checker evaluates butterfly arbitrage per maturity, calendar
//! arbitrage per moneyness, and a pass/fail grid on its own maturity and
//! moneyness sampling. [`highlight`] maps failing cells of that grid onto the
//! displayed vol grid.
//!
//! # Highlighting
//!
//! A failing cell at moneyness `k` and maturity `T` is moved to the display
//! scale as `k · forward(T) · anchor / spot`, rounded to a column key, and
//! flagged in the two display columns bracketing it (and in its own column
//! on an exact hit). A display maturity that the checker never evaluated is
//! flagged in a column when the nearest evaluated maturities on both sides
//! are flagged there.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::conventions::{anchored_moneyness, bracket};
use crate::surface::Surface;
use crate::types::{MoneynessKey, PassFail};

/// Checker pass/fail grid: maturity → moneyness → outcome.
pub type CheckGrid = BTreeMap<NaiveDate, BTreeMap<MoneynessKey, PassFail>>;

/// Flagged display cells: moneyness column → sorted maturity row indices.
pub type HighlightSet = BTreeMap<MoneynessKey, BTreeSet<usize>>;

/// Output of the arbitrage checker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageCheck {
    pub butterfly: BTreeMap<NaiveDate, PassFail>,
    pub calendar: BTreeMap<MoneynessKey, PassFail>,
    pub check_grid: CheckGrid,
}

impl ArbitrageCheck {
    pub fn butterfly_passed(&self) -> bool {
        self.butterfly.values().all(|f| !f.is_fail())
    }

    pub fn calendar_passed(&self) -> bool {
        self.calendar.values().all(|f| !f.is_fail())
    }

    pub fn passed(&self) -> bool {
        self.butterfly_passed() && self.calendar_passed()
    }

    /// One-line summary for the dashboard.
    ///
    /// # Examples
    /// ```
    /// use volmark::grid::ArbitrageCheck;
    /// use volmark::types::{MoneynessKey, PassFail};
    ///
    /// let mut check = ArbitrageCheck::default();
    /// check.calendar.insert(MoneynessKey::new(0.9), PassFail::Fail);
    /// assert_eq!(
    ///     check.summary(),
    ///     "Butterfly Arbitrage Check: Pass / Calendar Arbitrage Check: Fail"
    /// );
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "Butterfly Arbitrage Check: {} / Calendar Arbitrage Check: {}",
            label(self.butterfly_passed()),
            label(self.calendar_passed())
        )
    }
}

fn label(passed: bool) -> &'static str {
    if passed { "Pass" } else { "Fail" }
}

/// Display cells to flag for the failures in `check_grid`.
///
/// `maturities` and `moneyness` are the display grid's rows and columns,
/// both ascending. Every column appears in the result, possibly empty.
/// Failing cells whose maturity has no surface slice or is not a display
/// row are ignored.
pub fn highlight(
    surface: &Surface,
    anchor: f64,
    spot: f64,
    maturities: &[NaiveDate],
    moneyness: &[f64],
    check_grid: &CheckGrid,
) -> HighlightSet {
    let columns: Vec<MoneynessKey> = moneyness.iter().map(|k| MoneynessKey::new(*k)).collect();
    let mut flagged: HighlightSet = columns.iter().map(|k| (*k, BTreeSet::new())).collect();

    for (maturity, row) in check_grid {
        let (Some(slice), Some(index)) = (
            surface.slice(*maturity),
            maturities.iter().position(|m| m == maturity),
        ) else {
            continue;
        };
        for (k, _) in row.iter().filter(|(_, flag)| flag.is_fail()) {
            let reference =
                MoneynessKey::new(anchored_moneyness(k.value(), slice.forward(), anchor, spot));
            let Some((lo, hi)) = bracket(&reference, &columns) else {
                continue;
            };
            for j in [lo, hi] {
                flag(&mut flagged, columns[j], index);
            }
            if let Some(j) = columns.iter().position(|c| *c == reference) {
                flag(&mut flagged, columns[j], index);
            }
        }
    }

    let evaluated: Vec<usize> = maturities
        .iter()
        .enumerate()
        .filter(|(_, m)| check_grid.contains_key(m))
        .map(|(i, _)| i)
        .collect();
    for i in (0..maturities.len()).filter(|i| !check_grid.contains_key(&maturities[*i])) {
        let before = evaluated.iter().rev().find(|e| **e < i);
        let after = evaluated.iter().find(|e| **e > i);
        let (Some(&before), Some(&after)) = (before, after) else {
            continue;
        };
        for rows in flagged.values_mut() {
            if rows.contains(&before) && rows.contains(&after) {
                rows.insert(i);
            }
        }
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        n_flagged = flagged.values().map(BTreeSet::len).sum::<usize>(),
        "arbitrage highlight computed"
    );

    flagged
}

fn flag(flagged: &mut HighlightSet, column: MoneynessKey, row: usize) {
    flagged.entry(column).or_default().insert(row);
}
