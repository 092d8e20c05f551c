//! Dividend and repo schedules, and the parsers for user-entered rows.
//!
//! Schedules are date-keyed and ordered: no two entries share a date, and
//! iteration is always ascending.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};
use crate::validate::validate_finite;

/// Whether a dividend is announced or projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DividendKind {
    #[default]
    Normal,
    Forecast,
}

/// One dividend row. `value` is `None` when the amount is blank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendEntry {
    pub value: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: DividendKind,
}

impl DividendEntry {
    pub fn new(value: f64, kind: DividendKind) -> Self {
        Self {
            value: Some(value),
            kind,
        }
    }

    /// A row whose amount was left blank.
    pub fn blank(kind: DividendKind) -> Self {
        Self { value: None, kind }
    }

    /// Contribution to sums: blank rows count as zero.
    pub fn amount(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }
}

/// Date-keyed dividend schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DividendSchedule {
    entries: BTreeMap<NaiveDate, DividendEntry>,
}

impl DividendSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this schedule with `entry` set at `date`.
    pub fn with_entry(&self, date: NaiveDate, entry: DividendEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(date, entry);
        Self { entries }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DividendEntry> {
        self.entries.get(&date)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, NaiveDate, DividendEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of amounts paid strictly after `after` and up to and including `up_to`.
    pub fn sum_between(&self, after: NaiveDate, up_to: NaiveDate) -> f64 {
        if up_to <= after {
            return 0.0;
        }
        use std::ops::Bound::{Excluded, Included};
        self.entries
            .range((Excluded(after), Included(up_to)))
            .map(|(_, e)| e.amount())
            .sum()
    }
}

impl FromIterator<(NaiveDate, DividendEntry)> for DividendSchedule {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, DividendEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DividendSchedule {
    type Item = (&'a NaiveDate, &'a DividendEntry);
    type IntoIter = btree_map::Iter<'a, NaiveDate, DividendEntry>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Date-keyed annualized repo rates (decimal, 0.01 = 1%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoSchedule {
    rates: BTreeMap<NaiveDate, f64>,
}

impl RepoSchedule {
    /// Create a schedule from decimal rates.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if any rate is non-finite.
    pub fn from_rates(
        rates: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> error::Result<Self> {
        let mut map = BTreeMap::new();
        for (date, rate) in rates {
            validate_finite(rate, &format!("repo rate at {date}"))?;
            map.insert(date, rate);
        }
        Ok(Self { rates: map })
    }

    /// Create a schedule from rates typed in percent (1.5 means 1.5%).
    pub fn from_percent_rows(
        rows: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> error::Result<Self> {
        Self::from_rates(rows.into_iter().map(|(d, pct)| (d, pct / 100.0)))
    }

    pub fn rate(&self, date: NaiveDate) -> Option<f64> {
        self.rates.get(&date).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.rates.iter().map(|(&d, &r)| (d, r))
    }

    pub fn maturities(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rates.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parse a user-entered date.
///
/// Accepted forms: `2024-03-15`, `03/15/24`, `15-Mar-24` and `5-Mar-24`.
///
/// # Errors
/// Returns [`VolMarkError::InvalidInput`] for anything else.
pub fn parse_date(text: &str) -> error::Result<NaiveDate> {
    let text = text.trim();
    let parsed = if text.contains('/') {
        NaiveDate::parse_from_str(text, "%m/%d/%y")
    } else if MONTHS.iter().any(|m| text.to_ascii_lowercase().contains(m)) {
        let padded = if text.len() < 9 {
            format!("0{text}")
        } else {
            text.to_string()
        };
        NaiveDate::parse_from_str(&padded, "%d-%b-%y")
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
    };
    parsed.map_err(|e| VolMarkError::InvalidInput {
        message: format!("unrecognised date {text:?}: {e}"),
    })
}

fn parse_kind(text: &str) -> error::Result<DividendKind> {
    match text.trim() {
        "Normal" | "" => Ok(DividendKind::Normal),
        "Forecast" => Ok(DividendKind::Forecast),
        other => Err(VolMarkError::InvalidInput {
            message: format!("dividend type must be Normal or Forecast, got {other:?}"),
        }),
    }
}

/// Parse a pasted dividend table: one `Date<TAB>Value<TAB>Type` row per line.
///
/// A header row starting with `Date` and blank lines are skipped. The whole
/// table is rejected if any row has a bad date, a non-numeric value, an
/// unknown type, or repeats a date.
///
/// # Examples
/// ```
/// use volmark::market::parse_dividend_table;
///
/// let text = "Date\tValue\tType\r\n15-Mar-25\t1.25\tNormal\r\n15-Sep-25\t1.30\tForecast";
/// let schedule = parse_dividend_table(text)?;
/// assert_eq!(schedule.len(), 2);
/// # Ok::<(), volmark::VolMarkError>(())
/// ```
pub fn parse_dividend_table(text: &str) -> error::Result<DividendSchedule> {
    let mut entries = BTreeMap::new();
    for (line_no, line) in text.lines().enumerate() {
        let cells: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        let first = cells[0].trim();
        if first.is_empty() || first == "Date" {
            continue;
        }
        let row = line_no + 1;
        let date = parse_date(first).map_err(|e| row_error(row, e))?;
        let raw_value = cells.get(1).map(|s| s.trim()).unwrap_or("");
        let value: f64 = raw_value.parse().map_err(|_| VolMarkError::InvalidInput {
            message: format!("row {row}: value {raw_value:?} is not a number"),
        })?;
        validate_finite(value, "dividend").map_err(|e| row_error(row, e))?;
        let kind = parse_kind(cells.get(2).copied().unwrap_or("")).map_err(|e| row_error(row, e))?;
        if entries.insert(date, DividendEntry::new(value, kind)).is_some() {
            return Err(VolMarkError::InvalidInput {
                message: format!("row {row}: duplicate dividend date {date}"),
            });
        }
    }
    Ok(DividendSchedule { entries })
}

fn row_error(row: usize, err: VolMarkError) -> VolMarkError {
    VolMarkError::InvalidInput {
        message: format!("row {row}: {err}"),
    }
}
