//! Annual dividend-swap points.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error;
use crate::market::DividendSchedule;
use crate::validate::validate_positive;

/// Dividends paid in one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendSwapPoint {
    pub year: i32,
    /// Sum of the year's dividends, rounded to 4 decimals.
    pub points: f64,
    /// `points / spot`.
    #[serde(rename = "yield")]
    pub yield_: f64,
}

/// Bucket `dividends` by calendar year from `current_year` onwards.
///
/// Blank values count as zero. Only years with at least one entry appear.
///
/// # Errors
/// Returns [`VolMarkError::InvalidInput`](crate::VolMarkError::InvalidInput)
/// if `spot` is not positive.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volmark::carry::aggregate;
/// use volmark::market::{DividendEntry, DividendKind, DividendSchedule};
///
/// let d = |y, m| NaiveDate::from_ymd_opt(y, m, 15).unwrap();
/// let divs: DividendSchedule = [
///     (d(2024, 3), DividendEntry::new(1.0, DividendKind::Normal)),
///     (d(2024, 9), DividendEntry::new(1.5, DividendKind::Forecast)),
///     (d(2025, 3), DividendEntry::blank(DividendKind::Forecast)),
/// ]
/// .into_iter()
/// .collect();
///
/// let swaps = aggregate(&divs, 2024, 100.0)?;
/// assert_eq!(swaps[0].points, 2.5);
/// assert_eq!(swaps[0].yield_, 0.025);
/// assert_eq!(swaps[1].points, 0.0);
/// # Ok::<(), volmark::VolMarkError>(())
/// ```
pub fn aggregate(
    dividends: &DividendSchedule,
    current_year: i32,
    spot: f64,
) -> error::Result<Vec<DividendSwapPoint>> {
    validate_positive(spot, "spot")?;

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, entry) in dividends {
        if date.year() >= current_year {
            *by_year.entry(date.year()).or_insert(0.0) += entry.amount();
        }
    }

    Ok(by_year
        .into_iter()
        .map(|(year, sum)| {
            let points = round4(sum);
            DividendSwapPoint {
                year,
                points,
                yield_: points / spot,
            }
        })
        .collect())
}

fn round4(x: f64) -> f64 {
    (x * 1e4).round() / 1e4
}
