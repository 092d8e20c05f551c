//! Market conventions: moneyness transformations, day-count bases and
//! nearest-neighbour bracketing on sorted axes.

use chrono::{Days, NaiveDate};

/// Calendar days spanned by one business-day year, measured from its start date.
pub const YEAR_CALENDAR_DAYS: u64 = 365;

/// Convert a strike to simple moneyness: m = K / S.
pub fn moneyness(strike: f64, spot: f64) -> f64 {
    strike / spot
}

/// Convert a moneyness to an absolute strike: K = m · S.
pub fn strike_from_moneyness(moneyness: f64, spot: f64) -> f64 {
    moneyness * spot
}

/// Moneyness on the surface's own forward-relative scale.
///
/// A grid column `k` (relative to the current `spot`) corresponds to
/// `k · forward · anchor / spot` on the scale the surface was anchored on,
/// where `forward` is the slice's multiplicative forward factor.
pub fn anchored_moneyness(moneyness: f64, forward: f64, anchor: f64, spot: f64) -> f64 {
    moneyness * forward * anchor / spot
}

/// End of the one-year window starting at `date` (`date + 365` calendar days).
pub fn year_end(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(YEAR_CALENDAR_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Indices of the two entries of `sorted` that bracket `value`.
///
/// - At or below the first entry: both indices collapse to `0`.
/// - At or above the last entry: both collapse to `len - 1`.
/// - Otherwise: the last entry strictly below and the first entry strictly
///   above `value`. An exact hit on an interior entry is therefore bracketed
///   by its two neighbours.
///
/// Returns `None` for an empty axis or an unordered `value` (NaN).
/// `sorted` must be ascending.
///
/// # Examples
/// ```
/// use volmark::conventions::bracket;
///
/// let axis = [0.9, 1.0, 1.1];
/// assert_eq!(bracket(&0.95, &axis), Some((0, 1)));
/// assert_eq!(bracket(&1.0, &axis), Some((0, 2)));
/// assert_eq!(bracket(&0.5, &axis), Some((0, 0)));
/// assert_eq!(bracket(&2.0, &axis), Some((2, 2)));
/// ```
pub fn bracket<T: PartialOrd>(value: &T, sorted: &[T]) -> Option<(usize, usize)> {
    let last = sorted.len().checked_sub(1)?;
    if *value <= sorted[0] {
        return Some((0, 0));
    }
    if *value >= sorted[last] {
        return Some((last, last));
    }
    let upper = sorted.partition_point(|x| x <= value);
    let below = sorted.partition_point(|x| x < value);
    Some((below.checked_sub(1)?, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn strike_moneyness_round_trip() {
        let spot = 4_321.5;
        for &k in &[0.1, 0.25, 0.95, 1.0, 1.05, 1.75, 2.0] {
            let strike = strike_from_moneyness(k, spot);
            assert_abs_diff_eq!(moneyness(strike, spot), k, epsilon = 1e-12);
        }
    }

    #[test]
    fn anchored_moneyness_unit_ratio_is_identity() {
        assert_abs_diff_eq!(anchored_moneyness(1.05, 1.0, 100.0, 100.0), 1.05);
        // Spot rallied 10% since anchoring: grid columns move down the anchored scale.
        assert_abs_diff_eq!(
            anchored_moneyness(1.1, 1.0, 100.0, 110.0),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn year_end_is_365_days_later() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(year_end(d), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn bracket_between_entries() {
        let axis = [0.8, 0.9, 1.0, 1.1];
        assert_eq!(bracket(&0.85, &axis), Some((0, 1)));
        assert_eq!(bracket(&1.05, &axis), Some((2, 3)));
    }

    #[test]
    fn bracket_exact_interior_hit_uses_neighbours() {
        let axis = [0.8, 0.9, 1.0, 1.1];
        assert_eq!(bracket(&0.9, &axis), Some((0, 2)));
    }

    #[test]
    fn bracket_collapses_outside_range() {
        let axis = [0.8, 0.9, 1.0];
        assert_eq!(bracket(&0.8, &axis), Some((0, 0)));
        assert_eq!(bracket(&0.1, &axis), Some((0, 0)));
        assert_eq!(bracket(&1.0, &axis), Some((2, 2)));
        assert_eq!(bracket(&3.0, &axis), Some((2, 2)));
    }

    #[test]
    fn bracket_empty_and_single() {
        let empty: [f64; 0] = [];
        assert_eq!(bracket(&1.0, &empty), None);
        assert_eq!(bracket(&1.0, &[2.0]), Some((0, 0)));
        assert_eq!(bracket(&f64::NAN, &[0.9, 1.0, 1.1]), None);
    }

    #[test]
    fn bracket_works_on_dates() {
        let d = |m| NaiveDate::from_ymd_opt(2025, m, 15).unwrap();
        let axis = [d(3), d(6), d(9)];
        assert_eq!(bracket(&d(4), &axis), Some((0, 1)));
        assert_eq!(bracket(&d(6), &axis), Some((0, 2)));
    }
}
