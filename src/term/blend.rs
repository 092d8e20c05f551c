//! Short-term / long-term blending on a ten-year calendar horizon.
//!
//! ```text
//! l1 = max(T − T₀, 0)            (days since anchor)
//! l2 = max(T₀ + 3650 − T, 0)     (days left to the horizon)
//! x(T) = (x_st · l2 + x_lt · l1^s) / (l1^s + l2)
//! ```
//!
//! At the anchor the blend is exactly the short-term value; at or beyond
//! the horizon it is exactly the long-term value. The strength `s` controls
//! how fast the weight moves towards the long end.

use chrono::NaiveDate;

/// Calendar days from the anchor date to the long-term horizon.
pub const HORIZON_DAYS: i64 = 3650;

/// Blend `short_term` and `long_term` at `target`, relative to `anchor_date`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volmark::term::blend;
///
/// let anchor = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let far = NaiveDate::from_ymd_opt(2034, 1, 1).unwrap();
/// assert_eq!(blend(anchor, 0.30, 0.20, 1.0, anchor), 0.30);
/// assert_eq!(blend(far, 0.30, 0.20, 1.0, anchor), 0.20);
/// ```
pub fn blend(
    target: NaiveDate,
    short_term: f64,
    long_term: f64,
    strength: f64,
    anchor_date: NaiveDate,
) -> f64 {
    let elapsed = (target - anchor_date).num_days();
    let l1 = elapsed.max(0) as f64;
    let l2 = (HORIZON_DAYS - elapsed).max(0) as f64;

    if l1 == 0.0 {
        return short_term;
    }
    if l2 == 0.0 {
        return long_term;
    }
    let w = l1.powf(strength);
    (short_term * l2 + long_term * w) / (w + l2)
}

/// Replace an axis input that rounds to zero at 4 decimals with `floor`.
///
/// A zero skew or convexity collapses the wing formulas downstream, so both
/// axes are floored before blending.
pub fn floor_degenerate(value: f64, floor: f64) -> f64 {
    if (value * 1e4).round() == 0.0 {
        floor
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Days;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn at_anchor_returns_short_term_exactly() {
        for strength in [0.1, 0.5, 1.0, 2.0] {
            assert_eq!(blend(anchor(), -0.17, 0.42, strength, anchor()), -0.17);
        }
    }

    #[test]
    fn before_anchor_returns_short_term() {
        let earlier = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(blend(earlier, 0.30, 0.20, 1.0, anchor()), 0.30);
    }

    #[test]
    fn at_horizon_returns_long_term() {
        let horizon = anchor() + Days::new(HORIZON_DAYS as u64);
        assert_abs_diff_eq!(blend(horizon, 0.30, 0.20, 1.0, anchor()), 0.20);
        let ten_years = NaiveDate::from_ymd_opt(2034, 1, 1).unwrap();
        assert_abs_diff_eq!(blend(ten_years, 0.30, 0.20, 1.0, anchor()), 0.20);
    }

    #[test]
    fn linear_strength_midpoint() {
        // strength = 1 → weights are l2 and l1, equal at half the horizon.
        let mid = anchor() + Days::new((HORIZON_DAYS / 2) as u64);
        assert_abs_diff_eq!(blend(mid, 0.30, 0.20, 1.0, anchor()), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn higher_strength_moves_faster_to_long_term() {
        let one_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let slow = blend(one_year, 0.30, 0.20, 1.0, anchor());
        let fast = blend(one_year, 0.30, 0.20, 1.5, anchor());
        assert!((fast - 0.20).abs() < (slow - 0.20).abs());
    }

    #[test]
    fn stays_within_endpoints() {
        for months in [1u32, 3, 6, 12, 24, 60, 119] {
            let t = anchor() + chrono::Months::new(months);
            let v = blend(t, -0.3, -0.1, 0.7, anchor());
            assert!((-0.3..=-0.1).contains(&v), "blend at {t} = {v}");
        }
    }

    #[test]
    fn floor_replaces_near_zero_only() {
        assert_eq!(floor_degenerate(0.0, 0.001), 0.001);
        assert_eq!(floor_degenerate(0.00004, -0.0001), -0.0001);
        assert_eq!(floor_degenerate(0.0002, 0.001), 0.0002);
        assert_eq!(floor_degenerate(-0.25, -0.0001), -0.25);
    }
}
