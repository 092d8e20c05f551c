//! Core domain types shared across components.
//!
//! # Newtype Strategy
//!
//! As elsewhere in the crate, outputs that are easy to confuse get newtypes:
//! a [`Vol`] read from a grid is not a [`Tau`] read from a slice. Inputs stay
//! as bare `f64` with self-describing parameter names.
//!
//! Moneyness is the exception: it is used as a *lookup key* (grid columns,
//! arbitrage check cells), and `f64` cannot be a map key. [`MoneynessKey`]
//! stores moneyness in hundredths so `0.95` and `0.9500000001` land on the
//! same column.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maturity (expiry) date of a smile slice.
pub type Maturity = NaiveDate;

/// Implied volatility `σ`, measured as annualized standard deviation.
///
/// # Examples
/// ```
/// use volmark::types::Vol;
/// let vol = Vol(0.20);
/// assert_eq!(vol.0, 0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Time to maturity as a fraction of a business-day year.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tau(pub f64);

/// Moneyness rounded to two decimals, usable as an ordered map key.
///
/// # Examples
/// ```
/// use volmark::types::MoneynessKey;
/// let k = MoneynessKey::new(0.95);
/// assert_eq!(k, MoneynessKey::new(0.9500000001));
/// assert_eq!(k.value(), 0.95);
/// assert_eq!(k.to_string(), "95%");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MoneynessKey(i64);

impl MoneynessKey {
    /// Round `moneyness` to two decimals.
    pub fn new(moneyness: f64) -> Self {
        Self((moneyness * 100.0).round() as i64)
    }

    /// Key for an absolute strike relative to `spot`.
    pub fn from_strike(strike: f64, spot: f64) -> Self {
        Self::new(strike / spot)
    }

    /// Moneyness as a multiple of spot.
    pub fn value(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Moneyness in whole percent.
    pub fn percent(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MoneynessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Outcome of a single arbitrage check cell.
///
/// The checker reports `1` for pass and `0` for fail; anything else is
/// treated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassFail {
    Pass,
    Fail,
}

impl PassFail {
    pub fn from_flag(flag: i64) -> Self {
        if flag == 1 { Self::Pass } else { Self::Fail }
    }

    pub fn is_fail(self) -> bool {
        self == Self::Fail
    }
}

impl From<bool> for PassFail {
    fn from(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moneyness_key_rounds_to_hundredths() {
        assert_eq!(MoneynessKey::new(1.0), MoneynessKey::new(0.999));
        assert_ne!(MoneynessKey::new(1.0), MoneynessKey::new(1.01));
        assert_eq!(MoneynessKey::new(0.25).percent(), 25);
    }

    #[test]
    fn moneyness_key_from_strike() {
        let k = MoneynessKey::from_strike(95.0 * 3.7, 3.7);
        assert_eq!(k, MoneynessKey::new(95.0));
        assert_eq!(MoneynessKey::from_strike(105.0, 100.0).value(), 1.05);
    }

    #[test]
    fn moneyness_key_orders_numerically() {
        let mut keys = vec![
            MoneynessKey::new(1.1),
            MoneynessKey::new(0.9),
            MoneynessKey::new(1.0),
        ];
        keys.sort();
        assert_eq!(keys[0].value(), 0.9);
        assert_eq!(keys[2].value(), 1.1);
    }

    #[test]
    fn pass_fail_from_flag() {
        assert_eq!(PassFail::from_flag(1), PassFail::Pass);
        assert_eq!(PassFail::from_flag(0), PassFail::Fail);
        assert!(PassFail::from(false).is_fail());
    }
}
