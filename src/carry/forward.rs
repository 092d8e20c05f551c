//! Forward curve for display.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, Degraded};
use crate::market::ForwardOracle;
use crate::validate::validate_positive;

/// Forward at one maturity; `forward` is `None` when the oracle failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardPoint {
    pub maturity: NaiveDate,
    pub forward: Option<f64>,
    /// `forward / spot`.
    pub ratio: Option<f64>,
}

/// Forwards at `maturities` seen from `value_date`.
///
/// Failed oracle calls leave that maturity's forward empty; the first
/// failure is reported alongside the curve.
///
/// # Errors
/// Returns [`VolMarkError::InvalidInput`](crate::VolMarkError::InvalidInput)
/// if `spot` is not positive.
pub fn forward_curve(
    spot: f64,
    maturities: &[NaiveDate],
    oracle: &dyn ForwardOracle,
    value_date: NaiveDate,
) -> error::Result<Degraded<Vec<ForwardPoint>>> {
    validate_positive(spot, "spot")?;

    let mut failure = None;
    let points = maturities
        .iter()
        .map(|&maturity| match oracle.forward(spot, maturity, value_date) {
            Ok(fwd) => ForwardPoint {
                maturity,
                forward: Some(fwd),
                ratio: Some(fwd / spot),
            },
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!(%maturity, error = %e, "forward unavailable");
                failure.get_or_insert(e);
                ForwardPoint {
                    maturity,
                    forward: None,
                    ratio: None,
                }
            }
        })
        .collect();

    Ok(match failure {
        Some(e) => Degraded::fallback(points, e),
        None => Degraded::clean(points),
    })
}
