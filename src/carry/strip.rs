//! Implied-dividend stripping.
//!
//! Walks a fitted repo curve in ascending maturity order and splits the
//! carry into the system's own dividends and the dividends implied by the
//! fitted repo:
//!
//! ```text
//! systemDiv(T)    = Σ div(d),  refDate < d ≤ T
//! impliedTotal(T) = systemDiv(T) + spot · (fittedRepo(T) − systemRepo(T)) · tau(T)
//! point(T)        = total(T) − total(previous T)
//! ```
//!
//! Points are incremental, so each series telescopes to its last total.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};
use crate::market::{CalendarOracle, RepoRateOracle, RepoSchedule, SystemCarry};
use crate::validate::validate_positive;

/// One maturity of a [`CarryDecomposition`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarryPoint {
    pub maturity: NaiveDate,
    pub tau: f64,
    pub fitted_repo: f64,
    pub system_repo: f64,
    /// Incremental system dividend since the previous maturity.
    pub system_dividend: f64,
    /// Incremental implied dividend since the previous maturity.
    pub implied_dividend: f64,
}

/// Result of [`strip`]: per-maturity points plus the maturities skipped
/// because an oracle failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarryDecomposition {
    points: Vec<CarryPoint>,
    system_total: f64,
    implied_total: f64,
    skipped: Vec<(NaiveDate, VolMarkError)>,
}

impl CarryDecomposition {
    pub fn points(&self) -> &[CarryPoint] {
        &self.points
    }

    /// Cumulative system dividend at the last stripped maturity.
    pub fn system_total(&self) -> f64 {
        self.system_total
    }

    /// Cumulative implied dividend at the last stripped maturity.
    pub fn implied_total(&self) -> f64 {
        self.implied_total
    }

    pub fn system_dividends(&self) -> BTreeMap<NaiveDate, f64> {
        self.points
            .iter()
            .map(|p| (p.maturity, p.system_dividend))
            .collect()
    }

    /// Date-keyed implied dividend points, as sent for growth-factor fitting.
    pub fn implied_dividends(&self) -> BTreeMap<NaiveDate, f64> {
        self.points
            .iter()
            .map(|p| (p.maturity, p.implied_dividend))
            .collect()
    }

    /// Maturities left out because an oracle call failed.
    pub fn skipped(&self) -> &[(NaiveDate, VolMarkError)] {
        &self.skipped
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Strip implied dividends from `repo_fitted`.
///
/// `system` is captured once by the caller and used for every maturity's
/// system repo rate. `business_days_year` is the day-count divisor for tau.
///
/// A maturity whose calendar or repo-rate call fails is skipped: running
/// totals are left unchanged and the failure is kept in
/// [`CarryDecomposition::skipped`].
///
/// # Errors
/// Returns [`VolMarkError::InvalidInput`] if `spot` or
/// `business_days_year` is not positive.
#[allow(clippy::too_many_arguments)]
pub fn strip(
    ref_date: NaiveDate,
    repo_fitted: &RepoSchedule,
    system: &SystemCarry<'_>,
    spot: f64,
    business_days_year: f64,
    calendar: &dyn CalendarOracle,
    repo_oracle: &dyn RepoRateOracle,
) -> error::Result<CarryDecomposition> {
    validate_positive(spot, "spot")?;
    validate_positive(business_days_year, "business days per year")?;

    #[cfg(feature = "logging")]
    tracing::debug!(
        underlying = system.underlying,
        n_maturities = repo_fitted.len(),
        "carry strip started"
    );

    let mut out = CarryDecomposition::default();
    for (maturity, fitted) in repo_fitted.iter() {
        let step = calendar
            .business_days(ref_date, maturity)
            .and_then(|days| Ok((days, repo_oracle.repo_rate(maturity, system)?)));
        let (days, system_repo) = match step {
            Ok(v) => v,
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!(%maturity, error = %e, "carry point skipped");
                out.skipped.push((maturity, e));
                continue;
            }
        };

        let tau = days as f64 / business_days_year;
        let system_div = system.dividends.sum_between(ref_date, maturity);
        let implied = system_div + spot * (fitted - system_repo) * tau;
        if !implied.is_finite() {
            out.skipped.push((
                maturity,
                VolMarkError::NumericalError {
                    message: format!("implied dividend at {maturity} is {implied}"),
                },
            ));
            continue;
        }

        out.points.push(CarryPoint {
            maturity,
            tau,
            fitted_repo: fitted,
            system_repo,
            system_dividend: system_div - out.system_total,
            implied_dividend: implied - out.implied_total,
        });
        out.system_total = system_div;
        out.implied_total = implied;
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        n_points = out.points.len(),
        n_skipped = out.skipped.len(),
        implied_total = out.implied_total,
        "carry strip complete"
    );

    Ok(out)
}
