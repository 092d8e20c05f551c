//! SVI-S → SVI-JW expansion.
//!
//! For every target maturity `T` after the anchor date:
//!
//! ```text
//! vol, skew, convex = blend(T, ...)       per axis, skew/convex floored
//! pWing = convex/2 − skew,  cWing = convex/2 + skew
//! minVol = vol · 4·pWing·cWing / (pWing + cWing)²
//! tau     = businessDays(T₀, T) / businessDaysInYear(T₀)
//! forward = forwardOracle(anchor, T, T₀) / anchor
//! ```
//!
//! ```
//! use chrono::NaiveDate;
//! use volmark::market::{ForwardOracle, HolidayCalendar};
//! use volmark::surface::SurfaceExpander;
//! use volmark::term::TermStructureParams;
//!
//! struct FlatForward;
//! impl ForwardOracle for FlatForward {
//!     fn forward(&self, spot: f64, _: NaiveDate, _: NaiveDate) -> volmark::Result<f64> {
//!         Ok(spot)
//!     }
//! }
//!
//! let anchor_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let params = TermStructureParams::default_for("SPX", 4800.0, anchor_date)?;
//! let calendar = HolidayCalendar::weekends_only("US");
//! let maturities = [NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()];
//!
//! let surface = SurfaceExpander::new(&calendar, &FlatForward).expand(&params, &maturities)?;
//! assert_eq!(surface.len(), 1);
//! # Ok::<(), volmark::VolMarkError>(())
//! ```

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::config::DegenerateFloors;
use crate::error::{self, VolMarkError};
use crate::market::{CalendarOracle, ForwardOracle};
use crate::smile::SmileSlice;
use crate::surface::{ModelTag, Surface, UpdateStamp};
use crate::term::{TermStructureParams, blend, floor_degenerate};
use crate::validate::validate_positive;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Expands SVI-S parameters into an SVI-JW [`Surface`].
///
/// Holds the calendar and forward collaborators plus the degenerate-input
/// floors; reusable across parameter sets.
pub struct SurfaceExpander<'a> {
    calendar: &'a dyn CalendarOracle,
    forward: &'a dyn ForwardOracle,
    floors: DegenerateFloors,
    author: Option<String>,
}

impl<'a> SurfaceExpander<'a> {
    pub fn new(calendar: &'a dyn CalendarOracle, forward: &'a dyn ForwardOracle) -> Self {
        Self {
            calendar,
            forward,
            floors: DegenerateFloors::default(),
            author: None,
        }
    }

    /// Override the skew/convexity floors.
    pub fn floors(mut self, floors: DegenerateFloors) -> Self {
        self.floors = floors;
        self
    }

    /// Stamp expanded surfaces with `author` and the current time.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Expand `params` at `maturities`.
    ///
    /// Maturities on or before the anchor date are skipped; duplicates
    /// collapse to one slice.
    ///
    /// # Errors
    /// Returns [`VolMarkError::OracleFailure`] if the calendar or forward
    /// oracle fails, [`VolMarkError::NumericalError`] for a non-positive
    /// business-day year, and [`VolMarkError::InvalidInput`] if the blended
    /// skew is too large for the blended convexity at some maturity.
    pub fn expand(
        &self,
        params: &TermStructureParams,
        maturities: &[NaiveDate],
    ) -> error::Result<Surface> {
        let anchor_date = params.anchor_date();
        let targets: Vec<NaiveDate> = maturities
            .iter()
            .copied()
            .filter(|m| *m > anchor_date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        #[cfg(feature = "logging")]
        tracing::debug!(
            underlying = params.underlying(),
            n_requested = maturities.len(),
            n_maturities = targets.len(),
            "surface expansion started"
        );

        let year_days = business_year(self.calendar, anchor_date)?;

        let vol = params.vol();
        let skew = params.skew();
        let convex = params.convex();
        let skew_st = floor_degenerate(skew.short_term, self.floors.skew);
        let skew_lt = floor_degenerate(skew.long_term, self.floors.skew);
        let convex_st = floor_degenerate(convex.short_term, self.floors.convexity);
        let convex_lt = floor_degenerate(convex.long_term, self.floors.convexity);

        let expand_one = |maturity: &NaiveDate| -> error::Result<(NaiveDate, SmileSlice)> {
            let m = *maturity;
            let v = blend(m, vol.short_term, vol.long_term, vol.strength, anchor_date);
            let s = blend(m, skew_st, skew_lt, skew.strength, anchor_date);
            let c = blend(m, convex_st, convex_lt, convex.strength, anchor_date);
            let (tau, forward) = carry_at(
                self.calendar,
                self.forward,
                params.anchor(),
                anchor_date,
                year_days,
                m,
            )?;
            let slice = SmileSlice::from_term_point(v, s, c, tau, forward).map_err(|e| {
                VolMarkError::InvalidInput {
                    message: format!("maturity {m}: {e}"),
                }
            })?;
            Ok((m, slice))
        };

        #[cfg(feature = "parallel")]
        let slices = targets
            .par_iter()
            .map(expand_one)
            .collect::<error::Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let slices = targets
            .iter()
            .map(expand_one)
            .collect::<error::Result<Vec<_>>>()?;

        let surface = Surface::new(
            params.underlying(),
            ModelTag::SviJw,
            params.anchor(),
            anchor_date,
            slices,
        )?;

        #[cfg(feature = "logging")]
        tracing::debug!(n_slices = surface.len(), "surface expansion complete");

        Ok(match &self.author {
            Some(author) => surface.stamped(UpdateStamp::now(author.clone())),
            None => surface,
        })
    }
}

/// Expand with default floors and no update stamp.
pub fn expand(
    params: &TermStructureParams,
    maturities: &[NaiveDate],
    calendar: &dyn CalendarOracle,
    forward: &dyn ForwardOracle,
) -> error::Result<Surface> {
    SurfaceExpander::new(calendar, forward).expand(params, maturities)
}

/// Business days in the year starting at `date`, as a positive divisor.
pub(crate) fn business_year(calendar: &dyn CalendarOracle, date: NaiveDate) -> error::Result<f64> {
    let days = calendar.business_days_in_year(date)?;
    if days <= 0 {
        return Err(VolMarkError::NumericalError {
            message: format!("business days in year from {date} is {days}"),
        });
    }
    Ok(days as f64)
}

/// `(tau, forward / anchor)` of `maturity` seen from the anchor.
pub(crate) fn carry_at(
    calendar: &dyn CalendarOracle,
    forward: &dyn ForwardOracle,
    anchor: f64,
    anchor_date: NaiveDate,
    year_days: f64,
    maturity: NaiveDate,
) -> error::Result<(f64, f64)> {
    let days = calendar.business_days(anchor_date, maturity)?;
    let tau = days as f64 / year_days;
    let fwd = forward.forward(anchor, maturity, anchor_date)?;
    let ratio = validate_positive(fwd / anchor, &format!("forward ratio at {maturity}"))
        .map_err(|e| VolMarkError::oracle("forward", e.to_string()))?;
    Ok((tau, ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::HolidayCalendar;
    use crate::term::AxisParams;
    use approx::assert_abs_diff_eq;

    struct GrowthForward(f64);

    impl ForwardOracle for GrowthForward {
        fn forward(&self, spot: f64, maturity: NaiveDate, value_date: NaiveDate) -> error::Result<f64> {
            let t = (maturity - value_date).num_days() as f64 / 365.0;
            Ok(spot * (self.0 * t).exp())
        }
    }

    struct DownForward;

    impl ForwardOracle for DownForward {
        fn forward(&self, _: f64, _: NaiveDate, _: NaiveDate) -> error::Result<f64> {
            Err(VolMarkError::oracle("forward", "timeout"))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn params(vol: AxisParams, skew: AxisParams, convex: AxisParams) -> TermStructureParams {
        TermStructureParams::new("SX5E", 5000.0, d(2024, 1, 1), vol, skew, convex).unwrap()
    }

    #[test]
    fn vol_blends_from_short_to_long_term() {
        let cal = HolidayCalendar::weekends_only("EU");
        let p = params(
            AxisParams::new(0.30, 0.20, 1.0),
            AxisParams::new(-0.1, -0.1, 1.0),
            AxisParams::new(1.0, 1.0, 1.0),
        );
        let s = SurfaceExpander::new(&cal, &GrowthForward(0.02))
            .expand(&p, &[d(2034, 1, 1), d(2029, 1, 1)])
            .unwrap();
        let far = s.slice(d(2034, 1, 1)).unwrap();
        assert_abs_diff_eq!(far.vol(), 0.20, epsilon = 1e-15);
        let mid = s.slice(d(2029, 1, 1)).unwrap().vol();
        assert!(mid > 0.20 && mid < 0.30);
    }

    #[test]
    fn wings_and_carry_follow_formulas() {
        let cal = HolidayCalendar::weekends_only("EU");
        let p = params(
            AxisParams::new(0.2, 0.2, 1.0),
            AxisParams::new(-0.1, -0.1, 1.0),
            AxisParams::new(1.0, 1.0, 1.0),
        );
        let m = d(2024, 7, 1);
        let s = expand(&p, &[m], &cal, &GrowthForward(0.03)).unwrap();
        let slice = s.slice(m).unwrap();
        assert_abs_diff_eq!(slice.p_wing(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(slice.c_wing(), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(slice.min_vol(), 0.2 * 0.96, epsilon = 1e-12);

        let bd = cal.business_days(d(2024, 1, 1), m).unwrap() as f64;
        let year = cal.business_days_in_year(d(2024, 1, 1)).unwrap() as f64;
        assert_abs_diff_eq!(slice.tau().0, bd / year, epsilon = 1e-15);
        let t = (m - d(2024, 1, 1)).num_days() as f64 / 365.0;
        assert_abs_diff_eq!(slice.forward(), (0.03 * t).exp(), epsilon = 1e-12);
    }

    #[test]
    fn past_and_duplicate_maturities_are_dropped() {
        let cal = HolidayCalendar::weekends_only("EU");
        let p = params(
            AxisParams::new(0.2, 0.2, 1.0),
            AxisParams::new(-0.1, -0.1, 1.0),
            AxisParams::new(1.0, 1.0, 1.0),
        );
        let s = expand(
            &p,
            &[d(2023, 12, 15), d(2024, 1, 1), d(2024, 3, 15), d(2024, 3, 15)],
            &cal,
            &GrowthForward(0.0),
        )
        .unwrap();
        assert_eq!(s.maturities(), vec![d(2024, 3, 15)]);
    }

    #[test]
    fn zero_skew_and_convexity_are_floored() {
        let cal = HolidayCalendar::weekends_only("EU");
        let p = params(
            AxisParams::new(0.2, 0.2, 1.0),
            AxisParams::new(0.0, 0.0, 1.0),
            AxisParams::new(0.0, 0.0, 1.0),
        );
        let s = expand(&p, &[d(2025, 1, 1)], &cal, &GrowthForward(0.0)).unwrap();
        let slice = s.slice(d(2025, 1, 1)).unwrap();
        assert_abs_diff_eq!(slice.skew(), -0.0001, epsilon = 1e-15);
        assert_abs_diff_eq!(slice.convexity(), 0.001, epsilon = 1e-15);
        assert!(slice.p_wing() > 0.0 && slice.c_wing() > 0.0);
        assert!(slice.min_vol().is_finite());
    }

    #[test]
    fn forward_failure_is_reported() {
        let cal = HolidayCalendar::weekends_only("EU");
        let p = TermStructureParams::default_for("X", 100.0, d(2024, 1, 1)).unwrap();
        let err = expand(&p, &[d(2024, 6, 1)], &cal, &DownForward).unwrap_err();
        assert!(err.is_oracle_failure());
    }

    #[test]
    fn author_is_stamped() {
        let cal = HolidayCalendar::weekends_only("EU");
        let p = TermStructureParams::default_for("X", 100.0, d(2024, 1, 1)).unwrap();
        let s = SurfaceExpander::new(&cal, &GrowthForward(0.0))
            .author("desk")
            .expand(&p, &[d(2024, 6, 1)])
            .unwrap();
        assert_eq!(s.last_update().map(|u| u.author.as_str()), Some("desk"));
    }
}
