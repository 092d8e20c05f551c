//! Direct edits of an SVI-JW surface.
//!
//! Every edit validates first and returns a new surface, so a rejected edit
//! leaves the caller's surface untouched.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};
use crate::market::{CalendarOracle, ForwardOracle};
use crate::smile::{SmileSlice, SpxExtension};
use crate::surface::Surface;
use crate::surface::expander::{business_year, carry_at};
use crate::validate::{validate_after, validate_positive};

/// User-editable fields of one slice. `tau` and `forward` are derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceEdit {
    pub vol: f64,
    pub skew: f64,
    pub p_wing: f64,
    pub c_wing: f64,
    pub min_vol: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spx: Option<SpxExtension>,
}

impl SliceEdit {
    /// The editable fields of an existing slice.
    pub fn of(slice: &SmileSlice) -> Self {
        Self {
            vol: slice.vol(),
            skew: slice.skew(),
            p_wing: slice.p_wing(),
            c_wing: slice.c_wing(),
            min_vol: slice.min_vol(),
            spx: slice.spx(),
        }
    }

    fn apply(&self, tau: f64, forward: f64) -> error::Result<SmileSlice> {
        let slice = SmileSlice::new(
            self.vol,
            self.skew,
            self.p_wing,
            self.c_wing,
            self.min_vol,
            tau,
            forward,
        )?;
        match self.spx {
            Some(ext) => slice.with_spx(ext),
            None => Ok(slice),
        }
    }
}

/// Insert `date` into the sorted maturity list.
///
/// # Errors
/// Returns [`VolMarkError::InvalidInput`] if `date` is on or before
/// `value_date` or already listed.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use volmark::surface::add_maturity;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
/// let list = add_maturity(&[d(6, 21), d(12, 20)], d(9, 20), d(1, 2))?;
/// assert_eq!(list, vec![d(6, 21), d(9, 20), d(12, 20)]);
/// assert!(add_maturity(&list, d(9, 20), d(1, 2)).is_err());
/// # Ok::<(), volmark::VolMarkError>(())
/// ```
pub fn add_maturity(
    maturities: &[NaiveDate],
    date: NaiveDate,
    value_date: NaiveDate,
) -> error::Result<Vec<NaiveDate>> {
    validate_after(date, value_date, "maturity")?;
    if maturities.contains(&date) {
        return Err(VolMarkError::InvalidInput {
            message: format!("maturity {date} already exists"),
        });
    }
    let mut out = maturities.to_vec();
    out.push(date);
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

impl Surface {
    /// Same surface without the slice at `maturity`.
    ///
    /// # Errors
    /// Returns [`VolMarkError::MissingData`] if there is no such slice.
    pub fn without_maturity(&self, maturity: NaiveDate) -> error::Result<Self> {
        if self.slice(maturity).is_none() {
            return Err(VolMarkError::MissingData {
                message: format!("no slice at {maturity}"),
            });
        }
        let slices: BTreeMap<NaiveDate, SmileSlice> = self
            .slices()
            .filter(|(m, _)| *m != maturity)
            .map(|(m, s)| (m, s.clone()))
            .collect();
        self.with_slices(slices)
    }

    /// Replace or add the slice at `maturity`.
    ///
    /// An existing maturity keeps its `tau` and `forward`; a new one gets
    /// them from the oracles, measured from the surface anchor.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if the edit violates a slice
    /// invariant or `maturity` is not after the anchor date, and
    /// [`VolMarkError::OracleFailure`] if a new maturity cannot be priced.
    pub fn with_slice_edit(
        &self,
        maturity: NaiveDate,
        edit: SliceEdit,
        calendar: &dyn CalendarOracle,
        forward: &dyn ForwardOracle,
    ) -> error::Result<Self> {
        validate_after(maturity, self.anchor_date(), "maturity")?;
        let (tau, fwd) = match self.slice(maturity) {
            Some(existing) => (existing.tau().0, existing.forward()),
            None => {
                let year_days = business_year(calendar, self.anchor_date())?;
                carry_at(
                    calendar,
                    forward,
                    self.anchor(),
                    self.anchor_date(),
                    year_days,
                    maturity,
                )?
            }
        };
        let slice = edit.apply(tau, fwd)?;

        #[cfg(feature = "logging")]
        tracing::debug!(%maturity, vol = slice.vol(), skew = slice.skew(), "slice edited");

        let mut slices: BTreeMap<NaiveDate, SmileSlice> =
            self.slices().map(|(m, s)| (m, s.clone())).collect();
        slices.insert(maturity, slice);
        self.with_slices(slices)
    }

    /// Move the surface to a new anchor spot and date.
    ///
    /// Slices on or before `anchor_date` are dropped; every retained slice
    /// keeps its smile shape and gets a fresh `tau` and `forward`.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] for a non-positive anchor and
    /// [`VolMarkError::OracleFailure`] if an oracle call fails.
    pub fn reanchor(
        &self,
        anchor: f64,
        anchor_date: NaiveDate,
        calendar: &dyn CalendarOracle,
        forward: &dyn ForwardOracle,
    ) -> error::Result<Self> {
        validate_positive(anchor, "anchor")?;
        let year_days = business_year(calendar, anchor_date)?;

        let mut slices = BTreeMap::new();
        for (maturity, slice) in self.slices().filter(|(m, _)| *m > anchor_date) {
            let (tau, fwd) = carry_at(calendar, forward, anchor, anchor_date, year_days, maturity)?;
            slices.insert(maturity, slice.with_carry(tau, fwd)?);
        }

        #[cfg(feature = "logging")]
        tracing::debug!(
            anchor,
            %anchor_date,
            n_dropped = self.len() - slices.len(),
            "surface re-anchored"
        );

        let moved = Surface::new(self.underlying(), self.model(), anchor, anchor_date, slices)?;
        Ok(match self.last_update() {
            Some(stamp) => moved.stamped(stamp.clone()),
            None => moved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::HolidayCalendar;
    use crate::surface::ModelTag;
    use approx::assert_abs_diff_eq;

    struct FlatForward;

    impl ForwardOracle for FlatForward {
        fn forward(&self, spot: f64, _: NaiveDate, _: NaiveDate) -> error::Result<f64> {
            Ok(spot * 1.01)
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn surface() -> Surface {
        let slices = [
            (d(2024, 3, 15), SmileSlice::from_term_point(0.25, -0.1, 1.0, 0.2, 1.0).unwrap()),
            (d(2024, 6, 21), SmileSlice::from_term_point(0.22, -0.1, 1.0, 0.45, 1.01).unwrap()),
            (d(2024, 12, 20), SmileSlice::from_term_point(0.20, -0.1, 1.0, 0.96, 1.02).unwrap()),
        ];
        Surface::new("SX5E", ModelTag::SviJw, 5000.0, d(2024, 1, 2), slices).unwrap()
    }

    #[test]
    fn remove_slice() {
        let s = surface().without_maturity(d(2024, 6, 21)).unwrap();
        assert_eq!(s.maturities(), vec![d(2024, 3, 15), d(2024, 12, 20)]);
        assert!(matches!(
            s.without_maturity(d(2024, 6, 21)),
            Err(VolMarkError::MissingData { .. })
        ));
    }

    #[test]
    fn edit_existing_keeps_carry() {
        let cal = HolidayCalendar::weekends_only("EU");
        let s = surface();
        let mut edit = SliceEdit::of(s.slice(d(2024, 6, 21)).unwrap());
        edit.vol = 0.3;
        edit.min_vol = 0.28;
        let edited = s.with_slice_edit(d(2024, 6, 21), edit, &cal, &FlatForward).unwrap();
        let slice = edited.slice(d(2024, 6, 21)).unwrap();
        assert_eq!(slice.vol(), 0.3);
        assert_eq!(slice.tau().0, 0.45);
        assert_eq!(slice.forward(), 1.01);
    }

    #[test]
    fn edit_new_maturity_computes_carry() {
        let cal = HolidayCalendar::weekends_only("EU");
        let s = surface();
        let edit = SliceEdit::of(s.slice(d(2024, 6, 21)).unwrap());
        let edited = s.with_slice_edit(d(2024, 9, 20), edit, &cal, &FlatForward).unwrap();
        let slice = edited.slice(d(2024, 9, 20)).unwrap();
        assert_abs_diff_eq!(slice.forward(), 1.01, epsilon = 1e-12);
        let expected = cal.business_days(d(2024, 1, 2), d(2024, 9, 20)).unwrap() as f64
            / cal.business_days_in_year(d(2024, 1, 2)).unwrap() as f64;
        assert_abs_diff_eq!(slice.tau().0, expected, epsilon = 1e-15);
    }

    #[test]
    fn invalid_edit_is_rejected() {
        let cal = HolidayCalendar::weekends_only("EU");
        let s = surface();
        let mut edit = SliceEdit::of(s.slice(d(2024, 6, 21)).unwrap());
        edit.p_wing = -0.1;
        assert!(s.with_slice_edit(d(2024, 6, 21), edit, &cal, &FlatForward).is_err());
        edit.p_wing = 0.6;
        edit.min_vol = 1.0;
        assert!(s.with_slice_edit(d(2024, 6, 21), edit, &cal, &FlatForward).is_err());
        assert!(s.with_slice_edit(d(2023, 6, 21), SliceEdit::of(s.slice(d(2024, 6, 21)).unwrap()), &cal, &FlatForward).is_err());
    }

    #[test]
    fn reanchor_drops_expired_and_recomputes() {
        let cal = HolidayCalendar::weekends_only("EU");
        let s = surface();
        let moved = s.reanchor(5100.0, d(2024, 3, 15), &cal, &FlatForward).unwrap();
        assert_eq!(moved.maturities(), vec![d(2024, 6, 21), d(2024, 12, 20)]);
        assert_eq!(moved.anchor(), 5100.0);
        assert_eq!(moved.anchor_date(), d(2024, 3, 15));
        let slice = moved.slice(d(2024, 6, 21)).unwrap();
        assert_eq!(slice.vol(), 0.22);
        assert_abs_diff_eq!(slice.forward(), 1.01, epsilon = 1e-12);
        let expected = cal.business_days(d(2024, 3, 15), d(2024, 6, 21)).unwrap() as f64
            / cal.business_days_in_year(d(2024, 3, 15)).unwrap() as f64;
        assert_abs_diff_eq!(slice.tau().0, expected, epsilon = 1e-15);
    }
}
