//! SVI Jump-Wing smile slice.
//!
//! One maturity of an SVI-JW surface in the dashboard's parametrization:
//!
//! ```text
//! pWing  = convex/2 − skew
//! cWing  = convex/2 + skew
//! minVol = vol · 4·pWing·cWing / (pWing + cWing)²
//! ```
//!
//! By AM-GM, `4pc ≤ (p + c)²`, so `0 < minVol ≤ vol` whenever both wings
//! are positive.
//!
//! # References
//! - Gatheral, J. & Jacquier, A. "Arbitrage-free SVI Volatility Surfaces" (2014), §3.3

use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};
use crate::types::{Tau, Vol};
use crate::validate::{validate_finite, validate_positive};

/// Extra wing-shape parameters carried by SVI-SPX slices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpxExtension {
    pub loc: f64,
    pub w: f64,
}

/// A single SVI-JW smile slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SmileSliceRaw", into = "SmileSliceRaw")]
pub struct SmileSlice {
    vol: f64,
    skew: f64,
    p_wing: f64,
    c_wing: f64,
    min_vol: f64,
    /// Business-day year fraction from the surface anchor date.
    tau: f64,
    /// Forward as a multiple of the anchor spot.
    forward: f64,
    spx: Option<SpxExtension>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SmileSliceRaw {
    vol: f64,
    skew: f64,
    p_wing: f64,
    c_wing: f64,
    min_vol: f64,
    tau: f64,
    forward: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spx: Option<SpxExtension>,
}

impl TryFrom<SmileSliceRaw> for SmileSlice {
    type Error = VolMarkError;
    fn try_from(raw: SmileSliceRaw) -> Result<Self, Self::Error> {
        let slice = Self::new(
            raw.vol,
            raw.skew,
            raw.p_wing,
            raw.c_wing,
            raw.min_vol,
            raw.tau,
            raw.forward,
        )?;
        match raw.spx {
            Some(ext) => slice.with_spx(ext),
            None => Ok(slice),
        }
    }
}

impl From<SmileSlice> for SmileSliceRaw {
    fn from(s: SmileSlice) -> Self {
        Self {
            vol: s.vol,
            skew: s.skew,
            p_wing: s.p_wing,
            c_wing: s.c_wing,
            min_vol: s.min_vol,
            tau: s.tau,
            forward: s.forward,
            spx: s.spx,
        }
    }
}

impl SmileSlice {
    /// Create a slice from explicit SVI-JW parameters.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] unless `vol > 0`, both wings
    /// are positive, `0 ≤ minVol ≤ vol`, `tau ≥ 0` and `forward > 0`.
    pub fn new(
        vol: f64,
        skew: f64,
        p_wing: f64,
        c_wing: f64,
        min_vol: f64,
        tau: f64,
        forward: f64,
    ) -> error::Result<Self> {
        validate_positive(vol, "vol")?;
        validate_finite(skew, "skew")?;
        validate_positive(p_wing, "put wing")?;
        validate_positive(c_wing, "call wing")?;
        validate_finite(min_vol, "min vol")?;
        if min_vol < 0.0 || min_vol > vol {
            return Err(VolMarkError::InvalidInput {
                message: format!("min vol must lie in [0, vol={vol}], got {min_vol}"),
            });
        }
        validate_finite(tau, "tau")?;
        if tau < 0.0 {
            return Err(VolMarkError::InvalidInput {
                message: format!("tau must be non-negative, got {tau}"),
            });
        }
        validate_positive(forward, "forward")?;

        Ok(Self {
            vol,
            skew,
            p_wing,
            c_wing,
            min_vol,
            tau,
            forward,
            spx: None,
        })
    }

    /// Build a slice from blended ATM vol, skew and convexity.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if `|skew| ≥ convex/2`, which
    /// would make one wing non-positive.
    ///
    /// # Examples
    /// ```
    /// use volmark::smile::SmileSlice;
    ///
    /// let s = SmileSlice::from_term_point(0.20, -0.1, 1.0, 0.5, 1.01)?;
    /// assert!((s.p_wing() - 0.6).abs() < 1e-12);
    /// assert!((s.c_wing() - 0.4).abs() < 1e-12);
    /// assert!((s.min_vol() - 0.20 * 0.96).abs() < 1e-12);
    /// # Ok::<(), volmark::VolMarkError>(())
    /// ```
    pub fn from_term_point(
        vol: f64,
        skew: f64,
        convex: f64,
        tau: f64,
        forward: f64,
    ) -> error::Result<Self> {
        validate_positive(convex, "convexity")?;
        let p_wing = convex / 2.0 - skew;
        let c_wing = convex / 2.0 + skew;
        if p_wing <= 0.0 || c_wing <= 0.0 {
            return Err(VolMarkError::InvalidInput {
                message: format!(
                    "skew {skew} too large for convexity {convex}: wings would be ({p_wing}, {c_wing})"
                ),
            });
        }
        let min_vol = vol * min_vol_ratio(p_wing, c_wing);
        Self::new(vol, skew, p_wing, c_wing, min_vol, tau, forward)
    }

    /// Attach SVI-SPX wing-shape parameters.
    pub fn with_spx(mut self, ext: SpxExtension) -> error::Result<Self> {
        validate_finite(ext.loc, "loc")?;
        validate_finite(ext.w, "w")?;
        self.spx = Some(ext);
        Ok(self)
    }

    /// Same smile, new time-to-maturity and forward (used on re-anchoring).
    pub fn with_carry(&self, tau: f64, forward: f64) -> error::Result<Self> {
        validate_finite(tau, "tau")?;
        validate_positive(forward, "forward")?;
        Ok(Self {
            tau: tau.max(0.0),
            forward,
            ..self.clone()
        })
    }

    pub fn vol(&self) -> f64 {
        self.vol
    }

    pub fn atm_vol(&self) -> Vol {
        Vol(self.vol)
    }

    pub fn skew(&self) -> f64 {
        self.skew
    }

    pub fn p_wing(&self) -> f64 {
        self.p_wing
    }

    pub fn c_wing(&self) -> f64 {
        self.c_wing
    }

    pub fn min_vol(&self) -> f64 {
        self.min_vol
    }

    pub fn tau(&self) -> Tau {
        Tau(self.tau)
    }

    pub fn forward(&self) -> f64 {
        self.forward
    }

    pub fn spx(&self) -> Option<SpxExtension> {
        self.spx
    }

    /// Convexity recovered from the wings: `pWing + cWing`.
    pub fn convexity(&self) -> f64 {
        self.p_wing + self.c_wing
    }

    /// Skew recovered from the wings: `(cWing − pWing) / 2`.
    pub fn wing_skew(&self) -> f64 {
        (self.c_wing - self.p_wing) / 2.0
    }
}

/// `4·p·c / (p + c)²`, the ratio of minimum vol to ATM vol.
///
/// Lies in `(0, 1]` for positive wings, equal to 1 only when `p == c`.
pub fn min_vol_ratio(p_wing: f64, c_wing: f64) -> f64 {
    let sum = p_wing + c_wing;
    (4.0 * p_wing * c_wing / (sum * sum)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn equity_slice() -> SmileSlice {
        SmileSlice::from_term_point(0.25, -0.15, 0.8, 0.5, 0.99).unwrap()
    }

    #[test]
    fn wings_from_skew_and_convexity() {
        let s = equity_slice();
        assert_abs_diff_eq!(s.p_wing(), 0.55, epsilon = 1e-14);
        assert_abs_diff_eq!(s.c_wing(), 0.25, epsilon = 1e-14);
        assert_abs_diff_eq!(
            s.min_vol(),
            0.25 * 4.0 * 0.55 * 0.25 / 0.64,
            epsilon = 1e-14
        );
    }

    #[test]
    fn convexity_and_skew_round_trip() {
        let s = equity_slice();
        assert_abs_diff_eq!(s.convexity(), 0.8, epsilon = 1e-14);
        assert_abs_diff_eq!(s.wing_skew(), -0.15, epsilon = 1e-14);
    }

    #[test]
    fn symmetric_wings_give_min_vol_equal_vol() {
        let s = SmileSlice::from_term_point(0.3, 0.0, 1.0, 1.0, 1.0).unwrap();
        assert_abs_diff_eq!(s.min_vol(), s.vol(), epsilon = 1e-14);
    }

    #[test]
    fn min_vol_ratio_bounds() {
        for &(p, c) in &[(0.5, 0.5), (0.9, 0.1), (0.001, 3.0), (2.0, 0.7)] {
            let r = min_vol_ratio(p, c);
            assert!(r > 0.0 && r <= 1.0, "ratio({p}, {c}) = {r}");
        }
    }

    #[test]
    fn oversized_skew_rejected() {
        assert!(SmileSlice::from_term_point(0.2, -0.6, 1.0, 0.5, 1.0).is_err());
        assert!(SmileSlice::from_term_point(0.2, 0.5, 1.0, 0.5, 1.0).is_err());
        assert!(SmileSlice::from_term_point(0.2, 0.0, 0.0, 0.5, 1.0).is_err());
    }

    #[test]
    fn new_rejects_invalid_params() {
        assert!(SmileSlice::new(0.0, -0.1, 0.6, 0.4, 0.19, 0.5, 1.0).is_err());
        assert!(SmileSlice::new(0.2, -0.1, 0.0, 0.4, 0.19, 0.5, 1.0).is_err());
        assert!(SmileSlice::new(0.2, -0.1, 0.6, -0.4, 0.19, 0.5, 1.0).is_err());
        assert!(SmileSlice::new(0.2, -0.1, 0.6, 0.4, 0.25, 0.5, 1.0).is_err());
        assert!(SmileSlice::new(0.2, -0.1, 0.6, 0.4, 0.19, -0.5, 1.0).is_err());
        assert!(SmileSlice::new(0.2, -0.1, 0.6, 0.4, 0.19, 0.5, 0.0).is_err());
        assert!(SmileSlice::new(0.2, f64::NAN, 0.6, 0.4, 0.19, 0.5, 1.0).is_err());
    }

    #[test]
    fn with_carry_keeps_shape() {
        let s = equity_slice();
        let t = s.with_carry(0.25, 1.02).unwrap();
        assert_eq!(t.vol(), s.vol());
        assert_eq!(t.p_wing(), s.p_wing());
        assert_eq!(t.tau().0, 0.25);
        assert_eq!(t.forward(), 1.02);
        assert!(s.with_carry(0.25, 0.0).is_err());
    }

    #[test]
    fn serde_uses_camel_case_and_validates() {
        let s = equity_slice();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("pWing") && json.contains("minVol"));
        let back: SmileSlice = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);

        let bad = r#"{"vol":0.2,"skew":-0.1,"pWing":-0.6,"cWing":0.4,"minVol":0.19,"tau":0.5,"forward":1.0}"#;
        let err = serde_json::from_str::<SmileSlice>(bad).unwrap_err();
        assert!(err.to_string().contains("put wing"));
    }

    #[test]
    fn spx_extension_survives_serde() {
        let s = equity_slice()
            .with_spx(SpxExtension { loc: 0.05, w: 0.3 })
            .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: SmileSlice = serde_json::from_str(&json).unwrap();
        assert_eq!(back.spx(), Some(SpxExtension { loc: 0.05, w: 0.3 }));
    }
}
