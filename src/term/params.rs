//! SVI-S term-structure parameters.
//!
//! Three axes (ATM vol, skew, convexity), each described by a short-term
//! value, a long-term value and a blending strength, anchored on a reference
//! spot and date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};
use crate::validate::{validate_finite, validate_positive};

/// Short-term / long-term / strength triple for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisParams {
    pub short_term: f64,
    pub long_term: f64,
    pub strength: f64,
}

impl AxisParams {
    pub fn new(short_term: f64, long_term: f64, strength: f64) -> Self {
        Self {
            short_term,
            long_term,
            strength,
        }
    }

    fn validate(&self, axis: &str) -> error::Result<()> {
        validate_finite(self.short_term, &format!("{axis} short term"))?;
        validate_finite(self.long_term, &format!("{axis} long term"))?;
        validate_finite(self.strength, &format!("{axis} strength"))?;
        Ok(())
    }
}

/// Compact SVI-S description of a whole surface.
///
/// Immutable: edits and re-anchoring produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TermStructureParamsRaw", into = "TermStructureParamsRaw")]
pub struct TermStructureParams {
    underlying: String,
    anchor: f64,
    anchor_date: NaiveDate,
    vol: AxisParams,
    skew: AxisParams,
    convex: AxisParams,
}

#[derive(Serialize, Deserialize)]
struct TermStructureParamsRaw {
    underlying: String,
    anchor: f64,
    anchor_date: NaiveDate,
    vol: AxisParams,
    skew: AxisParams,
    convex: AxisParams,
}

impl TryFrom<TermStructureParamsRaw> for TermStructureParams {
    type Error = VolMarkError;
    fn try_from(raw: TermStructureParamsRaw) -> Result<Self, Self::Error> {
        Self::new(
            raw.underlying,
            raw.anchor,
            raw.anchor_date,
            raw.vol,
            raw.skew,
            raw.convex,
        )
    }
}

impl From<TermStructureParams> for TermStructureParamsRaw {
    fn from(p: TermStructureParams) -> Self {
        Self {
            underlying: p.underlying,
            anchor: p.anchor,
            anchor_date: p.anchor_date,
            vol: p.vol,
            skew: p.skew,
            convex: p.convex,
        }
    }
}

impl TermStructureParams {
    /// Create SVI-S parameters.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if the anchor is not positive,
    /// any axis value is non-finite, a vol endpoint is not positive, or a
    /// convexity endpoint is negative.
    pub fn new(
        underlying: impl Into<String>,
        anchor: f64,
        anchor_date: NaiveDate,
        vol: AxisParams,
        skew: AxisParams,
        convex: AxisParams,
    ) -> error::Result<Self> {
        validate_positive(anchor, "anchor")?;
        vol.validate("vol")?;
        skew.validate("skew")?;
        convex.validate("convex")?;
        validate_positive(vol.short_term, "vol short term")?;
        validate_positive(vol.long_term, "vol long term")?;
        if convex.short_term < 0.0 || convex.long_term < 0.0 {
            return Err(VolMarkError::InvalidInput {
                message: format!(
                    "convexity must be non-negative, got short term {} and long term {}",
                    convex.short_term, convex.long_term
                ),
            });
        }

        Ok(Self {
            underlying: underlying.into(),
            anchor,
            anchor_date,
            vol,
            skew,
            convex,
        })
    }

    /// Starting parameters for an underlying with no saved surface:
    /// flat 20% vol, −0.1 skew, unit convexity, unit strengths.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if `anchor` is not positive.
    pub fn default_for(
        underlying: impl Into<String>,
        anchor: f64,
        anchor_date: NaiveDate,
    ) -> error::Result<Self> {
        Self::new(
            underlying,
            anchor,
            anchor_date,
            AxisParams::new(0.2, 0.2, 1.0),
            AxisParams::new(-0.1, -0.1, 1.0),
            AxisParams::new(1.0, 1.0, 1.0),
        )
    }

    /// Same axes, new anchor spot and date.
    pub fn reanchored(&self, anchor: f64, anchor_date: NaiveDate) -> error::Result<Self> {
        Self::new(
            self.underlying.clone(),
            anchor,
            anchor_date,
            self.vol,
            self.skew,
            self.convex,
        )
    }

    /// Same anchor, new axes.
    pub fn with_axes(
        &self,
        vol: AxisParams,
        skew: AxisParams,
        convex: AxisParams,
    ) -> error::Result<Self> {
        Self::new(
            self.underlying.clone(),
            self.anchor,
            self.anchor_date,
            vol,
            skew,
            convex,
        )
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    pub fn anchor_date(&self) -> NaiveDate {
        self.anchor_date
    }

    pub fn vol(&self) -> AxisParams {
        self.vol
    }

    pub fn skew(&self) -> AxisParams {
        self.skew
    }

    pub fn convex(&self) -> AxisParams {
        self.convex
    }
}
