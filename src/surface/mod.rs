//! Maturity-indexed SVI-JW surfaces.
//!
//! A [`Surface`] is an ordered map from maturity to [`SmileSlice`] plus the
//! anchor spot and date the slices were computed against. Surfaces are
//! values: expansion, editing and re-anchoring all return a new surface.
//!
//! - [`SurfaceExpander`] turns SVI-S term-structure parameters into a surface.
//! - [`SliceEdit`], [`Surface::with_slice_edit`], [`Surface::without_maturity`]
//!   and [`Surface::reanchor`] edit an SVI-JW surface directly.

pub mod edit;
pub mod expander;

pub use edit::{SliceEdit, add_maturity};
pub use expander::{SurfaceExpander, expand};

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};
use crate::smile::SmileSlice;
use crate::validate::{validate_after, validate_positive};

/// Parametrization family of a surface's slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelTag {
    #[default]
    #[serde(rename = "SVI-JW")]
    SviJw,
    #[serde(rename = "SVI-SPX")]
    SviSpx,
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SviJw => f.write_str("SVI-JW"),
            Self::SviSpx => f.write_str("SVI-SPX"),
        }
    }
}

/// Who last changed a surface, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStamp {
    pub author: String,
    pub at: DateTime<Utc>,
}

impl UpdateStamp {
    pub fn now(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            at: Utc::now(),
        }
    }
}

/// One row of the surface table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceRow {
    pub maturity: NaiveDate,
    pub vol: f64,
    pub skew: f64,
    pub p_wing: f64,
    pub c_wing: f64,
    pub min_vol: f64,
    pub tau: f64,
    pub forward: f64,
}

/// An SVI-JW (or SVI-SPX) volatility surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SurfaceRaw", into = "SurfaceRaw")]
pub struct Surface {
    underlying: String,
    model: ModelTag,
    anchor: f64,
    anchor_date: NaiveDate,
    slices: BTreeMap<NaiveDate, SmileSlice>,
    last_update: Option<UpdateStamp>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurfaceRaw {
    underlying: String,
    model: ModelTag,
    anchor: f64,
    anchor_date: NaiveDate,
    slices: BTreeMap<NaiveDate, SmileSlice>,
    #[serde(default)]
    last_update: Option<UpdateStamp>,
}

impl TryFrom<SurfaceRaw> for Surface {
    type Error = VolMarkError;
    fn try_from(raw: SurfaceRaw) -> Result<Self, Self::Error> {
        let surface = Self::new(
            raw.underlying,
            raw.model,
            raw.anchor,
            raw.anchor_date,
            raw.slices,
        )?;
        Ok(Self {
            last_update: raw.last_update,
            ..surface
        })
    }
}

impl From<Surface> for SurfaceRaw {
    fn from(s: Surface) -> Self {
        Self {
            underlying: s.underlying,
            model: s.model,
            anchor: s.anchor,
            anchor_date: s.anchor_date,
            slices: s.slices,
            last_update: s.last_update,
        }
    }
}

impl Surface {
    /// Assemble a surface from slices.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if the anchor is not positive,
    /// a maturity is on or before the anchor date, or `tau` decreases with
    /// maturity.
    pub fn new(
        underlying: impl Into<String>,
        model: ModelTag,
        anchor: f64,
        anchor_date: NaiveDate,
        slices: impl IntoIterator<Item = (NaiveDate, SmileSlice)>,
    ) -> error::Result<Self> {
        validate_positive(anchor, "anchor")?;
        let slices: BTreeMap<NaiveDate, SmileSlice> = slices.into_iter().collect();
        for maturity in slices.keys() {
            validate_after(*maturity, anchor_date, "maturity")?;
        }
        let taus: Vec<(NaiveDate, f64)> = slices.iter().map(|(m, s)| (*m, s.tau().0)).collect();
        if let Some(w) = taus.windows(2).find(|w| w[1].1 < w[0].1) {
            return Err(VolMarkError::InvalidInput {
                message: format!(
                    "tau must not decrease with maturity: {} has {} but {} has {}",
                    w[0].0, w[0].1, w[1].0, w[1].1
                ),
            });
        }

        Ok(Self {
            underlying: underlying.into(),
            model,
            anchor,
            anchor_date,
            slices,
            last_update: None,
        })
    }

    /// A surface with no slices; grids built from it are zero-filled.
    pub fn empty(
        underlying: impl Into<String>,
        model: ModelTag,
        anchor: f64,
        anchor_date: NaiveDate,
    ) -> error::Result<Self> {
        Self::new(underlying, model, anchor, anchor_date, [])
    }

    /// Same surface with a new update stamp.
    pub fn stamped(mut self, stamp: UpdateStamp) -> Self {
        self.last_update = Some(stamp);
        self
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    pub fn model(&self) -> ModelTag {
        self.model
    }

    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    pub fn anchor_date(&self) -> NaiveDate {
        self.anchor_date
    }

    pub fn last_update(&self) -> Option<&UpdateStamp> {
        self.last_update.as_ref()
    }

    pub fn slice(&self, maturity: NaiveDate) -> Option<&SmileSlice> {
        self.slices.get(&maturity)
    }

    /// Slices in ascending maturity order.
    pub fn slices(&self) -> impl Iterator<Item = (NaiveDate, &SmileSlice)> + '_ {
        self.slices.iter().map(|(m, s)| (*m, s))
    }

    pub fn maturities(&self) -> Vec<NaiveDate> {
        self.slices.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Table rows in ascending maturity order.
    pub fn rows(&self) -> Vec<SliceRow> {
        self.slices
            .iter()
            .map(|(m, s)| SliceRow {
                maturity: *m,
                vol: s.vol(),
                skew: s.skew(),
                p_wing: s.p_wing(),
                c_wing: s.c_wing(),
                min_vol: s.min_vol(),
                tau: s.tau().0,
                forward: s.forward(),
            })
            .collect()
    }

    fn with_slices(&self, slices: BTreeMap<NaiveDate, SmileSlice>) -> error::Result<Self> {
        let surface = Self::new(
            self.underlying.clone(),
            self.model,
            self.anchor,
            self.anchor_date,
            slices,
        )?;
        Ok(Self {
            last_update: self.last_update.clone(),
            ..surface
        })
    }
}
