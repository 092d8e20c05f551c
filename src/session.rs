//! Working session state for one underlying.
//!
//! A [`Session`] is a value: every update takes `&self` and returns a new
//! session (or an error, leaving the caller's session as it was). The caller
//! decides when to publish the returned value. Sessions share nothing
//! mutable; the oracles they call are passed in per operation.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::carry::{self, CarryDecomposition, DividendSwapPoint, ForwardPoint};
use crate::config::EngineConfig;
use crate::error::{self, Degraded, VolMarkError};
use crate::grid::{self, ArbitrageCheck, HighlightSet, VolGrid};
use crate::market::{
    ArbitrageOracle, CalendarOracle, CurveStore, DividendSchedule, ForwardOracle, RepoRateOracle,
    RepoSchedule, SystemCarry, VolOracle, parse_dividend_table,
};
use crate::reference::ReferenceData;
use crate::surface::{self, ModelTag, SliceEdit, Surface, SurfaceExpander};
use crate::term::TermStructureParams;
use crate::validate::validate_positive;

/// A comparison surface and its grid, shown next to the working surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSnapshot {
    pub surface: Surface,
    pub grid: VolGrid,
}

/// Everything the dashboard keeps for one underlying.
#[derive(Debug, Clone)]
pub struct Session {
    config: Arc<EngineConfig>,
    underlying: String,
    value_date: NaiveDate,
    spot: f64,
    term_params: Option<TermStructureParams>,
    surface: Surface,
    maturities: Vec<NaiveDate>,
    dividends: DividendSchedule,
    system_repo: RepoSchedule,
    fitted_repo: Option<RepoSchedule>,
    vol_grid: Option<VolGrid>,
    curve_grid: Option<VolGrid>,
    reference: Option<ReferenceSnapshot>,
    arbitrage: Option<ArbitrageCheck>,
    highlight: Option<HighlightSet>,
}

impl Session {
    /// Start a session with an empty SVI-JW surface anchored on `spot`.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if `spot` is not positive.
    pub fn new(
        config: Arc<EngineConfig>,
        underlying: impl Into<String>,
        value_date: NaiveDate,
        spot: f64,
        maturities: &[NaiveDate],
    ) -> error::Result<Self> {
        validate_positive(spot, "spot")?;
        let underlying = underlying.into();
        let surface = Surface::empty(underlying.clone(), ModelTag::SviJw, spot, value_date)?;
        let maturities = merge_maturities(&[], maturities.iter().copied(), value_date);

        Ok(Self {
            config,
            underlying,
            value_date,
            spot,
            term_params: None,
            surface,
            maturities,
            dividends: DividendSchedule::new(),
            system_repo: RepoSchedule::default(),
            fitted_repo: None,
            vol_grid: None,
            curve_grid: None,
            reference: None,
            arbitrage: None,
            highlight: None,
        })
    }

    /// Same as [`new`](Self::new), with the latest saved dividend and repo
    /// schedules. Missing schedules start empty.
    pub fn from_store(
        config: Arc<EngineConfig>,
        underlying: impl Into<String>,
        value_date: NaiveDate,
        spot: f64,
        maturities: &[NaiveDate],
        store: &dyn CurveStore,
    ) -> error::Result<Self> {
        let session = Self::new(config, underlying, value_date, spot, maturities)?;
        let dividends = store.dividends(&session.underlying, None)?.unwrap_or_default();
        let system_repo = store.repo(&session.underlying, None)?.unwrap_or_default();
        Ok(Self {
            dividends,
            system_repo,
            ..session
        })
    }

    /// Open a session the way the dashboard does on load: saved curves from
    /// `store`, and the underlying's listed maturities within the configured
    /// horizon.
    ///
    /// # Errors
    /// Returns [`VolMarkError::MissingData`] if the underlying or its
    /// listed-maturity rule is unknown.
    pub fn open(
        config: Arc<EngineConfig>,
        reference: &ReferenceData,
        underlying: impl Into<String>,
        value_date: NaiveDate,
        spot: f64,
        store: &dyn CurveStore,
    ) -> error::Result<Self> {
        Self::from_store(config, underlying, value_date, spot, &[], store)?
            .with_listed_maturities(reference)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    pub fn value_date(&self) -> NaiveDate {
        self.value_date
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn term_params(&self) -> Option<&TermStructureParams> {
        self.term_params.as_ref()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn maturities(&self) -> &[NaiveDate] {
        &self.maturities
    }

    pub fn dividends(&self) -> &DividendSchedule {
        &self.dividends
    }

    pub fn system_repo(&self) -> &RepoSchedule {
        &self.system_repo
    }

    pub fn fitted_repo(&self) -> Option<&RepoSchedule> {
        self.fitted_repo.as_ref()
    }

    pub fn vol_grid(&self) -> Option<&VolGrid> {
        self.vol_grid.as_ref()
    }

    /// Smile curves on the fine moneyness axis, rebuilt with the vol grid.
    pub fn curve_grid(&self) -> Option<&VolGrid> {
        self.curve_grid.as_ref()
    }

    pub fn reference(&self) -> Option<&ReferenceSnapshot> {
        self.reference.as_ref()
    }

    pub fn arbitrage(&self) -> Option<&ArbitrageCheck> {
        self.arbitrage.as_ref()
    }

    pub fn highlight(&self) -> Option<&HighlightSet> {
        self.highlight.as_ref()
    }

    // -- surface ---------------------------------------------------------

    /// Replace the surface with the expansion of `params` at the session's
    /// maturities. Derived grid and arbitrage results are cleared.
    pub fn with_term_params(
        &self,
        params: TermStructureParams,
        calendar: &dyn CalendarOracle,
        forward: &dyn ForwardOracle,
    ) -> error::Result<Self> {
        if params.underlying() != self.underlying {
            return Err(VolMarkError::InvalidInput {
                message: format!(
                    "parameters for {} do not belong to {}",
                    params.underlying(),
                    self.underlying
                ),
            });
        }
        let surface = SurfaceExpander::new(calendar, forward)
            .floors(self.config.floors)
            .expand(&params, &self.maturities)?;
        Ok(Self {
            term_params: Some(params),
            ..self.with_new_surface(surface)
        })
    }

    /// Replace the surface with a directly supplied SVI-JW/SPX surface.
    pub fn with_surface(&self, surface: Surface) -> error::Result<Self> {
        if surface.underlying() != self.underlying {
            return Err(VolMarkError::InvalidInput {
                message: format!(
                    "surface for {} does not belong to {}",
                    surface.underlying(),
                    self.underlying
                ),
            });
        }
        let maturities = merge_maturities(&self.maturities, surface.maturities(), self.value_date);
        Ok(Self {
            maturities,
            term_params: None,
            ..self.with_new_surface(surface)
        })
    }

    /// Add the underlying's listed maturities up to
    /// [`EngineConfig::listed_maturity_months`] after the value date.
    ///
    /// # Errors
    /// Returns [`VolMarkError::MissingData`] if the underlying or its
    /// listed-maturity rule is unknown.
    pub fn with_listed_maturities(&self, reference: &ReferenceData) -> error::Result<Self> {
        let listed = reference.listed_maturities(
            &self.underlying,
            self.value_date,
            self.config.listed_maturity_months,
        )?;
        #[cfg(feature = "logging")]
        tracing::debug!(underlying = %self.underlying, n_listed = listed.len(), "listed maturities merged");
        Ok(Self {
            maturities: merge_maturities(&self.maturities, listed, self.value_date),
            ..self.clone()
        })
    }

    /// Move the spot without re-anchoring the surface.
    ///
    /// The vol and curve grids are rebuilt at the new spot, a same-underlying
    /// reference grid is re-evaluated, and arbitrage results are cleared.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] if `spot` is not positive.
    pub fn with_spot(&self, spot: f64, oracle: &dyn VolOracle) -> error::Result<Degraded<Self>> {
        validate_positive(spot, "spot")?;
        let moved = Self {
            spot,
            arbitrage: None,
            highlight: None,
            ..self.clone()
        };
        let refreshed = moved.refresh_grid(oracle)?;
        let Some(snapshot) = refreshed.value.reference.clone() else {
            return Ok(refreshed);
        };
        let rebuilt = refreshed.value.with_reference(snapshot.surface, oracle)?;
        Ok(Degraded {
            value: rebuilt.value,
            failure: refreshed.failure.or(rebuilt.failure),
        })
    }

    /// Re-anchor the surface on the session's spot and value date.
    ///
    /// SVI-S sessions re-expand the re-anchored parameters; SVI-JW sessions
    /// move each slice with [`Surface::reanchor`].
    pub fn reanchor(
        &self,
        calendar: &dyn CalendarOracle,
        forward: &dyn ForwardOracle,
    ) -> error::Result<Self> {
        match &self.term_params {
            Some(params) => {
                let params = params.reanchored(self.spot, self.value_date)?;
                self.with_term_params(params, calendar, forward)
            }
            None => {
                let surface = self
                    .surface
                    .reanchor(self.spot, self.value_date, calendar, forward)?;
                Ok(self.with_new_surface(surface))
            }
        }
    }

    /// Add a maturity; an SVI-S surface is re-expanded to include it.
    pub fn add_maturity(
        &self,
        date: NaiveDate,
        calendar: &dyn CalendarOracle,
        forward: &dyn ForwardOracle,
    ) -> error::Result<Self> {
        let maturities = surface::add_maturity(&self.maturities, date, self.value_date)?;
        let next = Self {
            maturities,
            ..self.clone()
        };
        match &self.term_params {
            Some(params) => next.with_term_params(params.clone(), calendar, forward),
            None => Ok(next),
        }
    }

    /// Remove a maturity and its slice (if any).
    pub fn remove_maturity(&self, date: NaiveDate) -> error::Result<Self> {
        if !self.maturities.contains(&date) {
            return Err(VolMarkError::MissingData {
                message: format!("maturity {date} is not listed"),
            });
        }
        let surface = match self.surface.slice(date) {
            Some(_) => self.surface.without_maturity(date)?,
            None => self.surface.clone(),
        };
        let next = self.with_new_surface(surface);
        Ok(Self {
            maturities: self.maturities.iter().copied().filter(|m| *m != date).collect(),
            term_params: self.term_params.clone(),
            ..next
        })
    }

    /// Edit one slice directly. The session leaves SVI-S mode.
    pub fn edit_slice(
        &self,
        maturity: NaiveDate,
        edit: SliceEdit,
        calendar: &dyn CalendarOracle,
        forward: &dyn ForwardOracle,
    ) -> error::Result<Self> {
        let surface = self
            .surface
            .with_slice_edit(maturity, edit, calendar, forward)?;
        let mut maturities = self.maturities.clone();
        if !maturities.contains(&maturity) {
            maturities.push(maturity);
            maturities.sort_unstable();
        }
        Ok(Self {
            maturities,
            term_params: None,
            ..self.with_new_surface(surface)
        })
    }

    fn with_new_surface(&self, surface: Surface) -> Self {
        Self {
            surface,
            vol_grid: None,
            curve_grid: None,
            arbitrage: None,
            highlight: None,
            ..self.clone()
        }
    }

    // -- grids -------------------------------------------------------------

    /// Re-evaluate the display vol grid and the smile curves.
    ///
    /// The reported failure is the vol grid's, else the curve grid's.
    pub fn refresh_grid(&self, oracle: &dyn VolOracle) -> error::Result<Degraded<Self>> {
        let grid = grid::build_grid(
            &self.surface,
            self.spot,
            &self.maturities,
            &self.config.vol_grid_moneyness,
            oracle,
        )?;
        let curves = grid::build_grid(
            &self.surface,
            self.spot,
            &self.maturities,
            &self.config.curve_grid_moneyness,
            oracle,
        )?;
        let next = Self {
            vol_grid: Some(grid.value),
            curve_grid: Some(curves.value),
            ..self.clone()
        };
        Ok(Degraded {
            value: next,
            failure: grid.failure.or(curves.failure),
        })
    }

    /// Run the arbitrage checker and compute the highlight set.
    ///
    /// On checker failure the previous results are cleared and the failure
    /// is reported; nothing is flagged.
    pub fn check_arbitrage(&self, oracle: &dyn ArbitrageOracle) -> Degraded<Self> {
        match oracle.check(&self.surface, self.value_date) {
            Ok(check) => {
                let flagged = grid::highlight(
                    &self.surface,
                    self.surface.anchor(),
                    self.spot,
                    &self.maturities,
                    &self.config.vol_grid_moneyness,
                    &check.check_grid,
                );
                #[cfg(feature = "logging")]
                tracing::debug!(summary = %check.summary(), "arbitrage checked");
                Degraded::clean(Self {
                    arbitrage: Some(check),
                    highlight: Some(flagged),
                    ..self.clone()
                })
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!(error = %e, "arbitrage check unavailable");
                Degraded::fallback(
                    Self {
                        arbitrage: None,
                        highlight: None,
                        ..self.clone()
                    },
                    e,
                )
            }
        }
    }

    /// Load a comparison surface and evaluate it on the session's grid.
    ///
    /// A surface of another underlying is evaluated around its own anchor.
    pub fn with_reference(
        &self,
        surface: Surface,
        oracle: &dyn VolOracle,
    ) -> error::Result<Degraded<Self>> {
        let spot = if surface.underlying() == self.underlying {
            self.spot
        } else {
            surface.anchor()
        };
        let grid = grid::build_grid(
            &surface,
            spot,
            &self.maturities,
            &self.config.vol_grid_moneyness,
            oracle,
        )?;
        Ok(Degraded {
            value: Self {
                reference: Some(ReferenceSnapshot {
                    surface,
                    grid: grid.value,
                }),
                ..self.clone()
            },
            failure: grid.failure,
        })
    }

    // -- carry -------------------------------------------------------------

    pub fn with_dividends(&self, dividends: DividendSchedule) -> Self {
        Self {
            dividends,
            ..self.clone()
        }
    }

    /// Replace the dividends with a pasted table; a bad row rejects it all.
    pub fn with_dividend_table(&self, text: &str) -> error::Result<Self> {
        Ok(self.with_dividends(parse_dividend_table(text)?))
    }

    pub fn with_system_repo(&self, repo: RepoSchedule) -> Self {
        Self {
            system_repo: repo,
            ..self.clone()
        }
    }

    pub fn with_fitted_repo(&self, repo: RepoSchedule) -> Self {
        Self {
            fitted_repo: Some(repo),
            ..self.clone()
        }
    }

    /// Adopt the fitted repo curve as the system curve.
    ///
    /// # Errors
    /// Returns [`VolMarkError::MissingData`] if no curve has been fitted.
    pub fn remark_repo(&self) -> error::Result<Self> {
        let fitted = self
            .fitted_repo
            .clone()
            .ok_or_else(|| VolMarkError::MissingData {
                message: format!("no fitted repo curve for {}", self.underlying),
            })?;
        Ok(self.with_system_repo(fitted))
    }

    /// Save dividends and system repo as of the value date.
    pub fn save_curves(&self, store: &dyn CurveStore) -> error::Result<()> {
        store.put_dividends(&self.underlying, self.value_date, self.dividends.clone())?;
        store.put_repo(&self.underlying, self.value_date, self.system_repo.clone())
    }

    /// Implied dividends from the fitted repo curve.
    ///
    /// # Errors
    /// Returns [`VolMarkError::MissingData`] if no curve has been fitted.
    pub fn strip_carry(
        &self,
        calendar: &dyn CalendarOracle,
        repo_oracle: &dyn RepoRateOracle,
    ) -> error::Result<CarryDecomposition> {
        let fitted = self
            .fitted_repo
            .as_ref()
            .ok_or_else(|| VolMarkError::MissingData {
                message: format!("no fitted repo curve for {}", self.underlying),
            })?;
        let year_days = surface::expander::business_year(calendar, self.value_date)?;
        let system = SystemCarry {
            underlying: &self.underlying,
            dividends: &self.dividends,
            repo: Some(&self.system_repo),
        };
        carry::strip(
            self.value_date,
            fitted,
            &system,
            self.spot,
            year_days,
            calendar,
            repo_oracle,
        )
    }

    /// Annual dividend-swap points from the value date's year.
    pub fn dividend_swaps(&self) -> error::Result<Vec<DividendSwapPoint>> {
        carry::aggregate(&self.dividends, self.value_date.year(), self.spot)
    }

    /// Forwards at the session's maturities.
    pub fn forward_curve(
        &self,
        oracle: &dyn ForwardOracle,
    ) -> error::Result<Degraded<Vec<ForwardPoint>>> {
        carry::forward_curve(self.spot, &self.maturities, oracle, self.value_date)
    }
}

/// Sorted union of `current` and `extra`, keeping dates after `value_date`.
fn merge_maturities(
    current: &[NaiveDate],
    extra: impl IntoIterator<Item = NaiveDate>,
    value_date: NaiveDate,
) -> Vec<NaiveDate> {
    let mut merged: Vec<NaiveDate> = current
        .iter()
        .copied()
        .chain(extra)
        .filter(|m| *m > value_date)
        .collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}
