//! Market data and the external collaborators the engine calls out to.
//!
//! Pricing, vol evaluation, forwards, business-day counting, repo rates,
//! arbitrage checks and curve storage all live in a remote analytics
//! service. The engine sees them only through the traits below; every call
//! is blocking and may fail, and components decide how to degrade.
//!
//! All traits require `Send + Sync` so that one set of collaborators can
//! serve many independent sessions.

pub mod calendar;
pub mod schedule;
pub mod store;

pub use calendar::HolidayCalendar;
pub use schedule::{
    DividendEntry, DividendKind, DividendSchedule, RepoSchedule, parse_date,
    parse_dividend_table,
};
pub use store::InMemoryCurveStore;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::conventions::year_end;
use crate::error;
use crate::grid::ArbitrageCheck;
use crate::surface::Surface;

/// Business-day counting for one exchange calendar.
pub trait CalendarOracle: Send + Sync {
    /// Net business days from `from` to `to`.
    fn business_days(&self, from: NaiveDate, to: NaiveDate) -> error::Result<i64>;

    /// Business days in the year starting at `date`.
    ///
    /// Default implementation counts from `date` to `date + 365` calendar days.
    fn business_days_in_year(&self, date: NaiveDate) -> error::Result<i64> {
        self.business_days(date, year_end(date))
    }
}

/// Forward price calculation against the collaborator's curve set.
pub trait ForwardOracle: Send + Sync {
    /// Forward price (absolute, not normalized) for `maturity` seen from `value_date`.
    fn forward(&self, spot: f64, maturity: NaiveDate, value_date: NaiveDate) -> error::Result<f64>;
}

/// Vols returned by a [`VolOracle`], per maturity as `(strike, vol)` pairs
/// keyed by the absolute strikes that were requested.
pub type VolQuotes = BTreeMap<NaiveDate, Vec<(f64, f64)>>;

/// Bulk evaluation of a surface into implied vols.
pub trait VolOracle: Send + Sync {
    fn evaluate(
        &self,
        surface: &Surface,
        maturities: &[NaiveDate],
        strikes: &[f64],
    ) -> error::Result<VolQuotes>;
}

/// The system's own carry assumptions, captured once before stripping.
#[derive(Debug, Clone, Copy)]
pub struct SystemCarry<'a> {
    pub underlying: &'a str,
    pub dividends: &'a DividendSchedule,
    pub repo: Option<&'a RepoSchedule>,
}

/// Repo rate consistent with the system's dividend assumption.
pub trait RepoRateOracle: Send + Sync {
    fn repo_rate(&self, maturity: NaiveDate, system: &SystemCarry<'_>) -> error::Result<f64>;
}

/// Butterfly / calendar arbitrage check of a whole surface.
pub trait ArbitrageOracle: Send + Sync {
    fn check(&self, surface: &Surface, value_date: NaiveDate) -> error::Result<ArbitrageCheck>;
}

/// Persistent storage of dividend and repo schedules.
///
/// `as_of = None` means the latest saved schedule.
pub trait CurveStore: Send + Sync {
    fn dividends(
        &self,
        underlying: &str,
        as_of: Option<NaiveDate>,
    ) -> error::Result<Option<DividendSchedule>>;

    fn repo(&self, underlying: &str, as_of: Option<NaiveDate>) -> error::Result<Option<RepoSchedule>>;

    fn put_dividends(
        &self,
        underlying: &str,
        as_of: NaiveDate,
        schedule: DividendSchedule,
    ) -> error::Result<()>;

    fn put_repo(&self, underlying: &str, as_of: NaiveDate, schedule: RepoSchedule) -> error::Result<()>;
}
