//! Process-wide reference data.
//!
//! The underlying database and the listed-maturity rules are loaded once at
//! start-up into a read-only [`ReferenceData`] and shared through a
//! [`ReferenceStore`]. A refresh swaps in a new snapshot; readers holding the
//! previous `Arc` keep a consistent view until they ask again.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};

/// Static description of one underlying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderlyingInfo {
    pub ric: Option<String>,
    pub bbg: Option<String>,
    pub symbol: Option<String>,
    /// Instrument type, e.g. `"Index"` or `"Stock"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub exchange: Option<String>,
    /// Holiday calendar code.
    pub calendar: String,
    pub currency: String,
    pub dividend_currency: Option<String>,
    /// Exercise style of listed options; `None` when nothing is listed.
    pub listed_exercise: Option<String>,
}

impl UnderlyingInfo {
    /// Key into the listed-maturity table: `"{calendar}_{type}"`.
    pub fn expiry_calendar(&self) -> String {
        format!("{}_{}", self.calendar, self.kind)
    }
}

/// Underlying database plus listed expiries per expiry calendar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub underlyings: BTreeMap<String, UnderlyingInfo>,
    pub listed_maturities: BTreeMap<String, Vec<NaiveDate>>,
}

impl ReferenceData {
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] for malformed JSON.
    pub fn from_json_str(json: &str) -> error::Result<Self> {
        let mut data: Self = serde_json::from_str(json).map_err(|e| VolMarkError::InvalidInput {
            message: format!("reference data: {e}"),
        })?;
        for dates in data.listed_maturities.values_mut() {
            dates.sort_unstable();
            dates.dedup();
        }
        Ok(data)
    }

    pub fn from_path(path: impl AsRef<Path>) -> error::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| VolMarkError::InvalidInput {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&text)
    }

    /// # Errors
    /// Returns [`VolMarkError::MissingData`] for an unknown underlying.
    pub fn underlying(&self, code: &str) -> error::Result<&UnderlyingInfo> {
        self.underlyings
            .get(code)
            .ok_or_else(|| VolMarkError::MissingData {
                message: format!("unknown underlying {code}"),
            })
    }

    /// Listed maturities of `code` after `value_date` and within
    /// `horizon_months`.
    ///
    /// # Errors
    /// Returns [`VolMarkError::MissingData`] if the underlying or its
    /// listed-maturity rule is unknown.
    pub fn listed_maturities(
        &self,
        code: &str,
        value_date: NaiveDate,
        horizon_months: u32,
    ) -> error::Result<Vec<NaiveDate>> {
        let key = self.underlying(code)?.expiry_calendar();
        let dates = self
            .listed_maturities
            .get(&key)
            .ok_or_else(|| VolMarkError::MissingData {
                message: format!("no listed maturity rule {key}"),
            })?;
        let horizon = value_date
            .checked_add_months(Months::new(horizon_months))
            .unwrap_or(NaiveDate::MAX);
        Ok(dates
            .iter()
            .copied()
            .filter(|d| *d > value_date && *d <= horizon)
            .collect())
    }
}

/// Shared, refreshable handle on the current [`ReferenceData`].
#[derive(Debug)]
pub struct ReferenceStore {
    current: RwLock<Arc<ReferenceData>>,
}

impl ReferenceStore {
    pub fn load(data: ReferenceData) -> Self {
        #[cfg(feature = "logging")]
        tracing::debug!(n_underlyings = data.underlyings.len(), "reference data loaded");
        Self {
            current: RwLock::new(Arc::new(data)),
        }
    }

    /// Snapshot of the current data.
    pub fn current(&self) -> error::Result<Arc<ReferenceData>> {
        self.current
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| VolMarkError::oracle("reference", "lock poisoned"))
    }

    /// Replace the data for subsequent readers.
    pub fn refresh(&self, data: ReferenceData) -> error::Result<()> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| VolMarkError::oracle("reference", "lock poisoned"))?;
        #[cfg(feature = "logging")]
        tracing::debug!(n_underlyings = data.underlyings.len(), "reference data refreshed");
        *guard = Arc::new(data);
        Ok(())
    }
}
