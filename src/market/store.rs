//! In-memory [`CurveStore`] keeping every saved snapshot per underlying.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::{self, VolMarkError};
use crate::market::{CurveStore, DividendSchedule, RepoSchedule};

type Snapshots<T> = HashMap<String, BTreeMap<NaiveDate, T>>;

/// Thread-safe in-memory curve store.
#[derive(Debug, Default)]
pub struct InMemoryCurveStore {
    dividends: RwLock<Snapshots<DividendSchedule>>,
    repo: RwLock<Snapshots<RepoSchedule>>,
}

impl InMemoryCurveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lookup<T: Clone>(
    lock: &RwLock<Snapshots<T>>,
    underlying: &str,
    as_of: Option<NaiveDate>,
) -> error::Result<Option<T>> {
    let map = lock
        .read()
        .map_err(|_| VolMarkError::oracle("store", "lock poisoned"))?;
    let Some(snapshots) = map.get(underlying) else {
        return Ok(None);
    };
    let found = match as_of {
        Some(date) => snapshots.range(..=date).next_back(),
        None => snapshots.iter().next_back(),
    };
    Ok(found.map(|(_, v)| v.clone()))
}

fn save<T>(
    lock: &RwLock<Snapshots<T>>,
    underlying: &str,
    as_of: NaiveDate,
    value: T,
) -> error::Result<()> {
    let mut map = lock
        .write()
        .map_err(|_| VolMarkError::oracle("store", "lock poisoned"))?;
    map.entry(underlying.to_string())
        .or_default()
        .insert(as_of, value);
    Ok(())
}

impl CurveStore for InMemoryCurveStore {
    fn dividends(
        &self,
        underlying: &str,
        as_of: Option<NaiveDate>,
    ) -> error::Result<Option<DividendSchedule>> {
        lookup(&self.dividends, underlying, as_of)
    }

    fn repo(&self, underlying: &str, as_of: Option<NaiveDate>) -> error::Result<Option<RepoSchedule>> {
        lookup(&self.repo, underlying, as_of)
    }

    fn put_dividends(
        &self,
        underlying: &str,
        as_of: NaiveDate,
        schedule: DividendSchedule,
    ) -> error::Result<()> {
        #[cfg(feature = "logging")]
        tracing::debug!(underlying, %as_of, n_rows = schedule.len(), "dividends saved");
        save(&self.dividends, underlying, as_of, schedule)
    }

    fn put_repo(&self, underlying: &str, as_of: NaiveDate, schedule: RepoSchedule) -> error::Result<()> {
        #[cfg(feature = "logging")]
        tracing::debug!(underlying, %as_of, n_rows = schedule.len(), "repo saved");
        save(&self.repo, underlying, as_of, schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{DividendEntry, DividendKind};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn missing_underlying_is_none() {
        let store = InMemoryCurveStore::new();
        assert!(store.dividends("X", None).unwrap().is_none());
        assert!(store.repo("X", Some(d(2024, 1, 1))).unwrap().is_none());
    }

    #[test]
    fn as_of_picks_latest_snapshot_not_after_date() {
        let store = InMemoryCurveStore::new();
        let old = DividendSchedule::new()
            .with_entry(d(2024, 6, 1), DividendEntry::new(1.0, DividendKind::Normal));
        let new = old.with_entry(d(2024, 9, 1), DividendEntry::new(2.0, DividendKind::Forecast));
        store.put_dividends("X", d(2024, 1, 1), old.clone()).unwrap();
        store.put_dividends("X", d(2024, 2, 1), new.clone()).unwrap();

        assert_eq!(store.dividends("X", None).unwrap(), Some(new.clone()));
        assert_eq!(store.dividends("X", Some(d(2024, 1, 15))).unwrap(), Some(old));
        assert_eq!(store.dividends("X", Some(d(2023, 12, 31))).unwrap(), None);
    }

    #[test]
    fn repo_round_trip() {
        let store = InMemoryCurveStore::new();
        let repo = RepoSchedule::from_rates([(d(2024, 12, 20), 0.01)]).unwrap();
        store.put_repo("X", d(2024, 1, 1), repo.clone()).unwrap();
        assert_eq!(store.repo("X", None).unwrap(), Some(repo));
    }
}
