//! Local business-day calendar.
//!
//! Weekends plus an explicit holiday list. Counts the business days `d`
//! with `from < d ≤ to`; a reversed interval gives the negated count.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error;
use crate::market::CalendarOracle;

/// Saturday/Sunday weekend calendar with explicit holidays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    name: String,
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(name: impl Into<String>, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            name: name.into(),
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Weekends only.
    pub fn weekends_only(name: impl Into<String>) -> Self {
        Self::new(name, [])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    fn count_forward(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        from.iter_days()
            .skip(1)
            .take_while(|d| *d <= to)
            .filter(|d| self.is_business_day(*d))
            .count() as i64
    }
}

impl CalendarOracle for HolidayCalendar {
    fn business_days(&self, from: NaiveDate, to: NaiveDate) -> error::Result<i64> {
        if to >= from {
            Ok(self.count_forward(from, to))
        } else {
            Ok(-self.count_forward(to, from))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn counts_one_week() {
        let cal = HolidayCalendar::weekends_only("TEST");
        // Mon 2024-01-01 → Mon 2024-01-08: Tue..Fri + Mon
        assert_eq!(cal.business_days(d(2024, 1, 1), d(2024, 1, 8)).unwrap(), 5);
        assert_eq!(cal.business_days(d(2024, 1, 1), d(2024, 1, 1)).unwrap(), 0);
    }

    #[test]
    fn holidays_are_skipped() {
        let cal = HolidayCalendar::new("TEST", [d(2024, 1, 3)]);
        assert_eq!(cal.business_days(d(2024, 1, 1), d(2024, 1, 8)).unwrap(), 4);
        assert!(!cal.is_business_day(d(2024, 1, 3)));
        assert!(!cal.is_business_day(d(2024, 1, 6)));
    }

    #[test]
    fn reversed_interval_is_negative() {
        let cal = HolidayCalendar::weekends_only("TEST");
        assert_eq!(cal.business_days(d(2024, 1, 8), d(2024, 1, 1)).unwrap(), -5);
    }

    #[test]
    fn business_year_is_about_261_days() {
        let cal = HolidayCalendar::weekends_only("TEST");
        let n = cal.business_days_in_year(d(2024, 1, 1)).unwrap();
        assert!((260..=262).contains(&n), "got {n}");
    }
}
