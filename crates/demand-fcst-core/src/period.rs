//! Calendar-month periods.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ForecastError, Result};

/// A calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NaiveDate);

impl Period {
    /// Create a period from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(|| ForecastError::InvalidDateFormat(format!("{year:04}-{month:02}")))
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Period(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Months since year 0, used as the model's time axis.
    pub fn month_index(&self) -> i64 {
        i64::from(self.year()) * 12 + i64::from(self.month()) - 1
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: Period) -> i64 {
        other.month_index() - self.month_index()
    }

    /// The period `n` months later.
    pub fn plus_months(&self, n: u32) -> Self {
        self.0
            .checked_add_months(Months::new(n))
            .map(Period)
            .unwrap_or(*self)
    }

    /// The `horizon` months that follow the month containing `today`.
    pub fn following(today: NaiveDate, horizon: usize) -> Vec<Period> {
        let current = Period::containing(today);
        (1..=horizon as u32).map(|i| current.plus_months(i)).collect()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    /// Parses `YYYY-MM`, or a full `YYYY-MM-DD` date whose month is taken.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let date = if trimmed.len() == 7 {
            NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        } else {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        };
        date.map(Period::containing)
            .map_err(|_| ForecastError::InvalidDateFormat(s.to_string()))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let p: Period = "2024-03".parse().unwrap();
        assert_eq!(p.year(), 2024);
        assert_eq!(p.month(), 3);
        assert_eq!(p.to_string(), "2024-03");

        let p: Period = "2024-11-01".parse().unwrap();
        assert_eq!(p.to_string(), "2024-11");

        let p: Period = "2024-02-29".parse().unwrap();
        assert_eq!(p.to_string(), "2024-02");

        assert!("2024-13".parse::<Period>().is_err());
        assert!("march".parse::<Period>().is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_input() {
        assert!("2024-03xyz".parse::<Period>().is_err());
        assert!("2024-03-99".parse::<Period>().is_err());
        assert!("2023-02-29".parse::<Period>().is_err());
        assert!("2024-03-01T00:00".parse::<Period>().is_err());
    }

    #[test]
    fn test_following_starts_next_month() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let periods = Period::following(today, 3);
        let labels: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
        assert_eq!(labels, vec!["2026-11", "2026-12", "2027-01"]);

        // The last day of a month still forecasts from the next month.
        let month_end = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        assert_eq!(Period::following(month_end, 1)[0].to_string(), "2026-11");
    }

    #[test]
    fn test_month_arithmetic() {
        let a = Period::new(2023, 11).unwrap();
        let b = Period::new(2024, 2).unwrap();
        assert_eq!(a.months_until(b), 3);
        assert_eq!(b.months_until(a), -3);
        assert_eq!(a.plus_months(14), Period::new(2025, 1).unwrap());
    }

    #[test]
    fn test_serde_round_trip_format() {
        let p = Period::new(2025, 7).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"2025-07\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
