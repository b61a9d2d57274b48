//! Month keys and the editable day window.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors around month keys and day arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonthError {
    /// Not a "YYYY-MM" key.
    #[error("invalid month key: {0}")]
    InvalidKey(String),
}

/// A "YYYY-MM" period key identifying a league's tracked month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Create a key, validating the month number.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        if !(1..=12).contains(&month) {
            return Err(MonthError::InvalidKey(format!("{year}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Parse a "YYYY-MM" string.
    pub fn parse(s: &str) -> Result<Self, MonthError> {
        let invalid = || MonthError::InvalidKey(s.to_string());
        let (y, m) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    /// The month key containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Month number is validated at construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("valid month key")
    }

    /// Last calendar day of the month.
    pub fn last_day(&self) -> NaiveDate {
        let (ny, nm) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(ny, nm, 1)
            .expect("valid month key")
            .pred_opt()
            .expect("month has a last day")
    }

    /// Number of days in this month (28-31).
    pub fn days_in_month(&self) -> usize {
        self.last_day().day() as usize
    }

    /// Whether the date falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// 0-based day index for a date in this month, or `None` if outside.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        if self.contains(date) {
            Some(date.day() as usize - 1)
        } else {
            None
        }
    }

    /// The date at a 0-based day index, or `None` if out of range.
    pub fn date_at(&self, day_index: usize) -> Option<NaiveDate> {
        if day_index >= self.days_in_month() {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, day_index as u32 + 1)
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A displayed month anchored at a "today" date.
///
/// Owns the two-day editable window rule: only today and the immediately
/// preceding day may be toggled. One day of lag tolerates "I forgot to log
/// last night"; anything older is locked, anything future is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    month: MonthKey,
    today: NaiveDate,
}

impl MonthWindow {
    /// Create a window for a month as seen from `today`.
    pub fn new(month: MonthKey, today: NaiveDate) -> Self {
        Self { month, today }
    }

    /// Window for the month containing `today`.
    pub fn current(today: NaiveDate) -> Self {
        Self::new(MonthKey::containing(today), today)
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Number of day slots in the displayed month.
    pub fn days_in_month(&self) -> usize {
        self.month.days_in_month()
    }

    /// 0-based index of today within the displayed month, or `None` when
    /// viewing a month today is not part of.
    pub fn today_index(&self) -> Option<usize> {
        self.month.day_index(self.today)
    }

    /// Whether `day_index` may be toggled right now.
    ///
    /// True only for today and yesterday, and only when those days fall in
    /// the displayed month. When today is the 1st, yesterday belongs to the
    /// previous month and only index 0 is editable.
    pub fn is_editable(&self, day_index: usize) -> bool {
        let Some(today_idx) = self.today_index() else {
            return false;
        };
        if day_index >= self.days_in_month() {
            return false;
        }
        day_index == today_idx || day_index + 1 == today_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_and_display_roundtrip() {
        let key = MonthKey::parse("2026-08").unwrap();
        assert_eq!(key.to_string(), "2026-08");
        assert_eq!(key.year(), 2026);
        assert_eq!(key.month(), 8);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(MonthKey::parse("2026").is_err());
        assert!(MonthKey::parse("2026-13").is_err());
        assert!(MonthKey::parse("2026-xx").is_err());
    }

    #[test]
    fn month_lengths() {
        assert_eq!(MonthKey::new(2026, 1).unwrap().days_in_month(), 31);
        assert_eq!(MonthKey::new(2026, 4).unwrap().days_in_month(), 30);
        assert_eq!(MonthKey::new(2026, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthKey::new(2028, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthKey::new(2026, 12).unwrap().days_in_month(), 31);
    }

    #[test]
    fn day_index_maps_one_based_days() {
        let key = MonthKey::new(2026, 6).unwrap();
        assert_eq!(key.day_index(date(2026, 6, 1)), Some(0));
        assert_eq!(key.day_index(date(2026, 6, 14)), Some(13));
        assert_eq!(key.day_index(date(2026, 7, 1)), None);
        assert_eq!(key.date_at(13), Some(date(2026, 6, 14)));
        assert_eq!(key.date_at(30), None);
    }

    #[test]
    fn window_allows_today_and_yesterday_only() {
        let window = MonthWindow::current(date(2026, 6, 14));
        assert_eq!(window.today_index(), Some(13));
        assert!(window.is_editable(13)); // today
        assert!(window.is_editable(12)); // yesterday
        assert!(!window.is_editable(11)); // too old
        assert!(!window.is_editable(14)); // future
    }

    #[test]
    fn window_on_first_of_month_has_one_editable_day() {
        let window = MonthWindow::current(date(2026, 6, 1));
        assert!(window.is_editable(0));
        assert!(!window.is_editable(1));
    }

    #[test]
    fn window_outside_displayed_month_locks_everything() {
        let window = MonthWindow::new(MonthKey::new(2026, 5).unwrap(), date(2026, 6, 14));
        assert_eq!(window.today_index(), None);
        assert!(!window.is_editable(0));
        assert!(!window.is_editable(13));
    }

    #[test]
    fn month_key_serde_is_string() {
        let key = MonthKey::new(2026, 8).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2026-08\"");
        let parsed: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
