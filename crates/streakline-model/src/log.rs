//! Daily log entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{LeagueId, MemberId};

/// One member's completion record for one calendar day.
///
/// At most one entry exists per (league, member, date); writes are
/// idempotent upserts on that key. Un-completing a day flips `completed`
/// to false rather than deleting the entry, so the key stays stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogEntry {
    pub league_id: LeagueId,
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub completed: bool,
    /// Unix timestamp in milliseconds (for last-write-wins).
    pub written_at: u64,
}

impl DailyLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(league_id: LeagueId, member_id: MemberId, date: NaiveDate, completed: bool) -> Self {
        Self::with_timestamp(league_id, member_id, date, completed, now_millis())
    }

    /// Create an entry with an explicit timestamp.
    pub fn with_timestamp(
        league_id: LeagueId,
        member_id: MemberId,
        date: NaiveDate,
        completed: bool,
        written_at: u64,
    ) -> Self {
        Self {
            league_id,
            member_id,
            date,
            completed,
            written_at,
        }
    }

    /// The upsert key.
    pub fn key(&self) -> (LeagueId, MemberId, NaiveDate) {
        (self.league_id.clone(), self.member_id.clone(), self.date)
    }

    /// Check if this entry is newer than another.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.written_at > other.written_at
    }

    /// Merge with another entry for the same key, keeping the newer one.
    /// Returns true if self was updated.
    pub fn merge(&mut self, other: Self) -> bool {
        if other.is_newer_than(self) {
            *self = other;
            true
        } else {
            false
        }
    }
}

/// Current wall clock in Unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(completed: bool, at: u64) -> DailyLogEntry {
        DailyLogEntry::with_timestamp(
            LeagueId::new("l1"),
            MemberId::new("m1"),
            NaiveDate::from_ymd_opt(2026, 6, 14).unwrap(),
            completed,
            at,
        )
    }

    #[test]
    fn merge_takes_newer() {
        let mut e = entry(true, 100);
        assert!(e.merge(entry(false, 200)));
        assert!(!e.completed);
        assert_eq!(e.written_at, 200);
    }

    #[test]
    fn merge_keeps_newer() {
        let mut e = entry(true, 200);
        assert!(!e.merge(entry(false, 100)));
        assert!(e.completed);
    }

    #[test]
    fn equal_timestamps_keep_existing() {
        // Ties favor the entry already in place; arrival order decides.
        let mut e = entry(true, 100);
        assert!(!e.merge(entry(false, 100)));
        assert!(e.completed);
    }
}
