//! Ledger state management.

use serde::Serialize;
use streakline_model::{DailyLogEntry, LeagueId, MemberId, MemberRole, MonthKey};
use tracing::trace;

/// One member's row: identity, display data, and the month's day grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRow {
    pub member_id: MemberId,
    pub display_name: String,
    pub role: MemberRole,
    /// Completion flags indexed by 0-based day of month.
    pub days: Vec<bool>,
}

impl MemberRow {
    /// Create a row with an all-false grid sized to the month.
    pub fn new(
        member_id: MemberId,
        display_name: impl Into<String>,
        role: MemberRole,
        month: MonthKey,
    ) -> Self {
        Self {
            member_id,
            display_name: display_name.into(),
            role,
            days: vec![false; month.days_in_month()],
        }
    }
}

/// The in-memory aggregate for one league's displayed month.
///
/// Rebuilt wholesale on league load, then incrementally patched by both
/// the mutation coordinator and the reconciliation channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    league_id: LeagueId,
    month: MonthKey,
    rows: Vec<MemberRow>,
    /// Bumped only on real mutations; the no-op guard leaves it untouched.
    version: u64,
}

impl Ledger {
    /// Create a ledger from roster-ordered rows.
    pub fn new(league_id: LeagueId, month: MonthKey, rows: Vec<MemberRow>) -> Self {
        Self {
            league_id,
            month,
            rows,
            version: 0,
        }
    }

    /// Create an empty ledger for a league/month.
    pub fn empty(league_id: LeagueId, month: MonthKey) -> Self {
        Self::new(league_id, month, Vec::new())
    }

    pub fn league_id(&self) -> &LeagueId {
        &self.league_id
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    /// Mutation counter. Every observable change bumps it exactly once.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Roster-ordered rows.
    pub fn rows(&self) -> &[MemberRow] {
        &self.rows
    }

    /// Look up a member's row.
    pub fn row(&self, member: &MemberId) -> Option<&MemberRow> {
        self.rows.iter().find(|r| &r.member_id == member)
    }

    /// Read one slot.
    pub fn day(&self, member: &MemberId, day_index: usize) -> Option<bool> {
        self.row(member)?.days.get(day_index).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write one slot.
    ///
    /// Returns true when the stored value actually changed. Writing the
    /// value a slot already holds is the no-op guard: nothing mutates and
    /// the version does not bump, so an echo of our own optimistic write
    /// cannot trigger downstream recomputation.
    pub fn set_day(&mut self, member: &MemberId, day_index: usize, completed: bool) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| &r.member_id == member) else {
            trace!(member = %member, "set_day on unknown member, dropping");
            return false;
        };
        let Some(slot) = row.days.get_mut(day_index) else {
            trace!(member = %member, day_index, "set_day out of range, dropping");
            return false;
        };
        if *slot == completed {
            return false;
        }
        *slot = completed;
        self.version += 1;
        true
    }

    /// Apply a durable log entry or remote change event.
    ///
    /// Events for other leagues or outside the displayed month are
    /// discarded. Returns true when a slot changed.
    pub fn apply_log(&mut self, entry: &DailyLogEntry) -> bool {
        if entry.league_id != self.league_id {
            return false;
        }
        let Some(day_index) = self.month.day_index(entry.date) else {
            trace!(date = %entry.date, month = %self.month, "log outside displayed month, dropping");
            return false;
        };
        self.set_day(&entry.member_id, day_index, entry.completed)
    }

    /// Replace the roster wholesale, keeping day data for members present
    /// both before and after. Used by roster reconciliation; coarse but
    /// acceptable because roster changes are rare.
    pub fn rebuild_roster(&mut self, new_rows: Vec<MemberRow>) {
        let old = std::mem::take(&mut self.rows);
        self.rows = new_rows
            .into_iter()
            .map(|mut row| {
                if let Some(prev) = old.iter().find(|r| r.member_id == row.member_id) {
                    row.days = prev.days.clone();
                }
                row
            })
            .collect();
        self.version += 1;
    }
}
