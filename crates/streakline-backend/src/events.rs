//! Realtime change events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use streakline_model::{LeagueId, MemberId};

/// A change to one slot of a league's daily ledger.
///
/// Carries the changed fact, not a diff: the value is authoritative once
/// it arrives (last-writer-wins on the durable side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerChange {
    pub league_id: LeagueId,
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub completed: bool,
}

/// A change to a league's membership roster.
///
/// Deliberately coarse: any roster event triggers a full roster reload on
/// the consumer side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterChange {
    pub league_id: LeagueId,
}
