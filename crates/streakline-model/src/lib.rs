//! Streakline domain model
//!
//! Core types shared by the ledger, backend, and engine crates: league and
//! member identities, plan tiers, roster roles, month windows, invite codes,
//! and the daily log entry with its last-write-wins merge rule.
//!
//! # Conflict Resolution
//!
//! Daily log entries carry a millisecond write timestamp. When two writes
//! land on the same (league, member, date) key, the entry with the highest
//! timestamp wins.

mod ids;
mod invite;
mod league;
mod log;
mod month;
mod roster;
mod tier;

pub use ids::{LeagueId, MemberId};
pub use invite::InviteCode;
pub use league::{League, LeagueStatus};
pub use log::DailyLogEntry;
pub use month::{MonthError, MonthKey, MonthWindow};
pub use roster::{Membership, Profile};
pub use tier::{MemberRole, PlanTier};
