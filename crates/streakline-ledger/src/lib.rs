//! Streakline ledger
//!
//! The in-memory representation of per-member daily completion state for
//! one league and one month, plus the pure projections (streak, ranking,
//! editability) derived from it.
//!
//! # Design
//!
//! The ledger is the single shared mutable resource in the engine. Two
//! writers feed it: the mutation coordinator (optimistic local toggles)
//! and the reconciliation channel (remote change events). Convergence
//! relies on two rules:
//!
//! - **No-op guard**: writing a value a slot already holds does nothing
//!   and does not bump the version counter, so the channel's echo of a
//!   just-applied optimistic write is invisible downstream.
//! - **Last-write-wins**: a remote event is authoritative once it arrives;
//!   slots are overwritten without merge negotiation.

mod project;
mod store;

pub use project::{can_edit, completed_count, order, streak, RankingMode};
pub use store::{Ledger, MemberRow};
