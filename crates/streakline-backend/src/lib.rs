//! Streakline backend contract
//!
//! The engine never talks to persistence or transport directly; everything
//! that crosses the process boundary goes through the [`Backend`] trait:
//! invite-code resolution, league creation, roster and log fetches, the
//! idempotent daily-log upsert, and the two realtime change feeds.
//!
//! [`MemoryBackend`] is the reference implementation used by tests and
//! local runs. It keeps every table under one lock, which also gives the
//! free-league quota check its required atomicity.

mod error;
mod events;
mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::broadcast;

use streakline_model::{
    DailyLogEntry, InviteCode, League, LeagueId, MemberId, Membership, MonthKey, PlanTier, Profile,
};

pub use error::{BackendError, Result};
pub use events::{LedgerChange, RosterChange};
pub use memory::MemoryBackend;

/// Parameters for league creation.
#[derive(Debug, Clone)]
pub struct CreateLeague {
    pub name: String,
    pub activity: String,
    pub month_key: MonthKey,
    pub is_free: bool,
    /// Owner's chosen tier for a paid league; ignored when `is_free`.
    pub plan_tier: Option<PlanTier>,
}

/// The collaborator contract consumed by the engine.
///
/// All mutation operations must be idempotent on their natural keys so a
/// retry after a client-side timeout cannot duplicate anything. The two
/// `subscribe_*` methods hand out broadcast receivers; dropping the
/// receiver is the unsubscribe.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Resolve a normalized invite code to a league id.
    async fn resolve_invite_code(&self, code: &InviteCode) -> Result<LeagueId>;

    /// Atomically create a league and add the caller as owner.
    ///
    /// Implementations must enforce the single-free-league quota with an
    /// atomic check-and-mark: two concurrent free creations from one
    /// identity must not both succeed.
    async fn create_league_and_join(&self, caller: &MemberId, req: CreateLeague)
        -> Result<LeagueId>;

    /// Add the caller to a league as a regular member. Idempotent: joining
    /// a league you already belong to is a no-op.
    async fn join_league(&self, caller: &MemberId, league: &LeagueId) -> Result<()>;

    async fn fetch_league(&self, id: &LeagueId) -> Result<League>;

    async fn fetch_members(&self, league: &LeagueId) -> Result<Vec<Membership>>;

    async fn fetch_profile(&self, member: &MemberId) -> Result<Profile>;

    /// The caller's current plan tier (`Free` when nothing is recorded).
    async fn fetch_plan_tier(&self, member: &MemberId) -> Result<PlanTier>;

    /// Durably record that the caller accepted a tier for a league.
    /// Idempotent: re-accepting the same tier is a no-op.
    async fn accept_plan_tier(
        &self,
        member: &MemberId,
        league: &LeagueId,
        tier: PlanTier,
    ) -> Result<()>;

    /// All log entries for a league in the inclusive date range.
    async fn fetch_month_logs(
        &self,
        league: &LeagueId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>>;

    /// Idempotent upsert keyed on (league, member, date); last writer wins
    /// by `written_at`.
    async fn upsert_daily_log(&self, entry: DailyLogEntry) -> Result<()>;

    /// Subscribe to ledger change events for a league.
    fn subscribe_ledger(&self, league: &LeagueId) -> broadcast::Receiver<LedgerChange>;

    /// Subscribe to roster change events for a league.
    fn subscribe_roster(&self, league: &LeagueId) -> broadcast::Receiver<RosterChange>;
}
