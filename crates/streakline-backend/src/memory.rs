//! In-memory reference backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use streakline_model::{
    DailyLogEntry, InviteCode, League, LeagueId, LeagueStatus, MemberId, MemberRole, Membership,
    PlanTier, Profile,
};

use crate::error::{BackendError, Result};
use crate::events::{LedgerChange, RosterChange};
use crate::{Backend, CreateLeague};

const CHANNEL_CAPACITY: usize = 64;

/// Maximum activity label length, matching the durable schema.
const ACTIVITY_MAX: usize = 40;

#[derive(Debug, Default)]
struct Tables {
    leagues: HashMap<LeagueId, League>,
    codes: HashMap<InviteCode, LeagueId>,
    memberships: HashMap<LeagueId, Vec<Membership>>,
    profiles: HashMap<MemberId, Profile>,
    tiers: HashMap<MemberId, PlanTier>,
    logs: HashMap<(LeagueId, MemberId, NaiveDate), DailyLogEntry>,
    /// Identities that have spent their one free league.
    free_used: Vec<MemberId>,
    next_league: u64,
    /// Failure injection for tests: next matching call fails once.
    fail_next_upsert: Option<String>,
    fail_next_accept: Option<String>,
}

struct Feeds {
    ledger: broadcast::Sender<LedgerChange>,
    roster: broadcast::Sender<RosterChange>,
}

/// An in-memory [`Backend`].
///
/// Every table lives under one mutex, so the free-quota check-and-mark in
/// [`Backend::create_league_and_join`] is atomic: two concurrent free
/// creations serialize on the lock and the second observes the mark.
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    feeds: Mutex<HashMap<LeagueId, Feeds>>,
    /// Artificial latency applied to async calls, for timeout tests.
    latency: Mutex<Option<Duration>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            feeds: Mutex::new(HashMap::new()),
            latency: Mutex::new(None),
        }
    }

    /// Apply an artificial delay to every subsequent async call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().expect("latency lock") = latency;
    }

    /// Make the next `upsert_daily_log` fail with a network error.
    pub fn fail_next_upsert(&self, reason: impl Into<String>) {
        self.tables.lock().expect("tables lock").fail_next_upsert = Some(reason.into());
    }

    /// Make the next `accept_plan_tier` fail with a network error.
    pub fn fail_next_accept(&self, reason: impl Into<String>) {
        self.tables.lock().expect("tables lock").fail_next_accept = Some(reason.into());
    }

    /// Store or replace a profile. Seeding helper for tests and local runs.
    pub fn upsert_profile(&self, profile: Profile) {
        let mut tables = self.tables.lock().expect("tables lock");
        tables.profiles.insert(profile.id.clone(), profile);
    }

    /// Record a member's plan tier directly.
    pub fn set_plan_tier(&self, member: &MemberId, tier: PlanTier) {
        let mut tables = self.tables.lock().expect("tables lock");
        tables.tiers.insert(member.clone(), tier);
    }

    /// Insert a fully-formed league with its owner. Seeding helper: the
    /// normal path is [`Backend::create_league_and_join`].
    pub fn insert_league(&self, league: League, owner: &MemberId) {
        let mut tables = self.tables.lock().expect("tables lock");
        tables
            .codes
            .insert(league.invite_code.clone(), league.id.clone());
        tables.memberships.insert(
            league.id.clone(),
            vec![Membership {
                league_id: league.id.clone(),
                member_id: owner.clone(),
                role: MemberRole::Owner,
                joined_at: Utc::now(),
            }],
        );
        tables.leagues.insert(league.id.clone(), league);
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().expect("latency lock");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn with_feeds<T>(&self, league: &LeagueId, f: impl FnOnce(&Feeds) -> T) -> T {
        let mut feeds = self.feeds.lock().expect("feeds lock");
        let entry = feeds.entry(league.clone()).or_insert_with(|| Feeds {
            ledger: broadcast::channel(CHANNEL_CAPACITY).0,
            roster: broadcast::channel(CHANNEL_CAPACITY).0,
        });
        f(entry)
    }

    fn emit_ledger(&self, change: LedgerChange) {
        let league = change.league_id.clone();
        // Send errors just mean nobody is listening.
        self.with_feeds(&league, |feeds| {
            let _ = feeds.ledger.send(change);
        });
    }

    fn emit_roster(&self, change: RosterChange) {
        let league = change.league_id.clone();
        self.with_feeds(&league, |feeds| {
            let _ = feeds.roster.send(change);
        });
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn resolve_invite_code(&self, code: &InviteCode) -> Result<LeagueId> {
        self.simulate_latency().await;
        let tables = self.tables.lock().expect("tables lock");
        tables
            .codes
            .get(code)
            .cloned()
            .ok_or(BackendError::InvalidCode)
    }

    async fn create_league_and_join(
        &self,
        caller: &MemberId,
        req: CreateLeague,
    ) -> Result<LeagueId> {
        self.simulate_latency().await;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(BackendError::Rejected("league name is required".into()));
        }
        let activity: String = req.activity.trim().chars().take(ACTIVITY_MAX).collect();
        if activity.is_empty() {
            return Err(BackendError::Rejected("activity is required".into()));
        }

        let mut tables = self.tables.lock().expect("tables lock");

        // Check-and-mark under the same lock: the quota cannot be spent
        // twice by racing creations.
        if req.is_free {
            if tables.free_used.contains(caller) {
                return Err(BackendError::FreeQuotaExhausted);
            }
            tables.free_used.push(caller.clone());
        }

        tables.next_league += 1;
        let id = LeagueId::new(format!("league-{}", tables.next_league));

        let mut invite_code = InviteCode::generate();
        while tables.codes.contains_key(&invite_code) {
            invite_code = InviteCode::generate();
        }

        let league = League {
            id: id.clone(),
            name,
            activity,
            plan_tier: if req.is_free { None } else { req.plan_tier },
            month_key: req.month_key,
            is_free: req.is_free,
            status: if req.is_free {
                LeagueStatus::Active
            } else {
                LeagueStatus::PaymentRequired
            },
            invite_code: invite_code.clone(),
        };

        debug!(league = %id, code = %invite_code, is_free = req.is_free, "created league");

        tables.codes.insert(invite_code, id.clone());
        tables.leagues.insert(id.clone(), league);
        tables.memberships.insert(
            id.clone(),
            vec![Membership {
                league_id: id.clone(),
                member_id: caller.clone(),
                role: MemberRole::Owner,
                joined_at: Utc::now(),
            }],
        );

        Ok(id)
    }

    async fn join_league(&self, caller: &MemberId, league: &LeagueId) -> Result<()> {
        self.simulate_latency().await;
        {
            let mut tables = self.tables.lock().expect("tables lock");
            if !tables.leagues.contains_key(league) {
                return Err(BackendError::NotFound(format!("league {league}")));
            }
            let roster = tables.memberships.entry(league.clone()).or_default();
            if roster.iter().any(|m| &m.member_id == caller) {
                return Ok(());
            }
            roster.push(Membership {
                league_id: league.clone(),
                member_id: caller.clone(),
                role: MemberRole::Member,
                joined_at: Utc::now(),
            });
        }
        self.emit_roster(RosterChange {
            league_id: league.clone(),
        });
        Ok(())
    }

    async fn fetch_league(&self, id: &LeagueId) -> Result<League> {
        self.simulate_latency().await;
        let tables = self.tables.lock().expect("tables lock");
        tables
            .leagues
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("league {id}")))
    }

    async fn fetch_members(&self, league: &LeagueId) -> Result<Vec<Membership>> {
        self.simulate_latency().await;
        let tables = self.tables.lock().expect("tables lock");
        let mut members = tables
            .memberships
            .get(league)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("league {league}")))?;
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn fetch_profile(&self, member: &MemberId) -> Result<Profile> {
        self.simulate_latency().await;
        let tables = self.tables.lock().expect("tables lock");
        Ok(tables
            .profiles
            .get(member)
            .cloned()
            .unwrap_or_else(|| Profile::bare(member.clone())))
    }

    async fn fetch_plan_tier(&self, member: &MemberId) -> Result<PlanTier> {
        self.simulate_latency().await;
        let tables = self.tables.lock().expect("tables lock");
        Ok(tables.tiers.get(member).copied().unwrap_or(PlanTier::Free))
    }

    async fn accept_plan_tier(
        &self,
        member: &MemberId,
        league: &LeagueId,
        tier: PlanTier,
    ) -> Result<()> {
        self.simulate_latency().await;
        let mut tables = self.tables.lock().expect("tables lock");
        if let Some(reason) = tables.fail_next_accept.take() {
            return Err(BackendError::Network(reason));
        }
        if !tables.leagues.contains_key(league) {
            return Err(BackendError::NotFound(format!("league {league}")));
        }
        // Re-accepting the same tier is a no-op.
        tables.tiers.insert(member.clone(), tier);
        Ok(())
    }

    async fn fetch_month_logs(
        &self,
        league: &LeagueId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>> {
        self.simulate_latency().await;
        let tables = self.tables.lock().expect("tables lock");
        let mut logs: Vec<DailyLogEntry> = tables
            .logs
            .values()
            .filter(|e| &e.league_id == league && e.date >= from && e.date <= to)
            .cloned()
            .collect();
        logs.sort_by_key(|e| (e.member_id.clone(), e.date));
        Ok(logs)
    }

    async fn upsert_daily_log(&self, entry: DailyLogEntry) -> Result<()> {
        self.simulate_latency().await;
        let winner = {
            let mut tables = self.tables.lock().expect("tables lock");
            if let Some(reason) = tables.fail_next_upsert.take() {
                return Err(BackendError::Network(reason));
            }
            let key = entry.key();
            let winner = match tables.logs.get_mut(&key) {
                Some(existing) => {
                    existing.merge(entry);
                    existing.clone()
                }
                None => {
                    tables.logs.insert(key, entry.clone());
                    entry
                }
            };
            winner
        };
        // Notify with the winning value so arrival order converges.
        self.emit_ledger(LedgerChange {
            league_id: winner.league_id.clone(),
            member_id: winner.member_id.clone(),
            date: winner.date,
            completed: winner.completed,
        });
        Ok(())
    }

    fn subscribe_ledger(&self, league: &LeagueId) -> broadcast::Receiver<LedgerChange> {
        self.with_feeds(league, |feeds| feeds.ledger.subscribe())
    }

    fn subscribe_roster(&self, league: &LeagueId) -> broadcast::Receiver<RosterChange> {
        self.with_feeds(league, |feeds| feeds.roster.subscribe())
    }
}
