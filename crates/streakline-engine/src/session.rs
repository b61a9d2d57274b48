//! A live view onto one league's month.
//!
//! [`LeagueSession::open`] loads the league, builds the ledger from the
//! roster and the month's logs, and starts the reconciler. From then on the
//! session is the single entry point: toggles go through the mutation
//! coordinator, reads come from projection snapshots, and remote changes
//! arrive through the background feeds. Dropping the session stops the
//! feeds.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::info;

use streakline_backend::Backend;
use streakline_ledger::{self as ledger, Ledger, MemberRow, RankingMode};
use streakline_model::{League, LeagueId, MemberId, MonthWindow};

use crate::coordinator::MutationCoordinator;
use crate::error::Result;
use crate::reconcile::{refresh_roster, Reconciler};
use crate::SharedLedger;

pub struct LeagueSession {
    caller: MemberId,
    league: League,
    window: MonthWindow,
    ledger: SharedLedger,
    coordinator: MutationCoordinator,
    _reconciler: Reconciler,
}

impl LeagueSession {
    /// Load a league for viewing as of `today` and start reconciliation.
    pub async fn open(
        backend: Arc<dyn Backend>,
        caller: MemberId,
        league_id: &LeagueId,
        today: NaiveDate,
    ) -> Result<Self> {
        let league = backend.fetch_league(league_id).await?;
        let month = league.month_key;
        let window = MonthWindow::new(month, today);

        // Subscribe before the initial fetch. A write that commits in
        // between shows up either in the fetch or as a feed event, and the
        // no-op guard absorbs the overlap; fetching first would leave a
        // window where a committed write is neither fetched nor delivered.
        let shared: SharedLedger = Arc::new(RwLock::new(Ledger::empty(league_id.clone(), month)));
        let reconciler =
            Reconciler::spawn(backend.clone(), shared.clone(), league_id.clone(), month);
        refresh_roster(&*backend, &shared, league_id, month).await?;
        let members = shared.read().await.len();
        info!(league = %league_id, members, "session opened");
        let coordinator = MutationCoordinator::new(
            backend,
            shared.clone(),
            caller.clone(),
            league_id.clone(),
            window,
        );

        Ok(Self {
            caller,
            league,
            window,
            ledger: shared,
            coordinator,
            _reconciler: reconciler,
        })
    }

    pub fn league(&self) -> &League {
        &self.league
    }

    pub fn window(&self) -> MonthWindow {
        self.window
    }

    /// Flip one of the caller's own days; everything else is a no-op.
    pub async fn toggle_day(&self, member: &MemberId, day_index: usize) -> Result<()> {
        self.coordinator.toggle_day(member, day_index).await
    }

    /// Snapshot of every row in roster order.
    pub async fn rows(&self) -> Vec<MemberRow> {
        self.ledger.read().await.rows().to_vec()
    }

    /// Snapshot of the rows in the given presentation order.
    pub async fn ordered_rows(&self, mode: RankingMode) -> Vec<MemberRow> {
        let guard = self.ledger.read().await;
        ledger::order(guard.rows(), &self.caller, mode)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Current streak for a member, anchored on today.
    pub async fn streak_of(&self, member: &MemberId) -> usize {
        let Some(today) = self.window.today_index() else {
            return 0;
        };
        let guard = self.ledger.read().await;
        guard
            .row(member)
            .map(|row| ledger::streak(&row.days, today))
            .unwrap_or(0)
    }

    /// Whether the caller may toggle this member's day right now.
    pub fn can_edit(&self, member: &MemberId, day_index: usize) -> bool {
        ledger::can_edit(&self.caller, member, day_index, &self.window)
    }

    /// Mutation counter; unchanged by echoes and other no-ops.
    pub async fn version(&self) -> u64 {
        self.ledger.read().await.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    use streakline_backend::MemoryBackend;
    use streakline_model::{DailyLogEntry, InviteCode, League, LeagueStatus, MonthKey, Profile};

    use crate::admission::{Admission, TierChoice};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("streakline_engine=trace")
            .with_test_writer()
            .try_init();
    }

    async fn eventually<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn named_profile(id: &str, username: &str) -> Profile {
        Profile {
            id: MemberId::new(id),
            username: Some(username.into()),
            name: None,
            email: None,
        }
    }

    async fn open_free_league(
        backend: &Arc<MemoryBackend>,
        owner: &str,
        today: NaiveDate,
    ) -> (LeagueId, LeagueSession) {
        let month = MonthKey::containing(today);
        let admission = Admission::new(backend.clone(), Some(MemberId::new(owner)));
        let id = admission
            .create_league("Morning run", "Run 2km", month, TierChoice::Free)
            .await
            .unwrap();
        let session = LeagueSession::open(
            backend.clone(),
            MemberId::new(owner),
            &id,
            today,
        )
        .await
        .unwrap();
        (id, session)
    }

    #[tokio::test]
    async fn toggle_builds_a_streak() {
        init_tracing();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_profile(named_profile("alice", "alice"));
        let (_, session) = open_free_league(&backend, "alice", today).await;
        let alice = MemberId::new("alice");

        // Nothing completed yet.
        assert_eq!(session.streak_of(&alice).await, 0);

        session.toggle_day(&alice, 8).await.unwrap(); // yesterday
        session.toggle_day(&alice, 9).await.unwrap(); // today
        assert_eq!(session.streak_of(&alice).await, 2);

        // Two days back is locked; the streak is untouched.
        session.toggle_day(&alice, 7).await.unwrap();
        assert_eq!(session.streak_of(&alice).await, 2);

        // Un-complete today: the streak collapses to zero even though
        // yesterday is still done.
        session.toggle_day(&alice, 9).await.unwrap();
        assert_eq!(session.streak_of(&alice).await, 0);
    }

    #[tokio::test]
    async fn write_racing_open_is_not_lost() {
        // Another member's write lands while open() is still fetching.
        // Whether it arrives via the initial fetch or the change feed, the
        // ledger must converge to it.
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let month = MonthKey::containing(today);
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_profile(named_profile("alice", "alice"));
        backend.upsert_profile(named_profile("bob", "bob"));
        backend.insert_league(
            League {
                id: LeagueId::new("league-1"),
                name: "Pages".into(),
                activity: "Read 10 pages".into(),
                plan_tier: None,
                month_key: month,
                is_free: true,
                status: LeagueStatus::Active,
                invite_code: InviteCode::new("AB12CD"),
            },
            &MemberId::new("alice"),
        );
        let bob = MemberId::new("bob");
        backend.join_league(&bob, &LeagueId::new("league-1")).await.unwrap();

        backend.set_latency(Some(Duration::from_millis(20)));
        let opening = tokio::spawn({
            let backend = backend.clone();
            async move {
                LeagueSession::open(backend, MemberId::new("alice"), &LeagueId::new("league-1"), today)
                    .await
                    .unwrap()
            }
        });

        // Commit bob's write mid-open, after the subscription exists.
        tokio::time::sleep(Duration::from_millis(30)).await;
        backend.set_latency(None);
        backend
            .upsert_daily_log(DailyLogEntry::new(
                LeagueId::new("league-1"),
                bob.clone(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                true,
            ))
            .await
            .unwrap();

        let session = opening.await.unwrap();
        assert!(
            eventually(|| async {
                session
                    .rows()
                    .await
                    .iter()
                    .any(|r| r.member_id == bob && r.days[4])
            })
            .await
        );
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_profile(named_profile("alice", "alice"));
        let (id, session) = open_free_league(&backend, "alice", today).await;
        let alice = MemberId::new("alice");

        session.toggle_day(&alice, 9).await.unwrap();
        drop(session);

        let reopened = LeagueSession::open(backend.clone(), alice.clone(), &id, today)
            .await
            .unwrap();
        let rows = reopened.rows().await;
        assert!(rows[0].days[9]);
    }

    #[tokio::test]
    async fn two_sessions_converge() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_profile(named_profile("alice", "alice"));
        backend.upsert_profile(named_profile("bob", "bob"));
        let (id, alice_session) = open_free_league(&backend, "alice", today).await;

        let league = backend.fetch_league(&id).await.unwrap();
        let bob_admission = Admission::new(backend.clone(), Some(MemberId::new("bob")));
        let ticket = bob_admission.admit(league.invite_code.as_str()).await.unwrap();
        assert!(!ticket.needs_acceptance());

        let bob_session = LeagueSession::open(
            backend.clone(),
            MemberId::new("bob"),
            &id,
            today,
        )
        .await
        .unwrap();

        // Alice sees bob arrive, bob's toggle shows up for alice.
        assert!(eventually(|| async { alice_session.rows().await.len() == 2 }).await);
        bob_session.toggle_day(&MemberId::new("bob"), 9).await.unwrap();
        assert!(
            eventually(|| async {
                alice_session
                    .rows()
                    .await
                    .iter()
                    .any(|r| r.member_id == MemberId::new("bob") && r.days[9])
            })
            .await
        );
    }

    #[tokio::test]
    async fn ranked_order_and_self_pin() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let month = MonthKey::containing(today);
        let backend = Arc::new(MemoryBackend::new());
        for (id, name) in [("alice", "alice"), ("bob", "bob"), ("carol", "carol")] {
            backend.upsert_profile(named_profile(id, name));
        }
        backend.insert_league(
            League {
                id: LeagueId::new("league-1"),
                name: "Pages".into(),
                activity: "Read 10 pages".into(),
                plan_tier: None,
                month_key: month,
                is_free: true,
                status: LeagueStatus::Active,
                invite_code: InviteCode::new("AB12CD"),
            },
            &MemberId::new("alice"),
        );
        for member in ["bob", "carol"] {
            backend
                .join_league(&MemberId::new(member), &LeagueId::new("league-1"))
                .await
                .unwrap();
        }
        // Bob 2 completions, carol 1, alice 0.
        for day in [1, 2] {
            backend
                .upsert_daily_log(DailyLogEntry::new(
                    LeagueId::new("league-1"),
                    MemberId::new("bob"),
                    month.date_at(day).unwrap(),
                    true,
                ))
                .await
                .unwrap();
        }
        backend
            .upsert_daily_log(DailyLogEntry::new(
                LeagueId::new("league-1"),
                MemberId::new("carol"),
                month.date_at(1).unwrap(),
                true,
            ))
            .await
            .unwrap();

        let session = LeagueSession::open(
            backend.clone(),
            MemberId::new("carol"),
            &LeagueId::new("league-1"),
            today,
        )
        .await
        .unwrap();

        let ranked: Vec<_> = session
            .ordered_rows(RankingMode::Ranked)
            .await
            .into_iter()
            .map(|r| r.member_id)
            .collect();
        assert_eq!(
            ranked,
            vec![
                MemberId::new("bob"),
                MemberId::new("carol"),
                MemberId::new("alice")
            ]
        );

        let pinned: Vec<_> = session
            .ordered_rows(RankingMode::SelfPinned)
            .await
            .into_iter()
            .map(|r| r.member_id)
            .collect();
        assert_eq!(pinned[0], MemberId::new("carol"));
    }

    #[tokio::test]
    async fn editability_matches_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_profile(named_profile("alice", "alice"));
        let (_, session) = open_free_league(&backend, "alice", today).await;
        let alice = MemberId::new("alice");

        assert!(session.can_edit(&alice, 9));
        assert!(session.can_edit(&alice, 8));
        assert!(!session.can_edit(&alice, 7));
        assert!(!session.can_edit(&alice, 10));
        assert!(!session.can_edit(&MemberId::new("bob"), 9));
    }

    #[tokio::test]
    async fn viewing_a_past_month_locks_every_day() {
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_profile(named_profile("alice", "alice"));
        let month = MonthKey::new(2024, 2).unwrap();
        backend.insert_league(
            League {
                id: LeagueId::new("league-old"),
                name: "February".into(),
                activity: "Stretch".into(),
                plan_tier: None,
                month_key: month,
                is_free: true,
                status: LeagueStatus::Completed,
                invite_code: InviteCode::new("OLDOLD"),
            },
            &MemberId::new("alice"),
        );

        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let session = LeagueSession::open(
            backend.clone(),
            MemberId::new("alice"),
            &LeagueId::new("league-old"),
            today,
        )
        .await
        .unwrap();
        let alice = MemberId::new("alice");

        for day in 0..29 {
            assert!(!session.can_edit(&alice, day));
        }
        let before = session.version().await;
        session.toggle_day(&alice, 0).await.unwrap();
        assert_eq!(session.version().await, before);
    }
}
