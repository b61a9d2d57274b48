//! Remote change reconciliation.
//!
//! Two background tasks keep the shared ledger in step with the backend's
//! change feeds. Ledger changes are patched incrementally through the
//! store's no-op guard, so an echo of our own optimistic write lands on the
//! value it already has and mutates nothing. Roster changes are too rare to
//! merit diffing; each one triggers a full reload of the roster-derived
//! rows followed by a log refetch, which also backfills history for members
//! who joined mid-month.
//!
//! A lagged feed is logged and consumed from the live edge; the broadcast
//! channel resumes delivery on its own. A closed feed ends the task.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use streakline_backend::{Backend, Result as BackendResult};
use streakline_ledger::MemberRow;
use streakline_model::{LeagueId, MonthKey};

use crate::SharedLedger;

/// Fetch the roster and resolve display rows, ordered by role rank then
/// case-insensitive display name.
pub(crate) async fn load_rows(
    backend: &dyn Backend,
    league: &LeagueId,
    month: MonthKey,
) -> BackendResult<Vec<MemberRow>> {
    let memberships = backend.fetch_members(league).await?;
    let mut rows = Vec::with_capacity(memberships.len());
    for membership in memberships {
        let profile = backend.fetch_profile(&membership.member_id).await?;
        rows.push(MemberRow::new(
            membership.member_id,
            profile.display_name(),
            membership.role,
            month,
        ));
    }
    rows.sort_by(|a, b| {
        a.role
            .rank()
            .cmp(&b.role.rank())
            .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
            .then_with(|| a.member_id.cmp(&b.member_id))
    });
    Ok(rows)
}

/// Reload the roster rows and re-apply the month's logs under one write
/// lock. Also serves as the initial population of a freshly opened ledger:
/// the no-op guard makes overlap with already-delivered feed events
/// harmless.
pub(crate) async fn refresh_roster(
    backend: &dyn Backend,
    ledger: &SharedLedger,
    league: &LeagueId,
    month: MonthKey,
) -> BackendResult<()> {
    let rows = load_rows(backend, league, month).await?;
    let logs = backend
        .fetch_month_logs(league, month.first_day(), month.last_day())
        .await?;
    let mut guard = ledger.write().await;
    guard.rebuild_roster(rows);
    for log in &logs {
        guard.apply_log(log);
    }
    Ok(())
}

/// Handle to the two feed-consumer tasks. Dropping it stops them.
pub struct Reconciler {
    ledger_task: JoinHandle<()>,
    roster_task: JoinHandle<()>,
}

impl Reconciler {
    /// Subscribe to both feeds and start consuming them.
    ///
    /// Receivers are taken before this returns, so no event emitted after
    /// the call can be missed.
    pub fn spawn(
        backend: Arc<dyn Backend>,
        ledger: SharedLedger,
        league_id: LeagueId,
        month: MonthKey,
    ) -> Self {
        let mut ledger_rx = backend.subscribe_ledger(&league_id);
        let mut roster_rx = backend.subscribe_roster(&league_id);

        let ledger_task = {
            let ledger = ledger.clone();
            let league_id = league_id.clone();
            tokio::spawn(async move {
                loop {
                    match ledger_rx.recv().await {
                        Ok(change) => {
                            if change.league_id != league_id {
                                continue;
                            }
                            let Some(idx) = month.day_index(change.date) else {
                                trace!(date = %change.date, "change outside displayed month");
                                continue;
                            };
                            let applied = ledger
                                .write()
                                .await
                                .set_day(&change.member_id, idx, change.completed);
                            if applied {
                                debug!(member = %change.member_id, date = %change.date, "applied remote change");
                            } else {
                                trace!(member = %change.member_id, date = %change.date, "remote change was a no-op");
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "ledger feed lagged, resuming from live edge");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        let roster_task = tokio::spawn(async move {
            loop {
                match roster_rx.recv().await {
                    Ok(change) => {
                        if change.league_id != league_id {
                            continue;
                        }
                        if let Err(err) =
                            refresh_roster(&*backend, &ledger, &league_id, month).await
                        {
                            warn!(%err, "roster refresh failed, keeping stale roster");
                        }
                    }
                    // One refresh covers every missed event; just recv again.
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "roster feed lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            ledger_task,
            roster_task,
        }
    }

    /// Stop both feed consumers.
    pub fn shutdown(&self) {
        self.ledger_task.abort();
        self.roster_task.abort();
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
