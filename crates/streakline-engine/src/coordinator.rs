//! Optimistic daily-log mutation.
//!
//! A toggle flips the local ledger first so the change shows up
//! immediately, then pushes the flipped value to the backend. If the push
//! fails the local flip is reverted, leaving the ledger byte-for-byte as it
//! was. Ineligible toggles (someone else's row, a locked day) return `Ok`
//! without touching anything; the projection layer is expected to have
//! disabled those cells already, so reaching here is a stale click, not an
//! error.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use streakline_backend::Backend;
use streakline_model::{DailyLogEntry, LeagueId, MemberId, MonthWindow};

use crate::error::{Error, Result};
use crate::SharedLedger;

/// Applies toggles to the shared ledger and the backend, in that order.
pub struct MutationCoordinator {
    backend: Arc<dyn Backend>,
    ledger: SharedLedger,
    caller: MemberId,
    league_id: LeagueId,
    window: MonthWindow,
}

impl MutationCoordinator {
    pub fn new(
        backend: Arc<dyn Backend>,
        ledger: SharedLedger,
        caller: MemberId,
        league_id: LeagueId,
        window: MonthWindow,
    ) -> Self {
        Self {
            backend,
            ledger,
            caller,
            league_id,
            window,
        }
    }

    /// Flip one day of one member's row.
    ///
    /// Only the caller's own row inside the editable window (today and
    /// yesterday, within the displayed month) is mutable; anything else is
    /// a silent no-op.
    pub async fn toggle_day(&self, member: &MemberId, day_index: usize) -> Result<()> {
        if member != &self.caller {
            trace!(%member, day_index, "ignoring toggle on someone else's row");
            return Ok(());
        }
        if !self.window.is_editable(day_index) {
            trace!(day_index, "ignoring toggle outside the editable window");
            return Ok(());
        }

        let current = {
            let ledger = self.ledger.read().await;
            match ledger.day(member, day_index) {
                Some(value) => value,
                None => {
                    trace!(%member, "caller has no row yet, ignoring toggle");
                    return Ok(());
                }
            }
        };
        let next = !current;

        // is_editable already proved the index maps to a date.
        let date = match self.window.month().date_at(day_index) {
            Some(date) => date,
            None => return Ok(()),
        };

        self.ledger.write().await.set_day(member, day_index, next);
        debug!(%member, %date, completed = next, "applied optimistic toggle");

        let entry = DailyLogEntry::new(self.league_id.clone(), member.clone(), date, next);
        if let Err(err) = self.backend.upsert_daily_log(entry).await {
            self.ledger.write().await.set_day(member, day_index, current);
            warn!(%member, %date, %err, "toggle rejected, rolled back");
            return Err(Error::WriteRejected(err.to_string()));
        }
        Ok(())
    }
}
