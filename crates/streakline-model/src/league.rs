//! League metadata.

use serde::{Deserialize, Serialize};

use crate::{InviteCode, LeagueId, MonthKey, PlanTier};

/// Lifecycle status of a league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    Active,
    PaymentRequired,
    Completed,
}

/// A group of members tracking one shared activity for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,

    /// Display name.
    pub name: String,

    /// Activity label, e.g. "Gym" (capped at 40 chars at creation).
    pub activity: String,

    /// Tier the owner chose for a paid league; `None` for free leagues.
    pub plan_tier: Option<PlanTier>,

    /// Billing/tracking period.
    pub month_key: MonthKey,

    pub is_free: bool,

    pub status: LeagueStatus,

    /// Unique, immutable once issued.
    pub invite_code: InviteCode,
}

impl League {
    /// The tier a joiner must hold (or accept) to enter.
    ///
    /// Free leagues require nothing; paid leagues require the owner's
    /// configured tier.
    pub fn required_tier(&self) -> PlanTier {
        if self.is_free {
            PlanTier::Free
        } else {
            self.plan_tier.unwrap_or(PlanTier::Free)
        }
    }
}
