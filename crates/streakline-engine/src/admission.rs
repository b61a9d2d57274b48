//! Invite-code admission and league creation.
//!
//! Joining happens in two phases. [`Admission::admit`] resolves the code,
//! records the membership, and returns an [`AdmissionTicket`]; the ticket
//! then tells the caller whether the league's plan tier still has to be
//! accepted before the league is usable. Splitting it this way keeps the
//! paywall decision out of the network path: the membership already exists
//! when the ticket reports `needs_acceptance`, so a caller who bails at the
//! paywall can come back later without re-entering the code.
//!
//! Every remote phase is bounded by the configured timeout. A phase that
//! times out surfaces [`Error::Timeout`] and leaves no local state behind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use streakline_backend::{Backend, CreateLeague};
use streakline_model::{InviteCode, League, LeagueId, MemberId, MonthKey, PlanTier};

use crate::error::{Error, Result};

/// Tier selection for league creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChoice {
    /// A free league, counted against the caller's one-free-league quota.
    Free,
    /// A paid league gated on the given tier.
    Paid(PlanTier),
}

/// Admission tunables.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Upper bound on each remote phase. `None` disables the bound.
    pub timeout: Option<Duration>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(15)),
        }
    }
}

impl AdmissionConfig {
    /// Set the per-phase timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the per-phase timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Gatekeeper for joining and creating leagues.
pub struct Admission {
    backend: Arc<dyn Backend>,
    caller: Option<MemberId>,
    config: AdmissionConfig,
}

impl Admission {
    pub fn new(backend: Arc<dyn Backend>, caller: Option<MemberId>) -> Self {
        Self::with_config(backend, caller, AdmissionConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn Backend>,
        caller: Option<MemberId>,
        config: AdmissionConfig,
    ) -> Self {
        Self {
            backend,
            caller,
            config,
        }
    }

    fn caller(&self) -> Result<&MemberId> {
        self.caller.as_ref().ok_or(Error::NotAuthenticated)
    }

    async fn bounded<T, F>(&self, phase: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, phase)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => phase.await,
        }
    }

    /// Join the league behind an invite code.
    ///
    /// The raw code is normalized (trimmed, uppercased) before lookup, so
    /// `" ab12cd "` and `"AB12CD"` admit to the same league. An empty code
    /// is rejected locally without a round trip.
    pub async fn admit(&self, raw_code: &str) -> Result<AdmissionTicket> {
        let caller = self.caller()?.clone();
        let code = InviteCode::new(raw_code);
        if code.is_empty() {
            return Err(Error::InvalidCode);
        }

        let (league, caller_tier) = self
            .bounded(async {
                let league_id = self.backend.resolve_invite_code(&code).await?;
                self.backend.join_league(&caller, &league_id).await?;
                let league = self.backend.fetch_league(&league_id).await?;
                let tier = self.backend.fetch_plan_tier(&caller).await?;
                Ok((league, tier))
            })
            .await?;

        info!(
            league = %league.id,
            member = %caller,
            code = %code,
            "admitted via invite code"
        );

        Ok(AdmissionTicket {
            backend: self.backend.clone(),
            caller,
            league,
            caller_tier,
        })
    }

    /// Create a league with the caller as owner and return its id.
    ///
    /// `TierChoice::Free` spends the caller's single free-league allowance;
    /// a second free creation fails with [`Error::FreeQuotaExhausted`].
    /// `TierChoice::Paid` requires the caller's recorded plan tier to
    /// already match, otherwise [`Error::PaymentRequired`] points at the
    /// tier that still has to be bought.
    pub async fn create_league(
        &self,
        name: impl Into<String>,
        activity: impl Into<String>,
        month_key: MonthKey,
        choice: TierChoice,
    ) -> Result<LeagueId> {
        let caller = self.caller()?.clone();

        let req = match choice {
            TierChoice::Free => CreateLeague {
                name: name.into(),
                activity: activity.into(),
                month_key,
                is_free: true,
                plan_tier: None,
            },
            TierChoice::Paid(tier) => {
                if !tier.is_paid() {
                    return Err(Error::InvalidInput(
                        "paid league requires a paid tier".into(),
                    ));
                }
                let current = self
                    .bounded(async {
                        self.backend
                            .fetch_plan_tier(&caller)
                            .await
                            .map_err(Error::from)
                    })
                    .await?;
                if current != tier {
                    debug!(member = %caller, %current, required = %tier, "tier not yet held");
                    return Err(Error::PaymentRequired { required: tier });
                }
                CreateLeague {
                    name: name.into(),
                    activity: activity.into(),
                    month_key,
                    is_free: false,
                    plan_tier: Some(tier),
                }
            }
        };

        let league_id = self
            .bounded(async {
                self.backend
                    .create_league_and_join(&caller, req)
                    .await
                    .map_err(Error::from)
            })
            .await?;

        info!(league = %league_id, owner = %caller, "created league");
        Ok(league_id)
    }
}

/// Result of a successful admission: membership exists, tier gate may not
/// have been cleared yet.
pub struct AdmissionTicket {
    backend: Arc<dyn Backend>,
    caller: MemberId,
    league: League,
    caller_tier: PlanTier,
}

impl AdmissionTicket {
    pub fn league(&self) -> &League {
        &self.league
    }

    /// Tier the league demands of its members.
    pub fn required_tier(&self) -> PlanTier {
        self.league.required_tier()
    }

    /// True when the league is paid and the caller has not yet accepted
    /// the required tier.
    pub fn needs_acceptance(&self) -> bool {
        let required = self.required_tier();
        required.is_paid() && self.caller_tier != required
    }

    /// Record acceptance of the league's required tier.
    pub async fn accept_tier(&mut self) -> Result<()> {
        let required = self.required_tier();
        if !self.needs_acceptance() {
            return Ok(());
        }
        self.backend
            .accept_plan_tier(&self.caller, &self.league.id, required)
            .await
            .map_err(|err| Error::AcceptanceFailed(err.to_string()))?;
        self.caller_tier = required;
        info!(league = %self.league.id, member = %self.caller, tier = %required, "tier accepted");
        Ok(())
    }

    /// Clear the tier gate or name the tier still owed.
    pub fn try_continue(&self) -> Result<LeagueId> {
        if self.needs_acceptance() {
            return Err(Error::PaymentRequired {
                required: self.required_tier(),
            });
        }
        Ok(self.league.id.clone())
    }
}
