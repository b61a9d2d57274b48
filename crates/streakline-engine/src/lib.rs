//! Streakline engine
//!
//! Ties the pieces together into a usable client core: invite-code
//! admission and league creation ([`Admission`]), optimistic daily-log
//! toggles with rollback ([`MutationCoordinator`]), background
//! reconciliation of remote changes ([`Reconciler`]), and the
//! per-league facade that owns all of them ([`LeagueSession`]).
//!
//! # Design
//!
//! The shared state is one `Arc<RwLock<Ledger>>` per open league. The
//! coordinator writes to it optimistically before the backend confirms;
//! the reconciler patches it from the backend's change feeds. Convergence
//! relies on two properties of the lower layers: backend upserts are
//! last-writer-wins on (league, member, date), and the ledger's no-op
//! guard makes redundant patches (including echoes of our own writes)
//! invisible to observers of the version counter.

mod admission;
mod coordinator;
mod error;
mod reconcile;
mod session;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use admission::{Admission, AdmissionConfig, AdmissionTicket, TierChoice};
pub use coordinator::MutationCoordinator;
pub use error::{Error, Result};
pub use reconcile::Reconciler;
pub use session::LeagueSession;

pub use streakline_backend::{Backend, BackendError, MemoryBackend};
pub use streakline_ledger::{Ledger, MemberRow, RankingMode};
pub use streakline_model as model;

/// The ledger as shared between the coordinator and the reconciler.
pub type SharedLedger = Arc<RwLock<streakline_ledger::Ledger>>;
