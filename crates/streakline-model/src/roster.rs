//! Membership and profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LeagueId, MemberId, MemberRole};

/// A (league, member) pairing with a role and join time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub league_id: LeagueId,
    pub member_id: MemberId,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A member's profile, as stored by the backend.
///
/// All name fields are optional; [`Profile::display_name`] resolves what
/// the UI should show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: MemberId,
    /// Preferred short handle.
    pub username: Option<String>,
    /// Optional full name.
    pub name: Option<String>,
    /// Fallback only.
    pub email: Option<String>,
}

impl Profile {
    /// A profile with only an id; every name field unset.
    pub fn bare(id: MemberId) -> Self {
        Self {
            id,
            username: None,
            name: None,
            email: None,
        }
    }
    /// Resolve a display name.
    ///
    /// Preference order: username, full name, email local part, then the
    /// literal `"User"`. Each candidate is trimmed and skipped if empty.
    pub fn display_name(&self) -> String {
        if let Some(name) = nonempty(self.username.as_deref()) {
            return name.to_string();
        }
        if let Some(name) = nonempty(self.name.as_deref()) {
            return name.to_string();
        }
        if let Some(prefix) = self.email.as_deref().and_then(email_prefix) {
            if let Some(name) = nonempty(Some(prefix)) {
                return name.to_string();
            }
        }
        "User".to_string()
    }
}

fn nonempty(s: Option<&str>) -> Option<&str> {
    let trimmed = s?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// The part of an email before '@', or the whole string if no '@' follows
/// a first character.
fn email_prefix(email: &str) -> Option<&str> {
    match email.find('@') {
        Some(at) if at > 0 => Some(&email[..at]),
        Some(_) => None,
        None => Some(email),
    }
}
