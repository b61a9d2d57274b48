//! Plan tiers and roster roles.
//!
//! Both are closed enums rather than free-form strings so that an unknown
//! tier or role cannot exist past the deserialization boundary.

use serde::{Deserialize, Serialize};

/// A named capability level gating league creation and joining.
///
/// The wire codes are single letters for the paid tiers ("A", "B", "C")
/// and "free" for the free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "A")]
    Plus,
    #[serde(rename = "B")]
    Circle,
    #[serde(rename = "C")]
    Team,
}

impl PlanTier {
    /// Whether this is a paid tier.
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Parse a wire code ("free", "A", "B", "C").
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "free" => Some(Self::Free),
            "A" => Some(Self::Plus),
            "B" => Some(Self::Circle),
            "C" => Some(Self::Team),
            _ => None,
        }
    }

    /// The wire code for this tier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Plus => "A",
            Self::Circle => "B",
            Self::Team => "C",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "Free"),
            Self::Plus => write!(f, "Plus"),
            Self::Circle => write!(f, "Circle"),
            Self::Team => write!(f, "Team"),
        }
    }
}

/// Role of a member inside a league.
///
/// Exactly one `Owner` exists per league; roles never transition
/// automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    /// Ordering rank used for roster display (owner first, then admins).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Owner => 0,
            Self::Admin => 1,
            Self::Member => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_codes_roundtrip() {
        for tier in [PlanTier::Free, PlanTier::Plus, PlanTier::Circle, PlanTier::Team] {
            assert_eq!(PlanTier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(PlanTier::from_code("D"), None);
    }

    #[test]
    fn tier_serde_uses_codes() {
        let json = serde_json::to_string(&PlanTier::Circle).unwrap();
        assert_eq!(json, "\"B\"");
        let parsed: PlanTier = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(parsed, PlanTier::Free);
    }

    #[test]
    fn role_rank_orders_owner_first() {
        assert!(MemberRole::Owner.rank() < MemberRole::Admin.rank());
        assert!(MemberRole::Admin.rank() < MemberRole::Member.rank());
    }
}
