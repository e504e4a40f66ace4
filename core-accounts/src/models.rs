//! User and subscription plan models.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Subscription tiers.
///
/// Point accrual per qualifying play: Free adds a flat 5, Premium a flat 10,
/// PremiumTop compounds the balance by 2.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubscriptionPlan {
    /// Ad-supported tier with a playlist quota.
    #[default]
    Free,
    /// Paid tier without a playlist quota.
    Premium,
    /// Top paid tier; unlocks the favourites list and compounding points.
    PremiumTop,
}

impl SubscriptionPlan {
    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "Free",
            SubscriptionPlan::Premium => "Premium",
            SubscriptionPlan::PremiumTop => "Premium Top",
        }
    }

    /// Stable identifier string, used for logging and persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::PremiumTop => "premium_top",
        }
    }

    /// Parse a plan from its identifier string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(SubscriptionPlan::Free),
            "premium" | "premium_base" => Some(SubscriptionPlan::Premium),
            "premium_top" | "premiumtop" => Some(SubscriptionPlan::PremiumTop),
            _ => None,
        }
    }

    /// Apply one round of plan-dependent point accrual to a balance.
    pub fn accrue(&self, points: f64) -> f64 {
        match self {
            SubscriptionPlan::Free => points + 5.0,
            SubscriptionPlan::Premium => points + 10.0,
            SubscriptionPlan::PremiumTop => points * 1.025,
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A user account.
///
/// Users are never deleted; `active` is a deactivation flag. Deactivated
/// users keep their record and history but cannot record new plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Display name, unique case-insensitively across the store.
    pub name: String,
    /// Contact email, when known.
    pub email: Option<String>,
    /// Current subscription plan.
    pub plan: SubscriptionPlan,
    /// Accumulated loyalty points.
    pub points: f64,
    /// Deactivation flag.
    pub active: bool,
    /// When the account was registered (unix seconds).
    pub created_at: i64,
}

impl User {
    /// Create a new account with a fresh id and zero points.
    pub fn new(name: impl Into<String>, plan: SubscriptionPlan) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: None,
            plan,
            points: 0.0,
            active: true,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Validate account data.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("User name cannot be empty".to_string());
        }
        if self.points < 0.0 {
            return Err("User points cannot be negative".to_string());
        }
        Ok(())
    }

    /// Normalized name, the uniqueness key.
    pub fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}
