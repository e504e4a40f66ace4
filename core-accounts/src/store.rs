//! The account store.

use crate::entitlements::{plan_allows, Feature};
use crate::error::{AccountError, Result};
use crate::models::{SubscriptionPlan, User, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// One-time point bonus granted when upgrading to the top tier.
const PREMIUM_TOP_UPGRADE_BONUS: f64 = 100.0;

/// Serializable snapshot of every account, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub users: Vec<User>,
}

#[derive(Debug, Default)]
struct StoreInner {
    users: HashMap<UserId, User>,
    /// Normalized display names; uniqueness index.
    by_name: HashMap<String, UserId>,
    /// Registration order.
    order: Vec<UserId>,
}

/// Owns every user record. Depends on nothing else.
#[derive(Debug, Default)]
pub struct AccountStore {
    inner: RwLock<StoreInner>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account.
    ///
    /// Fails with [`AccountError::InvalidInput`] on a blank name and with
    /// [`AccountError::Duplicate`] when the name is already taken
    /// (case-insensitively).
    pub async fn register(&self, name: &str, plan: SubscriptionPlan) -> Result<UserId> {
        let user = User::new(name, plan);
        user.validate().map_err(|e| AccountError::InvalidInput {
            field: "User".to_string(),
            message: e,
        })?;

        let mut inner = self.inner.write().await;
        let key = user.name_key();
        if inner.by_name.contains_key(&key) {
            return Err(AccountError::Duplicate {
                name: user.name.clone(),
            });
        }

        let id = user.id;
        debug!(user_id = %id, name = %user.name, plan = %plan, "Registered user");
        inner.by_name.insert(key, id);
        inner.order.push(id);
        inner.users.insert(id, user);
        Ok(id)
    }

    /// Fetch an account. Deactivated accounts are still returned; callers
    /// that care inspect [`User::active`].
    pub async fn get(&self, id: &UserId) -> Result<User> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| AccountError::NotFound { id: id.to_string() })
    }

    /// Look an account up by display name (case-insensitive).
    pub async fn find_by_name(&self, name: &str) -> Option<User> {
        let inner = self.inner.read().await;
        let key = name.trim().to_lowercase();
        inner
            .by_name
            .get(&key)
            .and_then(|id| inner.users.get(id))
            .cloned()
    }

    /// Every account, in registration order.
    pub async fn users(&self) -> Vec<User> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.users.get(id))
            .cloned()
            .collect()
    }

    /// Switch the subscription plan. Idempotent: switching to the current
    /// plan is a no-op. Upgrading to [`SubscriptionPlan::PremiumTop`] grants
    /// a one-time point bonus.
    pub async fn change_plan(&self, id: &UserId, plan: SubscriptionPlan) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound { id: id.to_string() })?;

        if user.plan == plan {
            return Ok(());
        }

        debug!(user_id = %id, from = %user.plan, to = %plan, "Changed subscription plan");
        user.plan = plan;
        if plan == SubscriptionPlan::PremiumTop {
            user.points += PREMIUM_TOP_UPGRADE_BONUS;
        }
        Ok(())
    }

    /// Flip the deactivation flag. The record is kept; only new activity is
    /// rejected elsewhere.
    pub async fn deactivate(&self, id: &UserId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound { id: id.to_string() })?;
        if user.active {
            user.active = false;
            debug!(user_id = %id, "Deactivated user");
        }
        Ok(())
    }

    /// Apply one round of plan-dependent point accrual and return the new
    /// balance.
    pub async fn award_points(&self, id: &UserId) -> Result<f64> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound { id: id.to_string() })?;
        user.points = user.plan.accrue(user.points);
        Ok(user.points)
    }

    /// Pure entitlement predicate over the user's current plan.
    pub async fn is_entitled(&self, id: &UserId, feature: Feature) -> Result<bool> {
        let user = self.get(id).await?;
        Ok(plan_allows(user.plan, feature))
    }

    /// Export every account, registration order preserved.
    pub async fn state(&self) -> AccountState {
        let inner = self.inner.read().await;
        AccountState {
            users: inner
                .order
                .iter()
                .filter_map(|id| inner.users.get(id))
                .cloned()
                .collect(),
        }
    }

    /// Rebuild a store from exported state.
    pub fn from_state(state: AccountState) -> Result<Self> {
        let mut inner = StoreInner::default();
        for user in state.users {
            user.validate().map_err(|e| AccountError::InvalidInput {
                field: "User".to_string(),
                message: e,
            })?;
            let key = user.name_key();
            if inner.by_name.contains_key(&key) || inner.users.contains_key(&user.id) {
                return Err(AccountError::Duplicate {
                    name: user.name.clone(),
                });
            }
            inner.by_name.insert(key, user.id);
            inner.order.push(user.id);
            inner.users.insert(user.id, user);
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }
}
