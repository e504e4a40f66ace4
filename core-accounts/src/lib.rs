//! User accounts and subscription plans.
//!
//! Owns user records and the plan-gated policy table. Plan checks live in
//! one place ([`entitlements`]) so the other components never hardcode what
//! a Free or Premium account may do.

pub mod entitlements;
pub mod error;
pub mod models;
pub mod store;

pub use entitlements::{max_playlists, plan_allows, Feature};
pub use error::{AccountError, Result};
pub use models::{SubscriptionPlan, User, UserId};
pub use store::{AccountState, AccountStore};
