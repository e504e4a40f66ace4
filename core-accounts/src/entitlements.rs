//! The plan-gated policy table.
//!
//! Single source of truth for what each subscription tier may do. Other
//! components ask the [`crate::AccountStore`] (or these functions directly)
//! instead of scattering plan checks.

use crate::models::SubscriptionPlan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plan-gated features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Skipping advertisement breaks.
    SkipAds,
    /// Creating playlists at all (quota applies separately, see
    /// [`max_playlists`]).
    CreatePlaylists,
    /// Free navigation inside a playlist (next/previous instead of shuffle).
    BrowsePlaylists,
    /// Access to the curated favourites list.
    FavouritesList,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::SkipAds => "skip_ads",
            Feature::CreatePlaylists => "create_playlists",
            Feature::BrowsePlaylists => "browse_playlists",
            Feature::FavouritesList => "favourites_list",
        };
        write!(f, "{}", name)
    }
}

/// Whether the plan grants the feature.
pub fn plan_allows(plan: SubscriptionPlan, feature: Feature) -> bool {
    use SubscriptionPlan::*;
    match feature {
        Feature::CreatePlaylists => true,
        Feature::SkipAds | Feature::BrowsePlaylists => matches!(plan, Premium | PremiumTop),
        Feature::FavouritesList => matches!(plan, PremiumTop),
    }
}

/// Playlist quota for the plan; `None` means unbounded.
pub fn max_playlists(plan: SubscriptionPlan) -> Option<usize> {
    match plan {
        SubscriptionPlan::Free => Some(5),
        SubscriptionPlan::Premium | SubscriptionPlan::PremiumTop => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubscriptionPlan::*;

    #[test]
    fn test_skip_ads_is_paid_only() {
        assert!(!plan_allows(Free, Feature::SkipAds));
        assert!(plan_allows(Premium, Feature::SkipAds));
        assert!(plan_allows(PremiumTop, Feature::SkipAds));
    }

    #[test]
    fn test_every_plan_may_create_playlists() {
        for plan in [Free, Premium, PremiumTop] {
            assert!(plan_allows(plan, Feature::CreatePlaylists));
        }
    }

    #[test]
    fn test_favourites_list_is_top_tier_only() {
        assert!(!plan_allows(Free, Feature::FavouritesList));
        assert!(!plan_allows(Premium, Feature::FavouritesList));
        assert!(plan_allows(PremiumTop, Feature::FavouritesList));
    }

    #[test]
    fn test_playlist_quota() {
        assert_eq!(max_playlists(Free), Some(5));
        assert_eq!(max_playlists(Premium), None);
        assert_eq!(max_playlists(PremiumTop), None);
    }
}
