//! Enterprise-tier geo filtering and ordering.

use std::cmp::Ordering;

use crate::models::{AdCampaign, UserGeoContext};

/// Case-insensitive city match where either name may contain the other.
///
/// Blank names never match, so an empty target can't swallow every city.
pub fn city_matches(target: &str, user_city: &str) -> bool {
    let target = target.trim().to_lowercase();
    let user_city = user_city.trim().to_lowercase();
    if target.is_empty() || user_city.is_empty() {
        return false;
    }
    target.contains(&user_city) || user_city.contains(&target)
}

/// Whether an enterprise campaign should be shown to this viewer.
pub fn matches_geo(campaign: &AdCampaign, ctx: &UserGeoContext) -> bool {
    if campaign.is_demo || campaign.ad_level.is_global() {
        return true;
    }

    let country_hit = ctx.country_code().is_some_and(|country| {
        campaign
            .target_countries
            .iter()
            .any(|target| target.trim().eq_ignore_ascii_case(&country))
    });

    country_hit
        || ctx.city_name().is_some_and(|city| {
            campaign
                .target_cities
                .iter()
                .any(|target| city_matches(target, city))
        })
}

/// Paid before demo, then most specific targeting first.
pub fn enterprise_order(a: &AdCampaign, b: &AdCampaign) -> Ordering {
    a.is_demo
        .cmp(&b.is_demo)
        .then_with(|| a.ad_level.specificity_rank().cmp(&b.ad_level.specificity_rank()))
}

/// Stable sort; equal campaigns keep their query order.
pub fn sort_enterprise(campaigns: &mut [AdCampaign]) {
    campaigns.sort_by(enterprise_order);
}

/// Drops unrenderable and off-target campaigns, then sorts what remains.
pub fn select_enterprise(campaigns: Vec<AdCampaign>, ctx: &UserGeoContext) -> Vec<AdCampaign> {
    let mut selected: Vec<AdCampaign> = campaigns
        .into_iter()
        .filter(|c| c.is_renderable() && matches_geo(c, ctx))
        .collect();
    sort_enterprise(&mut selected);
    selected
}
