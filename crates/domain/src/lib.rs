//! Domain layer for the Geobooker backend.
//!
//! This crate contains:
//! - Domain models (BusinessRecord, AdCampaign, AdCreative, AdAnalyticsDay)
//! - Pure business logic: opening hours, campaign targeting and priority,
//!   geo-cache freshness, interstitial gating

pub mod models;
pub mod services;
