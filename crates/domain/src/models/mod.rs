//! Domain models for Geobooker.

pub mod analytics;
pub mod business;
pub mod cache;
pub mod campaign;
pub mod context;

pub use analytics::{compute_ctr, AdAnalyticsDay, AdAnalyticsReport};
pub use business::{BusinessRecord, DayHours, NearbyBusiness, OpeningHours};
pub use cache::{CacheLocationMeta, CacheValidity, CacheValidityReason, CachedBusinessEntry};
pub use campaign::{AdCampaign, AdCreative, AdLevel, CampaignStatus};
pub use context::{DeviceType, UserGeoContext};
