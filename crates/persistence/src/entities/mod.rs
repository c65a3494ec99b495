//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod analytics;
pub mod business;
pub mod campaign;

pub use analytics::AdAnalyticsEntity;
pub use business::BusinessEntity;
pub use campaign::{CampaignCreativeRow, RawCampaignRows, TargetedAdRow};
