//! Repository implementations for database operations.

pub mod ad_tracking;
pub mod business;
pub mod campaign;

pub use ad_tracking::AdTrackingRepository;
pub use business::BusinessRepository;
pub use campaign::CampaignRepository;
