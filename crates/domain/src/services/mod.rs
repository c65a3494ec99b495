//! Pure domain services. No I/O happens here.

pub mod cache_policy;
pub mod interstitial;
pub mod open_status;
pub mod priority;
pub mod targeting;

pub use cache_policy::{evaluate_cache_validity, MAX_CACHE_AGE_MS, MIN_DISTANCE_FOR_REFRESH_M};
pub use interstitial::{SearchGateState, SEARCHES_BEFORE_INTERSTITIAL};
pub use open_status::{evaluate_open_status, evaluate_open_status_now, OpenStatus, OpenStatusReason};
pub use priority::{
    pool_identity, resolve_active_pool, resolve_slot_state, ActiveSlotResponse, Rotation,
    RotationConfig, SlotState,
};
pub use targeting::{city_matches, matches_geo, select_enterprise, sort_enterprise};
