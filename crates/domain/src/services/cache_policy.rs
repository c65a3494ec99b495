//! Freshness rules for the local geo-cache.

use shared::geo::Coordinates;

use crate::models::{CacheLocationMeta, CacheValidity, CacheValidityReason};

/// Entries older than this are stale.
pub const MAX_CACHE_AGE_MS: i64 = 30 * 60 * 1000;

/// Moving farther than this from the cached location invalidates the cache.
pub const MIN_DISTANCE_FOR_REFRESH_M: f64 = 500.0;

/// Checks, in order: existence, age, then distance from `current`.
pub fn evaluate_cache_validity(
    meta: Option<&CacheLocationMeta>,
    current: Option<&Coordinates>,
    now_ms: i64,
) -> CacheValidity {
    let Some(meta) = meta else {
        return CacheValidity::invalid(CacheValidityReason::NoCache);
    };

    let age_ms = (now_ms - meta.timestamp).max(0);
    let age_minutes = age_ms / 60_000;
    let with_reason = |is_valid, reason| CacheValidity {
        is_valid,
        reason,
        cached_location: Some(meta.location),
        age_minutes: Some(age_minutes),
    };

    if age_ms > MAX_CACHE_AGE_MS {
        return with_reason(false, CacheValidityReason::Expired);
    }

    if let Some(current) = current {
        let distance = meta.location.distance_to(current);
        // NaN coordinates count as moved.
        if distance.is_nan() || distance > MIN_DISTANCE_FOR_REFRESH_M {
            let meters = if distance.is_finite() {
                distance.round() as u64
            } else {
                u64::MAX
            };
            return with_reason(false, CacheValidityReason::Moved { meters });
        }
    }

    with_reason(true, CacheValidityReason::Valid)
}
