//! Local geo-cache records.

use serde::{Deserialize, Serialize};
use shared::geo::Coordinates;

use super::business::BusinessRecord;

/// Key of the singleton location metadata record.
pub const LAST_CACHE_KEY: &str = "last_cache";

/// A business record plus the time it entered the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedBusinessEntry {
    #[serde(flatten)]
    pub record: BusinessRecord,
    /// Milliseconds since epoch.
    pub cached_at: i64,
}

/// Where and when the cache was last populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheLocationMeta {
    pub key: String,
    pub location: Coordinates,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    pub count: usize,
}

impl CacheLocationMeta {
    pub fn new(location: Coordinates, timestamp: i64, count: usize) -> Self {
        Self {
            key: LAST_CACHE_KEY.to_string(),
            location,
            timestamp,
            count,
        }
    }
}

/// Why the cache is (or is not) usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheValidityReason {
    Valid,
    NoCache,
    Expired,
    Moved { meters: u64 },
    Unavailable,
}

impl std::fmt::Display for CacheValidityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheValidityReason::Valid => write!(f, "cache valid"),
            CacheValidityReason::NoCache => write!(f, "no cache exists"),
            CacheValidityReason::Expired => write!(f, "cache expired"),
            CacheValidityReason::Moved { meters } => write!(f, "user moved {}m", meters),
            CacheValidityReason::Unavailable => write!(f, "cache unavailable"),
        }
    }
}

/// Result of a cache freshness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheValidity {
    pub is_valid: bool,
    pub reason: CacheValidityReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_location: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_minutes: Option<i64>,
}

impl CacheValidity {
    pub fn invalid(reason: CacheValidityReason) -> Self {
        Self {
            is_valid: false,
            reason,
            cached_location: None,
            age_minutes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_messages() {
        assert_eq!(CacheValidityReason::NoCache.to_string(), "no cache exists");
        assert_eq!(CacheValidityReason::Expired.to_string(), "cache expired");
        assert_eq!(
            CacheValidityReason::Moved { meters: 742 }.to_string(),
            "user moved 742m"
        );
    }

    #[test]
    fn test_meta_uses_singleton_key() {
        let meta = CacheLocationMeta::new(Coordinates::new(1.0, 2.0), 1_000, 3);
        assert_eq!(meta.key, LAST_CACHE_KEY);
        assert_eq!(meta.count, 3);
    }

    #[test]
    fn test_invalid_has_no_location() {
        let validity = CacheValidity::invalid(CacheValidityReason::Unavailable);
        assert!(!validity.is_valid);
        assert!(validity.cached_location.is_none());
        assert!(validity.age_minutes.is_none());
    }
}
