//! Location-aware local cache of nearby businesses.
//!
//! The cache is an accelerant only: when the store is missing or failing,
//! reads come back empty / invalid and writes are dropped after a warning.

mod store;

use std::sync::Arc;

use chrono::Utc;
use domain::models::{
    BusinessRecord, CacheLocationMeta, CacheValidity, CacheValidityReason, CachedBusinessEntry,
};
use domain::services::evaluate_cache_validity;
use serde::{Deserialize, Serialize};
use shared::geo::Coordinates;
use tracing::{debug, warn};

pub use store::{CacheSnapshot, CacheStore, FileCacheStore, MemoryCacheStore};

/// How a fresh fetch is written over existing entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheWritePolicy {
    /// Upsert by id; entries missing from the new fetch stay until cleared.
    #[default]
    Upsert,
    /// Drop every entry not in the new fetch.
    Replace,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct GeoCache {
    store: Option<Arc<dyn CacheStore>>,
    policy: CacheWritePolicy,
}

impl GeoCache {
    pub fn new(store: Arc<dyn CacheStore>, policy: CacheWritePolicy) -> Self {
        Self {
            store: Some(store),
            policy,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), CacheWritePolicy::Upsert)
    }

    /// A cache whose runtime has no persistent store.
    pub fn unavailable() -> Self {
        Self {
            store: None,
            policy: CacheWritePolicy::Upsert,
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn policy(&self) -> CacheWritePolicy {
        self.policy
    }

    /// Stores `records` fetched around `location` and rewrites the location meta.
    pub async fn cache_businesses(&self, records: &[BusinessRecord], location: Coordinates) {
        self.cache_businesses_at(records, location, now_ms()).await
    }

    pub async fn cache_businesses_at(
        &self,
        records: &[BusinessRecord],
        location: Coordinates,
        now_ms: i64,
    ) {
        let Some(store) = &self.store else {
            return;
        };

        let entries: Vec<CachedBusinessEntry> = records
            .iter()
            .cloned()
            .map(|record| CachedBusinessEntry {
                record,
                cached_at: now_ms,
            })
            .collect();
        let replace = self.policy == CacheWritePolicy::Replace;

        if let Err(e) = store.put_entries(entries, replace).await {
            warn!(error = %e, "Failed to write geo-cache entries");
            return;
        }
        let meta = CacheLocationMeta::new(location, now_ms, records.len());
        if let Err(e) = store.put_meta(meta).await {
            warn!(error = %e, "Failed to write geo-cache location");
            return;
        }
        debug!(count = records.len(), policy = ?self.policy, "Cached businesses");
    }

    /// Whether the cache still represents `current` (existence, age, distance).
    pub async fn is_cache_valid(&self, current: Option<Coordinates>) -> CacheValidity {
        self.is_cache_valid_at(current, now_ms()).await
    }

    pub async fn is_cache_valid_at(&self, current: Option<Coordinates>, now_ms: i64) -> CacheValidity {
        let Some(store) = &self.store else {
            return CacheValidity::invalid(CacheValidityReason::Unavailable);
        };
        match store.meta().await {
            Ok(meta) => evaluate_cache_validity(meta.as_ref(), current.as_ref(), now_ms),
            Err(e) => {
                warn!(error = %e, "Failed to read geo-cache location");
                CacheValidity::invalid(CacheValidityReason::Unavailable)
            }
        }
    }

    /// Every cached record, optionally restricted to one category.
    pub async fn get_cached_businesses(&self, category: Option<&str>) -> Vec<BusinessRecord> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.entries(category).await {
            Ok(entries) => entries.into_iter().map(|e| e.record).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to read geo-cache entries");
                Vec::new()
            }
        }
    }

    pub async fn clear_cache(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.clear().await {
                warn!(error = %e, "Failed to clear geo-cache");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use domain::models::business::STATUS_APPROVED;
    use domain::services::MAX_CACHE_AGE_MS;
    use fake::faker::company::en::CompanyName;
    use fake::Fake;
    use uuid::Uuid;

    use crate::error::StoreError;

    const NOW: i64 = 1_790_000_000_000;

    pub(crate) fn business(name: &str, category: &str) -> BusinessRecord {
        BusinessRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            subcategory: None,
            address: None,
            latitude: 20.6767,
            longitude: -103.3475,
            phone: None,
            rating: Some(4.2),
            updated_at: Utc::now(),
            owner_id: None,
            is_premium_owner: false,
            opening_hours: None,
            is_visible: true,
            status: STATUS_APPROVED.to_string(),
        }
    }

    pub(crate) fn entry(record: &BusinessRecord, cached_at: i64) -> CachedBusinessEntry {
        CachedBusinessEntry {
            record: record.clone(),
            cached_at,
        }
    }

    fn random_businesses(n: usize) -> Vec<BusinessRecord> {
        (0..n)
            .map(|_| business(&CompanyName().fake::<String>(), "restaurantes"))
            .collect()
    }

    fn guadalajara() -> Coordinates {
        Coordinates::new(20.6767, -103.3475)
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl CacheStore for BrokenStore {
        async fn put_entries(&self, _: Vec<CachedBusinessEntry>, _: bool) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn entries(&self, _: Option<&str>) -> Result<Vec<CachedBusinessEntry>, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn put_meta(&self, _: CacheLocationMeta) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn meta(&self) -> Result<Option<CacheLocationMeta>, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[tokio::test]
    async fn test_cold_cache_is_invalid() {
        let cache = GeoCache::in_memory();
        let validity = cache.is_cache_valid_at(Some(guadalajara()), NOW).await;
        assert!(!validity.is_valid);
        assert_eq!(validity.reason, CacheValidityReason::NoCache);
        assert_eq!(validity.reason.to_string(), "no cache exists");
    }

    #[tokio::test]
    async fn test_round_trip_returns_every_record() {
        let cache = GeoCache::in_memory();
        let records = random_businesses(12);
        cache.cache_businesses_at(&records, guadalajara(), NOW).await;

        let cached = cache.get_cached_businesses(None).await;
        for record in &records {
            assert!(cached.contains(record), "missing {}", record.name);
        }

        let validity = cache.is_cache_valid_at(Some(guadalajara()), NOW + 60_000).await;
        assert!(validity.is_valid);
        assert_eq!(validity.age_minutes, Some(1));
    }

    #[tokio::test]
    async fn test_expired_and_moved() {
        let cache = GeoCache::in_memory();
        cache
            .cache_businesses_at(&random_businesses(1), guadalajara(), NOW)
            .await;

        let expired = cache
            .is_cache_valid_at(Some(guadalajara()), NOW + MAX_CACHE_AGE_MS + 1)
            .await;
        assert_eq!(expired.reason, CacheValidityReason::Expired);

        let moved = cache
            .is_cache_valid_at(Some(Coordinates::new(20.6867, -103.3475)), NOW)
            .await;
        assert!(!moved.is_valid);
        assert!(matches!(moved.reason, CacheValidityReason::Moved { meters } if meters > 500));
    }

    #[tokio::test]
    async fn test_upsert_keeps_unrelated_entries() {
        let cache = GeoCache::in_memory();
        let first = random_businesses(2);
        let second = random_businesses(1);
        cache.cache_businesses_at(&first, guadalajara(), NOW).await;
        cache.cache_businesses_at(&second, guadalajara(), NOW + 1).await;
        assert_eq!(cache.get_cached_businesses(None).await.len(), 3);
    }

    #[tokio::test]
    async fn test_replace_policy_drops_previous_fetch() {
        let cache = GeoCache::new(Arc::new(MemoryCacheStore::new()), CacheWritePolicy::Replace);
        cache
            .cache_businesses_at(&random_businesses(2), guadalajara(), NOW)
            .await;
        let second = random_businesses(1);
        cache.cache_businesses_at(&second, guadalajara(), NOW + 1).await;
        assert_eq!(cache.get_cached_businesses(None).await, second);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let cache = GeoCache::in_memory();
        let records = vec![business("Cafe", "cafes"), business("Bar", "bares")];
        cache.cache_businesses_at(&records, guadalajara(), NOW).await;

        let cafes = cache.get_cached_businesses(Some("cafes")).await;
        assert_eq!(cafes.len(), 1);
        assert_eq!(cafes[0].name, "Cafe");
        assert!(cache.get_cached_businesses(Some("hoteles")).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_makes_cache_cold() {
        let cache = GeoCache::in_memory();
        cache
            .cache_businesses_at(&random_businesses(3), guadalajara(), NOW)
            .await;
        cache.clear_cache().await;
        assert!(cache.get_cached_businesses(None).await.is_empty());
        let validity = cache.is_cache_valid_at(None, NOW).await;
        assert_eq!(validity.reason, CacheValidityReason::NoCache);
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades() {
        for cache in [
            GeoCache::unavailable(),
            GeoCache::new(Arc::new(BrokenStore), CacheWritePolicy::Upsert),
        ] {
            cache
                .cache_businesses_at(&random_businesses(2), guadalajara(), NOW)
                .await;
            assert!(cache.get_cached_businesses(None).await.is_empty());
            let validity = cache.is_cache_valid_at(Some(guadalajara()), NOW).await;
            assert!(!validity.is_valid);
            assert_eq!(validity.reason, CacheValidityReason::Unavailable);
            cache.clear_cache().await;
        }
    }
}
