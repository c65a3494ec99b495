//! Cache-first nearby business search.

use std::sync::Arc;

use domain::models::{BusinessRecord, NearbyBusiness};
use serde::Serialize;
use shared::geo::Coordinates;
use tracing::{debug, info, warn};

use crate::backend::BusinessSource;
use crate::events::{DirectoryEvent, DirectoryEvents};
use crate::geo_cache::GeoCache;

/// Where a nearby result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NearbyOrigin {
    Cache,
    Network,
    /// The fetch failed and an outdated cache was served instead.
    StaleCache,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyResult {
    pub origin: NearbyOrigin,
    pub businesses: Vec<NearbyBusiness>,
}

pub struct NearbyBusinessService {
    cache: GeoCache,
    source: Arc<dyn BusinessSource>,
    events: DirectoryEvents,
    radius_m: f64,
}

impl NearbyBusinessService {
    pub fn new(
        cache: GeoCache,
        source: Arc<dyn BusinessSource>,
        events: DirectoryEvents,
        radius_m: f64,
    ) -> Self {
        Self {
            cache,
            source,
            events,
            radius_m,
        }
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    /// Businesses around `location`, nearest first.
    ///
    /// The whole neighbourhood is fetched and cached; `category` only
    /// filters what is returned, so one cache serves every category.
    pub async fn find_nearby(&self, location: Coordinates, category: Option<&str>) -> NearbyResult {
        let validity = self.cache.is_cache_valid(Some(location)).await;
        if validity.is_valid {
            let cached = self.cache.get_cached_businesses(category).await;
            debug!(count = cached.len(), age_minutes = ?validity.age_minutes, "Nearby cache hit");
            return self.result(NearbyOrigin::Cache, cached, location);
        }
        debug!(reason = %validity.reason, "Nearby cache miss");

        match self
            .source
            .nearby_businesses(location, self.radius_m, None)
            .await
        {
            Ok(fetched) => {
                let fetched: Vec<BusinessRecord> = fetched
                    .into_iter()
                    .filter(|b| b.is_public() && b.has_valid_coordinates())
                    .collect();
                self.cache.cache_businesses(&fetched, location).await;
                self.events.publish(DirectoryEvent::NearbyRefreshed {
                    center: location,
                    count: fetched.len(),
                });
                info!(count = fetched.len(), "Refreshed nearby businesses");

                let selected = match category {
                    Some(category) => fetched
                        .into_iter()
                        .filter(|b| b.category == category)
                        .collect(),
                    None => fetched,
                };
                self.result(NearbyOrigin::Network, selected, location)
            }
            Err(e) => {
                warn!(error = %e, "Nearby fetch failed, serving cached businesses");
                let stale = self.cache.get_cached_businesses(category).await;
                let origin = if stale.is_empty() {
                    NearbyOrigin::Empty
                } else {
                    NearbyOrigin::StaleCache
                };
                self.result(origin, stale, location)
            }
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.clear_cache().await;
        self.events.publish(DirectoryEvent::CacheCleared);
    }

    fn result(
        &self,
        origin: NearbyOrigin,
        businesses: Vec<BusinessRecord>,
        location: Coordinates,
    ) -> NearbyResult {
        NearbyResult {
            origin,
            businesses: NearbyBusiness::rank(businesses, &location, self.radius_m),
        }
    }
}
