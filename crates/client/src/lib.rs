//! Geobooker client core.
//!
//! Everything a front end needs to show the directory and its ads:
//! a location-aware business cache, live per-slot campaign resolution with
//! rotation, fire-and-forget ad tracking and the guest search gate. All of
//! it hangs off one explicitly constructed [`ClientContext`].

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod flags;
pub mod geo_cache;
pub mod interstitial;
pub mod nearby;
pub mod resolver;
pub mod tracker;

use std::sync::Arc;

use domain::models::UserGeoContext;
use tracing::{info, warn};

pub use backend::{ApiClient, BusinessSource, CampaignSource, TrackingSink};
pub use config::{ClientConfig, RotationSettings};
pub use error::{ClientError, StoreError};
pub use events::{DirectoryEvent, DirectoryEvents};
pub use flags::{FileFlagStore, FlagStore, MemoryFlagStore};
pub use geo_cache::{CacheWritePolicy, GeoCache};
pub use interstitial::InterstitialGate;
pub use nearby::{NearbyBusinessService, NearbyOrigin, NearbyResult};
pub use resolver::{CampaignPriorityResolver, SlotSnapshot, SlotSubscription, SubscribeOptions};
pub use tracker::{AdTracker, LogNavigator, NavigationTarget, Navigator};

const GEO_CACHE_FILE: &str = "geo_cache.json";
const FLAGS_FILE: &str = "flags.json";

/// Owns the backend client, the cache, the flag store and the event bus.
pub struct ClientContext {
    config: ClientConfig,
    api: Arc<ApiClient>,
    events: DirectoryEvents,
    resolver: CampaignPriorityResolver,
    tracker: AdTracker,
    nearby: NearbyBusinessService,
    interstitial: InterstitialGate,
}

impl ClientContext {
    /// Builds every client service. Local stores that cannot be opened
    /// degrade (cache unavailable, flags in memory) instead of failing.
    pub async fn open(config: ClientConfig) -> Result<Self, ClientError> {
        Self::open_with_navigator(config, Arc::new(LogNavigator)).await
    }

    pub async fn open_with_navigator(
        config: ClientConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let api = Arc::new(ApiClient::new(&config.api_base_url, config.request_timeout())?);
        let events = DirectoryEvents::default();

        let cache = open_cache(&config).await;
        let flags = open_flags(&config).await;

        let resolver = CampaignPriorityResolver::new(api.clone(), config.rotation_config());
        let tracker = AdTracker::new(api.clone(), navigator);
        let nearby =
            NearbyBusinessService::new(cache, api.clone(), events.clone(), config.nearby_radius_m);
        let interstitial = InterstitialGate::new(flags, events.clone());

        info!(
            api = %api.base_url(),
            cache_available = nearby.cache().is_available(),
            "Client context ready"
        );

        Ok(Self {
            config,
            api,
            events,
            resolver,
            tracker,
            nearby,
            interstitial,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn events(&self) -> &DirectoryEvents {
        &self.events
    }

    pub fn resolver(&self) -> &CampaignPriorityResolver {
        &self.resolver
    }

    pub fn tracker(&self) -> &AdTracker {
        &self.tracker
    }

    pub fn nearby(&self) -> &NearbyBusinessService {
        &self.nearby
    }

    pub fn interstitial(&self) -> &InterstitialGate {
        &self.interstitial
    }

    /// Shorthand for subscribing a slot with default options.
    pub fn subscribe_slot(&self, slot: &str, ctx: UserGeoContext) -> SlotSubscription {
        self.resolver
            .subscribe(slot, ctx, SubscribeOptions::default())
    }

    /// Releases the context. File stores are written on every change, so
    /// nothing is flushed here.
    pub async fn shutdown(self) {
        info!(
            subscribers = self.events.subscriber_count(),
            "Client context shut down"
        );
    }
}

async fn open_cache(config: &ClientConfig) -> GeoCache {
    let Some(dir) = &config.cache_dir else {
        return GeoCache::new(
            Arc::new(geo_cache::MemoryCacheStore::new()),
            config.cache_write_policy,
        );
    };
    match geo_cache::FileCacheStore::open(dir.join(GEO_CACHE_FILE)).await {
        Ok(store) => GeoCache::new(Arc::new(store), config.cache_write_policy),
        Err(e) => {
            warn!(error = %e, "Geo-cache store unavailable");
            GeoCache::unavailable()
        }
    }
}

async fn open_flags(config: &ClientConfig) -> Arc<dyn FlagStore> {
    if let Some(dir) = &config.cache_dir {
        match FileFlagStore::open(dir.join(FLAGS_FILE)).await {
            Ok(store) => return Arc::new(store),
            Err(e) => warn!(error = %e, "Flag store unavailable, keeping flags in memory"),
        }
    }
    Arc::new(MemoryFlagStore::new())
}
