//! Fire-and-forget impression and click tracking.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use domain::models::analytics::TrackingEvent;
use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::TrackingSink;

/// Where a click sends the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub url: Url,
    /// Always opened in a new browsing context.
    pub new_context: bool,
    pub no_referrer: bool,
    pub no_opener: bool,
}

impl NavigationTarget {
    /// Isolated target for an advertiser URL. Only http(s) is accepted.
    pub fn isolated(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        Some(Self {
            url,
            new_context: true,
            no_referrer: true,
            no_opener: true,
        })
    }
}

/// Opens advertiser destinations.
pub trait Navigator: Send + Sync {
    fn open(&self, target: &NavigationTarget);
}

/// Navigator for headless runtimes: records the navigation in the log.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open(&self, target: &NavigationTarget) {
        info!(url = %target.url, "Opening advertiser destination");
    }
}

#[derive(Clone)]
pub struct AdTracker {
    sink: Arc<dyn TrackingSink>,
    navigator: Arc<dyn Navigator>,
}

impl AdTracker {
    pub fn new(sink: Arc<dyn TrackingSink>, navigator: Arc<dyn Navigator>) -> Self {
        Self { sink, navigator }
    }

    /// Records an impression in the background. The handle resolves to
    /// whether the backend stored it; callers are free to drop it.
    pub fn track_impression(&self, campaign_id: Uuid) -> JoinHandle<bool> {
        self.spawn_record(campaign_id, TrackingEvent::Impression)
    }

    /// Navigates to `destination` first, then records the click in the
    /// background. Navigation never waits on tracking.
    pub fn track_click(&self, campaign_id: Uuid, destination: &str) -> JoinHandle<bool> {
        match NavigationTarget::isolated(destination) {
            Some(target) => self.navigator.open(&target),
            None => warn!(campaign_id = %campaign_id, "Skipping navigation to invalid ad URL"),
        }
        self.spawn_record(campaign_id, TrackingEvent::Click)
    }

    fn spawn_record(&self, campaign_id: Uuid, event: TrackingEvent) -> JoinHandle<bool> {
        let sink = self.sink.clone();
        let today: NaiveDate = Local::now().date_naive();
        tokio::spawn(async move {
            match sink.record(campaign_id, event, today).await {
                Ok(recorded) => {
                    debug!(campaign_id = %campaign_id, ?event, recorded, "Tracked ad event");
                    recorded
                }
                Err(e) => {
                    warn!(campaign_id = %campaign_id, ?event, error = %e, "Ad tracking failed");
                    false
                }
            }
        })
    }
}
