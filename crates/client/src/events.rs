//! Typed notifications between client components.

use chrono::NaiveDate;
use shared::geo::Coordinates;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryEvent {
    /// A network fetch replaced the nearby result set around `center`.
    NearbyRefreshed { center: Coordinates, count: usize },
    CacheCleared,
    /// The guest search interstitial should be shown.
    InterstitialTriggered { date: NaiveDate },
}

/// Broadcast bus. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct DirectoryEvents {
    tx: broadcast::Sender<DirectoryEvent>,
}

impl Default for DirectoryEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DirectoryEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers saw the event. Zero is not an error.
    pub fn publish(&self, event: DirectoryEvent) -> usize {
        trace!(?event, "Publishing directory event");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
