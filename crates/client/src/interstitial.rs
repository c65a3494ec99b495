//! Daily search gate for the guest interstitial.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use domain::services::SearchGateState;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::events::{DirectoryEvent, DirectoryEvents};
use crate::flags::{get_typed, set_typed, FlagStore};

pub const SEARCH_GATE_KEY: &str = "search_gate";

/// Counts searches and fires the interstitial once per day for guests.
///
/// The state is loaded lazily from the flag store and kept in memory, so a
/// failing store still gates correctly for the life of the process.
pub struct InterstitialGate {
    flags: Arc<dyn FlagStore>,
    events: DirectoryEvents,
    state: Mutex<Option<SearchGateState>>,
}

impl InterstitialGate {
    pub fn new(flags: Arc<dyn FlagStore>, events: DirectoryEvents) -> Self {
        Self {
            flags,
            events,
            state: Mutex::new(None),
        }
    }

    pub async fn record_search(&self, is_guest: bool) -> bool {
        self.record_search_on(Local::now().date_naive(), is_guest)
            .await
    }

    pub async fn record_search_on(&self, today: NaiveDate, is_guest: bool) -> bool {
        if !is_guest {
            return false;
        }

        let mut guard = self.state.lock().await;
        if guard.is_none() {
            let loaded = match get_typed(self.flags.as_ref(), SEARCH_GATE_KEY).await {
                Ok(state) => state.unwrap_or_default(),
                Err(e) => {
                    warn!(error = %e, "Failed to load search gate state");
                    SearchGateState::default()
                }
            };
            *guard = Some(loaded);
        }
        let state = guard.get_or_insert_with(SearchGateState::default);

        let fire = state.record_search(today, is_guest);
        if let Err(e) = set_typed(self.flags.as_ref(), SEARCH_GATE_KEY, &*state).await {
            warn!(error = %e, "Failed to save search gate state");
        }
        debug!(count = state.search_count, fire, "Recorded search");

        if fire {
            self.events
                .publish(DirectoryEvent::InterstitialTriggered { date: today });
        }
        fire
    }
}
