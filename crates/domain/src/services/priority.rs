//! Enterprise-vs-local slot resolution and rotation arithmetic.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AdCampaign;

/// What a slot is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    #[default]
    Loading,
    NoCampaigns,
    ShowingEnterprise,
    ShowingLocal,
}

impl SlotState {
    pub fn is_showing(&self) -> bool {
        matches!(self, SlotState::ShowingEnterprise | SlotState::ShowingLocal)
    }
}

/// Resolves the slot state from both pools. `None` means "not fetched yet".
///
/// Any enterprise campaign fully suppresses local ones. Local campaigns are
/// only shown once the enterprise pool is known to be empty.
pub fn resolve_slot_state(
    enterprise: Option<&[AdCampaign]>,
    local: Option<&[AdCampaign]>,
) -> SlotState {
    match (enterprise, local) {
        (Some(e), _) if !e.is_empty() => SlotState::ShowingEnterprise,
        (Some(_), Some(l)) if !l.is_empty() => SlotState::ShowingLocal,
        (Some(_), Some(_)) => SlotState::NoCampaigns,
        _ => SlotState::Loading,
    }
}

/// Returns the state together with the pool that should rotate.
pub fn resolve_active_pool(
    enterprise: Option<&[AdCampaign]>,
    local: Option<&[AdCampaign]>,
) -> (SlotState, Vec<AdCampaign>) {
    let state = resolve_slot_state(enterprise, local);
    let pool = match state {
        SlotState::ShowingEnterprise => enterprise.unwrap_or_default().to_vec(),
        SlotState::ShowingLocal => local.unwrap_or_default().to_vec(),
        SlotState::Loading | SlotState::NoCampaigns => Vec::new(),
    };
    (state, pool)
}

/// Ordered campaign ids; rotation restarts when this changes.
pub fn pool_identity(pool: &[AdCampaign]) -> Vec<Uuid> {
    pool.iter().map(|c| c.id).collect()
}

/// Response body for the resolved active pool of a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSlotResponse {
    pub slot: String,
    pub state: SlotState,
    pub campaigns: Vec<AdCampaign>,
}

/// Rotation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    pub enterprise_interval: Duration,
    pub local_interval: Duration,
    /// Added to the local interval when local ads are a fallback for enterprise.
    pub fallback_extra: Duration,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enterprise_interval: Duration::from_secs(8),
            local_interval: Duration::from_secs(10),
            fallback_extra: Duration::from_secs(2),
        }
    }
}

impl RotationConfig {
    /// Interval for the given state, or `None` when nothing should rotate.
    pub fn interval_for(&self, state: SlotState, local_is_fallback: bool) -> Option<Duration> {
        match state {
            SlotState::ShowingEnterprise => Some(self.enterprise_interval),
            SlotState::ShowingLocal if local_is_fallback => {
                Some(self.local_interval + self.fallback_extra)
            }
            SlotState::ShowingLocal => Some(self.local_interval),
            SlotState::Loading | SlotState::NoCampaigns => None,
        }
    }
}

/// Wrapping cursor over a pool of `len` campaigns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rotation {
    index: usize,
    len: usize,
}

impl Rotation {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A single-campaign pool has nothing to rotate to.
    pub fn should_rotate(&self) -> bool {
        self.len > 1
    }

    pub fn advance(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }

    pub fn previous(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
        self.index
    }

    /// Out-of-range targets wrap modulo the pool length.
    pub fn go_to(&mut self, index: usize) -> usize {
        self.index = if self.len == 0 { 0 } else { index % self.len };
        self.index
    }

    /// Back to the first campaign of a pool with `len` entries.
    pub fn reset(&mut self, len: usize) {
        self.index = 0;
        self.len = len;
    }
}
