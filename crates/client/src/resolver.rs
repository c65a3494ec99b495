//! Live campaign resolution for ad slots.
//!
//! Each subscription is served by one spawned actor that owns both campaign
//! pools, the enterprise-over-local decision and the rotation timer. The
//! outside world talks to it through a command channel and observes it
//! through a `watch` of [`SlotSnapshot`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use domain::models::{AdCampaign, UserGeoContext};
use domain::services::{
    pool_identity, resolve_active_pool, Rotation, RotationConfig, SlotState,
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::backend::CampaignSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// When false the slot only ever shows its own local campaigns.
    pub include_enterprise: bool,
    /// Date sent to the backend; defaults to the local date at fetch time.
    pub today: Option<NaiveDate>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            include_enterprise: true,
            today: None,
        }
    }
}

/// What a slot displays right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub slot: String,
    pub state: SlotState,
    pub campaigns: Vec<AdCampaign>,
    pub index: usize,
}

impl SlotSnapshot {
    fn loading(slot: &str) -> Self {
        Self {
            slot: slot.to_string(),
            state: SlotState::Loading,
            campaigns: Vec::new(),
            index: 0,
        }
    }

    pub fn current(&self) -> Option<&AdCampaign> {
        self.campaigns.get(self.index)
    }
}

#[derive(Clone)]
pub struct CampaignPriorityResolver {
    source: Arc<dyn CampaignSource>,
    rotation: RotationConfig,
}

impl CampaignPriorityResolver {
    pub fn new(source: Arc<dyn CampaignSource>, rotation: RotationConfig) -> Self {
        Self { source, rotation }
    }

    /// Starts resolving `slot` for `ctx`. Must be called inside a Tokio runtime.
    pub fn subscribe(
        &self,
        slot: impl Into<String>,
        ctx: UserGeoContext,
        options: SubscribeOptions,
    ) -> SlotSubscription {
        let slot = slot.into();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (fetched_tx, fetched_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SlotSnapshot::loading(&slot));

        let actor = SlotActor {
            slot,
            ctx,
            options,
            source: self.source.clone(),
            rotation_config: self.rotation,
            generation: 0,
            enterprise: None,
            enterprise_generation: 0,
            local: None,
            local_generation: 0,
            state: SlotState::Loading,
            pool: Vec::new(),
            rotation: Rotation::default(),
            fetched_tx,
            snapshot_tx,
        };
        let task = tokio::spawn(actor.run(commands_rx, fetched_rx));

        SlotSubscription {
            commands: commands_tx,
            snapshot: snapshot_rx,
            task,
        }
    }
}

#[derive(Debug)]
enum Command {
    Next,
    Previous,
    GoTo(usize),
    UpdateContext(UserGeoContext),
    Refresh,
}

/// Handle to a running slot actor. Dropping it stops the actor too.
pub struct SlotSubscription {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SlotSnapshot>,
    task: JoinHandle<()>,
}

impl SlotSubscription {
    pub fn snapshot(&self) -> SlotSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SlotSnapshot> {
        self.snapshot.clone()
    }

    pub fn next(&self) {
        self.send(Command::Next);
    }

    pub fn previous(&self) {
        self.send(Command::Previous);
    }

    /// Out-of-range indexes wrap around the pool.
    pub fn go_to(&self, index: usize) {
        self.send(Command::GoTo(index));
    }

    /// Refetches both pools when the context differs from the current one.
    pub fn update_context(&self, ctx: UserGeoContext) {
        self.send(Command::UpdateContext(ctx));
    }

    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Stops the actor and waits for it to finish.
    pub async fn close(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!(error = %e, "Slot actor ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Slot actor already stopped");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PoolKind {
    Enterprise,
    Local,
}

struct Fetched {
    generation: u64,
    kind: PoolKind,
    campaigns: Vec<AdCampaign>,
}

struct SlotActor {
    slot: String,
    ctx: UserGeoContext,
    options: SubscribeOptions,
    source: Arc<dyn CampaignSource>,
    rotation_config: RotationConfig,
    generation: u64,
    enterprise: Option<Vec<AdCampaign>>,
    enterprise_generation: u64,
    local: Option<Vec<AdCampaign>>,
    local_generation: u64,
    state: SlotState,
    pool: Vec<AdCampaign>,
    rotation: Rotation,
    fetched_tx: mpsc::UnboundedSender<Fetched>,
    snapshot_tx: watch::Sender<SlotSnapshot>,
}

fn rotation_ticker(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl SlotActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut fetched: mpsc::UnboundedReceiver<Fetched>,
    ) {
        self.start_fetch();

        let mut ticker: Option<Interval> = None;
        let mut period: Option<Duration> = None;

        loop {
            let pool_changed = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        self.handle(command);
                        false
                    }
                    None => break,
                },
                Some(result) = fetched.recv() => self.apply(result),
                _ = next_tick(&mut ticker) => {
                    self.rotate();
                    false
                }
            };

            let wanted = self.rotation_period();
            if pool_changed || wanted != period {
                ticker = wanted.map(rotation_ticker);
                period = wanted;
            }
        }

        debug!(slot = %self.slot, "Slot subscription closed");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Next => self.navigate(Rotation::advance),
            Command::Previous => self.navigate(Rotation::previous),
            Command::GoTo(index) => self.navigate(|rotation| rotation.go_to(index)),
            Command::UpdateContext(ctx) => {
                if ctx != self.ctx {
                    self.ctx = ctx;
                    self.start_fetch();
                }
            }
            Command::Refresh => self.start_fetch(),
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut Rotation) -> usize) {
        if !self.pool.is_empty() {
            step(&mut self.rotation);
            self.publish();
        }
    }

    fn rotate(&mut self) {
        if self.rotation.should_rotate() {
            self.rotation.advance();
            self.publish();
        }
    }

    fn rotation_period(&self) -> Option<Duration> {
        if !self.rotation.should_rotate() {
            return None;
        }
        self.rotation_config
            .interval_for(self.state, self.options.include_enterprise)
            .filter(|period| !period.is_zero())
    }

    /// Fetches both pools under a new generation. Results of older
    /// generations are discarded on arrival.
    fn start_fetch(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let today = self
            .options
            .today
            .unwrap_or_else(|| Local::now().date_naive());
        debug!(slot = %self.slot, generation, "Fetching campaign pools");

        if self.options.include_enterprise {
            let source = self.source.clone();
            let ctx = self.ctx.clone();
            let tx = self.fetched_tx.clone();
            tokio::spawn(async move {
                let campaigns = source
                    .enterprise_campaigns(&ctx, today)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Enterprise campaign fetch failed");
                        Vec::new()
                    });
                let _ = tx.send(Fetched {
                    generation,
                    kind: PoolKind::Enterprise,
                    campaigns,
                });
            });
        } else {
            self.enterprise = Some(Vec::new());
            self.enterprise_generation = generation;
        }

        let source = self.source.clone();
        let ctx = self.ctx.clone();
        let slot = self.slot.clone();
        let tx = self.fetched_tx.clone();
        tokio::spawn(async move {
            let campaigns = source
                .slot_campaigns(&slot, &ctx, today)
                .await
                .unwrap_or_else(|e| {
                    warn!(slot = %slot, error = %e, "Slot campaign fetch failed");
                    Vec::new()
                });
            let _ = tx.send(Fetched {
                generation,
                kind: PoolKind::Local,
                campaigns,
            });
        });
    }

    /// Returns whether the active pool's identity changed.
    fn apply(&mut self, fetched: Fetched) -> bool {
        if fetched.generation != self.generation {
            debug!(
                slot = %self.slot,
                stale = fetched.generation,
                current = self.generation,
                "Discarding stale campaign response"
            );
            return false;
        }

        let campaigns: Vec<AdCampaign> = fetched
            .campaigns
            .into_iter()
            .filter(AdCampaign::is_renderable)
            .collect();
        match fetched.kind {
            PoolKind::Enterprise => {
                self.enterprise = Some(campaigns);
                self.enterprise_generation = fetched.generation;
            }
            PoolKind::Local => {
                self.local = Some(campaigns);
                self.local_generation = fetched.generation;
            }
        }
        self.resolve()
    }

    fn resolve(&mut self) -> bool {
        // Local campaigns count only once the enterprise pool of the same
        // generation is known.
        let current = self.enterprise_generation == self.generation
            && self.local_generation == self.generation;
        let local = if current { self.local.as_deref() } else { None };
        let (state, pool) = resolve_active_pool(self.enterprise.as_deref(), local);

        // A refresh in flight keeps the previous resolution on screen.
        if state == SlotState::Loading && self.state != SlotState::Loading {
            return false;
        }

        let identity_changed = pool_identity(&pool) != pool_identity(&self.pool);
        if identity_changed {
            self.rotation.reset(pool.len());
        }
        self.state = state;
        self.pool = pool;
        self.publish();
        identity_changed
    }

    fn publish(&self) {
        let snapshot = SlotSnapshot {
            slot: self.slot.clone(),
            state: self.state,
            campaigns: self.pool.clone(),
            index: self.rotation.index(),
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
