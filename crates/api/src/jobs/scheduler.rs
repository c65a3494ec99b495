//! Periodic background jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// A unit of periodic background work.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    /// Delay between runs. The first run happens one interval after start.
    fn interval(&self) -> Duration;

    async fn execute(&self) -> Result<(), String>;
}

/// Runs one job and logs the outcome. Returns whether it succeeded.
pub async fn run_job(job: &dyn Job) -> bool {
    let start = Instant::now();
    match job.execute().await {
        Ok(()) => {
            info!(
                job = job.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Job completed"
            );
            true
        }
        Err(e) => {
            error!(
                job = job.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Job failed"
            );
            false
        }
    }
}

/// Owns one tokio task per registered job and a shared shutdown signal.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Spawns every registered job. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            self.handles.push(tokio::spawn(async move {
                let period = job.interval();
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker.tick().await;
                info!(job = job.name(), interval_secs = period.as_secs(), "Job scheduled");

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            run_job(job.as_ref()).await;
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!(job = job.name(), "Job stopped");
                                break;
                            }
                        }
                    }
                }
            }));
        }
    }

    /// Signals every job to stop and waits up to `timeout` for them.
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.shutdown_tx.send(true);

        let handles = self.handles;
        let joined = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };
        if tokio::time::timeout(timeout, joined).await.is_err() {
            warn!(timeout_ms = timeout.as_millis() as u64, "Job shutdown timed out");
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
