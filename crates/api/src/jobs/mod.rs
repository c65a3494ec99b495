//! Background job scheduler and job implementations.

mod expire_campaigns;
mod pool_metrics;
mod scheduler;

use std::time::Duration;

use sqlx::PgPool;

use crate::config::JobsConfig;

pub use expire_campaigns::ExpireCampaignsJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{run_job, Job, JobScheduler};

/// Builds the scheduler with every job enabled by `config`. Not started.
pub fn build_scheduler(config: &JobsConfig, pool: &PgPool) -> JobScheduler {
    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(
        pool.clone(),
        Duration::from_secs(config.pool_metrics_interval_secs.max(1)),
    ));
    scheduler.register(ExpireCampaignsJob::new(
        pool.clone(),
        Duration::from_secs(config.expire_campaigns_interval_mins.max(1) * 60),
    ));
    scheduler
}
