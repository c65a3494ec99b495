//! Marks campaigns whose end date has passed as completed.

use std::time::Duration;

use chrono::Local;
use persistence::repositories::CampaignRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::Job;

pub struct ExpireCampaignsJob {
    campaigns: CampaignRepository,
    interval: Duration,
}

impl ExpireCampaignsJob {
    pub fn new(pool: PgPool, interval: Duration) -> Self {
        Self {
            campaigns: CampaignRepository::new(pool),
            interval,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireCampaignsJob {
    fn name(&self) -> &'static str {
        "expire_campaigns"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), String> {
        let today = Local::now().date_naive();
        let completed = self
            .campaigns
            .complete_expired(today)
            .await
            .map_err(|e| e.to_string())?;
        if completed > 0 {
            info!(completed, today = %today, "Completed expired campaigns");
        }
        Ok(())
    }
}
