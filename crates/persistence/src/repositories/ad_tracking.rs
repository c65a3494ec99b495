//! Ad impression/click tracking and daily analytics.

use chrono::NaiveDate;
use domain::models::analytics::TrackingEvent;
use domain::models::compute_ctr;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::AdAnalyticsEntity;
use crate::metrics::{record_click, record_impression, QueryTimer};

/// Repository for campaign counters and the `ad_analytics` table.
#[derive(Clone)]
pub struct AdTrackingRepository {
    pool: PgPool,
}

impl AdTrackingRepository {
    /// Creates a new AdTrackingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Records one impression or click against `campaign_id` on `today`.
    ///
    /// Never fails. Returns whether the event was stored; unknown campaigns
    /// and database errors return `false` after logging.
    pub async fn track(&self, campaign_id: Uuid, event: TrackingEvent, today: NaiveDate) -> bool {
        match self.increment_campaign_counter(campaign_id, event).await {
            Ok(0) => {
                debug!(campaign_id = %campaign_id, event = %event, "Tracking event for unknown campaign");
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(campaign_id = %campaign_id, event = %event, error = %e, "Failed to increment campaign counter");
                return false;
            }
        }

        match self.record_daily(campaign_id, event, today).await {
            Ok(day) => {
                match event {
                    TrackingEvent::Impression => record_impression(),
                    TrackingEvent::Click => record_click(),
                }
                debug!(
                    campaign_id = %campaign_id,
                    event = %event,
                    impressions = day.impressions,
                    clicks = day.clicks,
                    "Tracked ad event"
                );
                true
            }
            Err(e) => {
                warn!(campaign_id = %campaign_id, event = %event, error = %e, "Failed to update daily analytics");
                false
            }
        }
    }

    /// Atomically bumps the lifetime counter on the campaign row.
    /// Returns the number of rows affected (0 if the campaign doesn't exist).
    pub async fn increment_campaign_counter(
        &self,
        campaign_id: Uuid,
        event: TrackingEvent,
    ) -> Result<u64, sqlx::Error> {
        let (name, sql) = match event {
            TrackingEvent::Impression => (
                "increment_campaign_impressions",
                "UPDATE ad_campaigns SET impressions = impressions + 1 WHERE id = $1",
            ),
            TrackingEvent::Click => (
                "increment_campaign_clicks",
                "UPDATE ad_campaigns SET clicks = clicks + 1 WHERE id = $1",
            ),
        };
        let timer = QueryTimer::new(name);
        let result = sqlx::query(sql).bind(campaign_id).execute(&self.pool).await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Upserts the `(campaign_id, today)` row and recomputes its CTR.
    ///
    /// A click without an existing row inserts one with zero impressions.
    pub async fn record_daily(
        &self,
        campaign_id: Uuid,
        event: TrackingEvent,
        today: NaiveDate,
    ) -> Result<AdAnalyticsEntity, sqlx::Error> {
        let (impressions, clicks): (i64, i64) = match event {
            TrackingEvent::Impression => (1, 0),
            TrackingEvent::Click => (0, 1),
        };

        let timer = QueryTimer::new("upsert_ad_analytics_day");
        let mut tx = self.pool.begin().await?;
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            INSERT INTO ad_analytics (campaign_id, date, impressions, clicks, ctr)
            VALUES ($1, $2, $3, $4, 0)
            ON CONFLICT (campaign_id, date) DO UPDATE SET
                impressions = ad_analytics.impressions + EXCLUDED.impressions,
                clicks = ad_analytics.clicks + EXCLUDED.clicks
            RETURNING impressions, clicks
            "#,
        )
        .bind(campaign_id)
        .bind(today)
        .bind(impressions)
        .bind(clicks)
        .fetch_one(&mut *tx)
        .await?;

        let ctr = compute_ctr(counts.1, counts.0);
        let entity = sqlx::query_as::<_, AdAnalyticsEntity>(
            r#"
            UPDATE ad_analytics
            SET ctr = $3::numeric
            WHERE campaign_id = $1 AND date = $2
            RETURNING campaign_id, date, impressions, clicks, ctr::float8 AS ctr
            "#,
        )
        .bind(campaign_id)
        .bind(today)
        .bind(ctr)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Daily rows for a campaign in `from..=to`, oldest first.
    pub async fn find_daily_range(
        &self,
        campaign_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AdAnalyticsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ad_analytics_range");
        let result = sqlx::query_as::<_, AdAnalyticsEntity>(
            r#"
            SELECT campaign_id, date, impressions, clicks, ctr::float8 AS ctr
            FROM ad_analytics
            WHERE campaign_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(campaign_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether a campaign with this id exists.
    pub async fn campaign_exists(&self, campaign_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("campaign_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM ad_campaigns WHERE id = $1)",
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
