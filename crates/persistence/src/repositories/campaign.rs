//! Campaign repository for database operations.
//!
//! The `load_*` methods never fail: any error is logged and the pool
//! degrades to empty, so a broken ad backend can only ever mean "no ads".

use chrono::NaiveDate;
use domain::models::{AdCampaign, UserGeoContext};
use domain::services::targeting::select_enterprise;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::entities::{CampaignCreativeRow, RawCampaignRows, TargetedAdRow};
use crate::metrics::{record_campaign_fallback, record_campaign_fetch_failure, QueryTimer};

const CAMPAIGN_CREATIVE_COLUMNS: &str = r#"
    c.id AS campaign_id, c.advertiser_name, c.ad_level, c.target_countries,
    c.target_cities, c.is_demo, c.status, c.start_date, c.end_date,
    c.creative_title AS demo_title, c.creative_description AS demo_description,
    c.creative_image_url AS demo_image_url, c.creative_cta_text AS demo_cta_text,
    c.creative_cta_url AS demo_cta_url,
    cr.id AS creative_id, cr.title, cr.description, cr.image_url, cr.video_url,
    cr.cta_text, cr.cta_url
"#;

/// Repository for ad campaigns and their creatives.
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
    smart_targeting_enabled: bool,
}

impl CampaignRepository {
    /// Creates a new CampaignRepository with smart targeting enabled.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            smart_targeting_enabled: true,
        }
    }

    /// Skips the `get_targeted_ads` call and always uses the direct query.
    pub fn with_smart_targeting(mut self, enabled: bool) -> Self {
        self.smart_targeting_enabled = enabled;
        self
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ========================================================================
    // Resilient entry points
    // ========================================================================

    /// Candidate campaigns for one ad slot.
    ///
    /// Tries server-side targeting first and falls back to the direct slot
    /// query when it errors.
    pub async fn load_active_campaigns(
        &self,
        slot: &str,
        ctx: &UserGeoContext,
        today: NaiveDate,
    ) -> Vec<AdCampaign> {
        if self.smart_targeting_enabled {
            match self.fetch_targeted_rows(slot, ctx).await {
                Ok(rows) => {
                    debug!(slot = %slot, rows = rows.len(), "Smart targeting succeeded");
                    return RawCampaignRows::Targeted(rows).into_campaigns();
                }
                Err(e) => {
                    warn!(slot = %slot, error = %e, "Smart targeting failed, using fallback query");
                    record_campaign_fallback(slot);
                }
            }
        }

        match self.fetch_slot_rows(slot, today).await {
            Ok(rows) => RawCampaignRows::Joined(rows).into_campaigns(),
            Err(e) => {
                warn!(slot = %slot, error = %e, "Failed to load slot campaigns");
                record_campaign_fetch_failure("slot");
                Vec::new()
            }
        }
    }

    /// Running enterprise campaigns that target this viewer, paid first and
    /// most specific first.
    pub async fn load_enterprise_campaigns(
        &self,
        ctx: &UserGeoContext,
        today: NaiveDate,
    ) -> Vec<AdCampaign> {
        match self.fetch_running_rows(today).await {
            Ok(rows) => select_enterprise(RawCampaignRows::Joined(rows).into_campaigns(), ctx),
            Err(e) => {
                warn!(error = %e, "Failed to load enterprise campaigns");
                record_campaign_fetch_failure("enterprise");
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Rows from the `get_targeted_ads` database function.
    pub async fn fetch_targeted_rows(
        &self,
        slot: &str,
        ctx: &UserGeoContext,
    ) -> Result<Vec<TargetedAdRow>, sqlx::Error> {
        let timer = QueryTimer::new("get_targeted_ads");
        let result = sqlx::query_as::<_, TargetedAdRow>(
            r#"
            SELECT campaign_id, advertiser_name, creative_id, title, image_url, cta_url, cta_text
            FROM get_targeted_ads($1, $2, $3, $4)
            "#,
        )
        .bind(slot)
        .bind(ctx.country_code())
        .bind(ctx.language.as_deref())
        .bind(ctx.device_type.as_str())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active campaigns of a slot whose date window contains `today`.
    pub async fn fetch_slot_rows(
        &self,
        slot: &str,
        today: NaiveDate,
    ) -> Result<Vec<CampaignCreativeRow>, sqlx::Error> {
        let timer = QueryTimer::new("find_slot_campaigns");
        let sql = format!(
            r#"
            SELECT {CAMPAIGN_CREATIVE_COLUMNS}
            FROM ad_campaigns c
            JOIN ad_spaces s ON s.id = c.ad_space_id
            LEFT JOIN ad_creatives cr ON cr.campaign_id = c.id
            WHERE s.name = $1
              AND c.status = 'active'
              AND c.start_date <= $2
              AND c.end_date >= $2
            ORDER BY c.created_at ASC, cr.created_at ASC
            "#
        );
        let result = sqlx::query_as::<_, CampaignCreativeRow>(&sql)
            .bind(slot)
            .bind(today)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Every active campaign running on `today`; open-ended campaigns included.
    pub async fn fetch_running_rows(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CampaignCreativeRow>, sqlx::Error> {
        let timer = QueryTimer::new("find_running_campaigns");
        let sql = format!(
            r#"
            SELECT {CAMPAIGN_CREATIVE_COLUMNS}
            FROM ad_campaigns c
            LEFT JOIN ad_creatives cr ON cr.campaign_id = c.id
            WHERE c.status = 'active'
              AND c.start_date <= $1
              AND (c.end_date IS NULL OR c.end_date >= $1)
            ORDER BY c.created_at ASC, cr.created_at ASC
            "#
        );
        let result = sqlx::query_as::<_, CampaignCreativeRow>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Marks active campaigns whose end date is before `today` as completed.
    /// Returns the number of campaigns updated.
    pub async fn complete_expired(&self, today: NaiveDate) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("complete_expired_campaigns");
        let result = sqlx::query(
            r#"
            UPDATE ad_campaigns
            SET status = 'completed', updated_at = NOW()
            WHERE status = 'active' AND end_date IS NOT NULL AND end_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
