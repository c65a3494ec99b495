//! Ad analytics entity (database row mapping).

use chrono::NaiveDate;
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `ad_analytics`, with `ctr` cast to `float8`.
#[derive(Debug, Clone, FromRow)]
pub struct AdAnalyticsEntity {
    pub campaign_id: Uuid,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
}

impl From<AdAnalyticsEntity> for domain::models::AdAnalyticsDay {
    fn from(entity: AdAnalyticsEntity) -> Self {
        Self {
            campaign_id: entity.campaign_id,
            date: entity.date,
            impressions: entity.impressions,
            clicks: entity.clicks,
            ctr: entity.ctr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytics_entity_to_domain() {
        let entity = AdAnalyticsEntity {
            campaign_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            impressions: 200,
            clicks: 10,
            ctr: 5.0,
        };
        let day: domain::models::AdAnalyticsDay = entity.clone().into();
        assert_eq!(day.campaign_id, entity.campaign_id);
        assert_eq!(day.impressions, 200);
        assert_eq!(day.ctr, 5.0);
    }
}
