//! Ad analytics domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Daily aggregate counters for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdAnalyticsDay {
    pub campaign_id: Uuid,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
}

impl AdAnalyticsDay {
    pub fn new(campaign_id: Uuid, date: NaiveDate, impressions: i64, clicks: i64) -> Self {
        Self {
            campaign_id,
            date,
            impressions,
            clicks,
            ctr: compute_ctr(clicks, impressions),
        }
    }
}

/// Click-through rate as a percentage rounded to two decimals.
///
/// Zero impressions yield `0.0`.
pub fn compute_ctr(clicks: i64, impressions: i64) -> f64 {
    if impressions <= 0 {
        return 0.0;
    }
    let ratio = clicks as f64 / impressions as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// Per-day rows and totals for a date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdAnalyticsReport {
    pub campaign_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: Vec<AdAnalyticsDay>,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub ctr: f64,
}

impl AdAnalyticsReport {
    pub fn from_days(campaign_id: Uuid, from: NaiveDate, to: NaiveDate, days: Vec<AdAnalyticsDay>) -> Self {
        let total_impressions = days.iter().map(|d| d.impressions).sum();
        let total_clicks = days.iter().map(|d| d.clicks).sum();
        Self {
            campaign_id,
            from,
            to,
            days,
            total_impressions,
            total_clicks,
            ctr: compute_ctr(total_clicks, total_impressions),
        }
    }
}

/// Query parameters for the analytics report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Kind of tracked interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingEvent {
    Impression,
    Click,
}

impl std::fmt::Display for TrackingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingEvent::Impression => write!(f, "impression"),
            TrackingEvent::Click => write!(f, "click"),
        }
    }
}

/// Response for tracking endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub recorded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctr_basic() {
        assert_eq!(compute_ctr(10, 200), 5.0);
    }

    #[test]
    fn test_ctr_zero_impressions() {
        assert_eq!(compute_ctr(0, 0), 0.0);
        assert_eq!(compute_ctr(3, 0), 0.0);
    }

    #[test]
    fn test_ctr_rounds_to_two_decimals() {
        // 1 / 3 * 100 = 33.333...
        assert_eq!(compute_ctr(1, 3), 33.33);
        // 2 / 3 * 100 = 66.666...
        assert_eq!(compute_ctr(2, 3), 66.67);
    }

    #[test]
    fn test_report_totals() {
        let id = Uuid::new_v4();
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let report = AdAnalyticsReport::from_days(
            id,
            d1,
            d2,
            vec![
                AdAnalyticsDay::new(id, d1, 100, 4),
                AdAnalyticsDay::new(id, d2, 300, 6),
            ],
        );
        assert_eq!(report.total_impressions, 400);
        assert_eq!(report.total_clicks, 10);
        assert_eq!(report.ctr, 2.5);
        assert_eq!(report.days[0].ctr, 4.0);
    }

    #[test]
    fn test_tracking_event_display() {
        assert_eq!(TrackingEvent::Impression.to_string(), "impression");
        assert_eq!(TrackingEvent::Click.to_string(), "click");
    }
}
