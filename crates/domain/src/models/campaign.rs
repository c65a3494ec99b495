//! Advertising campaign domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Targeting tier of a campaign.
///
/// Campaigns without an explicit level behave like global ones for
/// geo-filtering but sort after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdLevel {
    City,
    Region,
    Country,
    Global,
    #[default]
    Unspecified,
}

impl AdLevel {
    /// Converts to database string representation.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            AdLevel::City => Some("city"),
            AdLevel::Region => Some("region"),
            AdLevel::Country => Some("country"),
            AdLevel::Global => Some("global"),
            AdLevel::Unspecified => None,
        }
    }

    /// Parses the nullable `ad_level` column. Unknown values count as unspecified.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("city") => AdLevel::City,
            Some("region") => AdLevel::Region,
            Some("country") => AdLevel::Country,
            Some("global") => AdLevel::Global,
            _ => AdLevel::Unspecified,
        }
    }

    /// Lower is more specific: city 1, region 2, country 3, global 4, unspecified 5.
    pub fn specificity_rank(&self) -> u8 {
        match self {
            AdLevel::City => 1,
            AdLevel::Region => 2,
            AdLevel::Country => 3,
            AdLevel::Global => 4,
            AdLevel::Unspecified => 5,
        }
    }

    /// Global and unspecified campaigns are shown everywhere.
    pub fn is_global(&self) -> bool {
        matches!(self, AdLevel::Global | AdLevel::Unspecified)
    }
}

/// Lifecycle status of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    PendingReview,
    Active,
    Paused,
    Completed,
    Rejected,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::PendingReview => "pending_review",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CampaignStatus::Draft),
            "pending_review" => Some(CampaignStatus::PendingReview),
            "active" => Some(CampaignStatus::Active),
            "paused" => Some(CampaignStatus::Paused),
            "completed" => Some(CampaignStatus::Completed),
            "rejected" => Some(CampaignStatus::Rejected),
            _ => None,
        }
    }
}

/// A single renderable creative of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdCreative {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
}

/// Canonical campaign shape shared by every fetch path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdCampaign {
    pub id: Uuid,
    pub advertiser_name: String,
    #[serde(default)]
    pub ad_level: AdLevel,
    #[serde(default)]
    pub target_countries: Vec<String>,
    #[serde(default)]
    pub target_cities: Vec<String>,
    #[serde(default)]
    pub is_demo: bool,
    #[serde(default = "default_status")]
    pub status: CampaignStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "ad_creatives", default)]
    pub creatives: Vec<AdCreative>,
}

fn default_status() -> CampaignStatus {
    CampaignStatus::Active
}

impl AdCampaign {
    /// A campaign without creatives cannot be rendered and is treated as absent.
    pub fn is_renderable(&self) -> bool {
        !self.creatives.is_empty()
    }
}

// ============================================================================
// Queries (GET /api/v1/ads/...)
// ============================================================================

/// Query parameters for slot campaigns and the resolved active pool.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SlotCampaignsQuery {
    #[validate(custom(function = "shared::validation::validate_country_code"))]
    pub country: Option<String>,

    #[validate(length(max = 120, message = "City must be at most 120 characters"))]
    pub city: Option<String>,

    #[validate(length(min = 2, max = 35, message = "Language must be 2-35 characters"))]
    pub language: Option<String>,

    pub device_type: Option<String>,

    /// Viewer's local calendar date, `YYYY-MM-DD`.
    pub today: Option<NaiveDate>,
}

/// Query parameters for enterprise campaigns.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct EnterpriseCampaignsQuery {
    #[validate(custom(function = "shared::validation::validate_country_code"))]
    pub country: Option<String>,

    #[validate(length(max = 120, message = "City must be at most 120 characters"))]
    pub city: Option<String>,

    pub today: Option<NaiveDate>,
}
