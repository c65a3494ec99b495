//! Business listing domain model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geo::Coordinates;
use uuid::Uuid;
use validator::Validate;

/// Moderation status of a listing that may be shown publicly.
pub const STATUS_APPROVED: &str = "approved";

/// Opening and closing time for a single day, as `HH:MM` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
}

impl DayHours {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: Some(open.into()),
            close: Some(close.into()),
        }
    }
}

/// Weekly schedule keyed by day name (Spanish or English, full or abbreviated)
/// or by weekday index (`"0"` = Sunday .. `"6"` = Saturday).
pub type OpeningHours = BTreeMap<String, DayHours>;

/// A business listing as served to the map and search surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BusinessRecord {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    pub updated_at: DateTime<Utc>,
    /// `None` marks an external (third-party) listing rather than a native one.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    /// Derived from the owner's profile, not stored on the listing.
    #[serde(default)]
    pub is_premium_owner: bool,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_visible() -> bool {
    true
}

fn default_status() -> String {
    STATUS_APPROVED.to_string()
}

impl BusinessRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// True when the coordinates are finite and inside WGS84 ranges.
    pub fn has_valid_coordinates(&self) -> bool {
        self.coordinates().is_valid()
    }

    /// Approved and visible listings may appear in public results.
    pub fn is_public(&self) -> bool {
        self.is_visible && self.status == STATUS_APPROVED
    }
}

/// A listing annotated with its distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NearbyBusiness {
    #[serde(flatten)]
    pub business: BusinessRecord,
    pub distance_m: f64,
}

impl NearbyBusiness {
    /// Keeps businesses within `radius_m` of `center` and sorts them nearest
    /// first. Records with unusable coordinates are skipped.
    pub fn rank(businesses: Vec<BusinessRecord>, center: &Coordinates, radius_m: f64) -> Vec<Self> {
        let mut nearby: Vec<Self> = businesses
            .into_iter()
            .filter(BusinessRecord::has_valid_coordinates)
            .filter_map(|business| {
                let distance_m = center.distance_to(&business.coordinates());
                (distance_m <= radius_m).then_some(Self {
                    business,
                    distance_m,
                })
            })
            .collect();
        nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        nearby
    }
}

// ============================================================================
// Queries (GET /api/v1/businesses, /api/v1/businesses/nearby)
// ============================================================================

/// Query parameters for listing public businesses.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ListBusinessesQuery {
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Subcategory must be 1-100 characters"))]
    pub subcategory: Option<String>,

    pub limit: Option<i64>,
}

/// Query parameters for the nearby search.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NearbyBusinessesQuery {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub lng: f64,

    #[validate(range(min = 50.0, max = 100000.0, message = "Radius must be between 50 and 100000 meters"))]
    pub radius_m: Option<f64>,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,

    pub limit: Option<i64>,
}

impl NearbyBusinessesQuery {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Query parameters for the open-status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenStatusQuery {
    /// Local wall-clock time, `YYYY-MM-DDTHH:MM`.
    pub at: Option<String>,
}
