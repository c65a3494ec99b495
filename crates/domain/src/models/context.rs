//! Per-request viewer context used for targeting and gating.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Device class of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    #[default]
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
        }
    }

    /// Parses `"mobile"` / `"desktop"`; anything else falls back to desktop.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mobile" | "tablet" => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        }
    }

    /// Classifies a `User-Agent` header.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ["mobile", "android", "iphone", "ipad"]
            .iter()
            .any(|marker| ua.contains(marker))
        {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }
}

/// Viewer context supplied with every campaign fetch and cache check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserGeoContext {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl UserGeoContext {
    /// Uppercased country code, if any non-blank value is set.
    pub fn country_code(&self) -> Option<String> {
        non_blank(self.country.as_deref()).map(str::to_ascii_uppercase)
    }

    /// Trimmed city name, if any non-blank value is set.
    pub fn city_name(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }

    /// Guests have no user identifier.
    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
