//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use domain::services::RotationConfig;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::geo_cache::CacheWritePolicy;

/// Client core settings. Every field except `api_base_url` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory for the geo-cache and flag files. `None` keeps both in memory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub cache_write_policy: CacheWritePolicy,

    #[serde(default)]
    pub rotation: RotationSettings,

    #[serde(default = "default_nearby_radius")]
    pub nearby_radius_m: f64,
}

/// Carousel rotation intervals in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    #[serde(default = "default_enterprise_interval")]
    pub enterprise_interval_ms: u64,

    #[serde(default = "default_local_interval")]
    pub local_interval_ms: u64,

    #[serde(default = "default_fallback_extra")]
    pub fallback_extra_ms: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            enterprise_interval_ms: default_enterprise_interval(),
            local_interval_ms: default_local_interval(),
            fallback_extra_ms: default_fallback_extra(),
        }
    }
}

impl From<RotationSettings> for RotationConfig {
    fn from(settings: RotationSettings) -> Self {
        RotationConfig {
            enterprise_interval: Duration::from_millis(settings.enterprise_interval_ms),
            local_interval: Duration::from_millis(settings.local_interval_ms),
            fallback_extra: Duration::from_millis(settings.fallback_extra_ms),
        }
    }
}

fn default_request_timeout() -> u64 {
    12
}
fn default_nearby_radius() -> f64 {
    5_000.0
}
fn default_enterprise_interval() -> u64 {
    8_000
}
fn default_local_interval() -> u64 {
    10_000
}
fn default_fallback_extra() -> u64 {
    2_000
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_secs: default_request_timeout(),
            cache_dir: None,
            cache_write_policy: CacheWritePolicy::default(),
            rotation: RotationSettings::default(),
            nearby_radius_m: default_nearby_radius(),
        }
    }

    /// Parses a JSON document, filling defaults.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if reqwest::Url::parse(&self.api_base_url).is_err() {
            return Err(ClientError::Config(format!(
                "api_base_url is not a valid URL: {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if !(self.nearby_radius_m.is_finite() && self.nearby_radius_m > 0.0) {
            return Err(ClientError::Config(
                "nearby_radius_m must be positive".to_string(),
            ));
        }
        if self.rotation.enterprise_interval_ms == 0 || self.rotation.local_interval_ms == 0 {
            return Err(ClientError::Config(
                "rotation intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rotation_config(&self) -> RotationConfig {
        self.rotation.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = ClientConfig::from_json(r#"{"api_base_url": "http://localhost:8080"}"#)
            .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
        assert_eq!(config.cache_write_policy, CacheWritePolicy::Upsert);
        assert!(config.cache_dir.is_none());
        assert_eq!(config.rotation_config(), RotationConfig::default());
    }

    #[test]
    fn test_replace_policy_and_rotation_override() {
        let config = ClientConfig::from_json(
            r#"{
                "api_base_url": "https://api.geobooker.example",
                "cache_write_policy": "replace",
                "rotation": { "enterprise_interval_ms": 5000 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.cache_write_policy, CacheWritePolicy::Replace);
        let rotation = config.rotation_config();
        assert_eq!(rotation.enterprise_interval, Duration::from_secs(5));
        assert_eq!(rotation.local_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = ClientConfig::from_json(r#"{"api_base_url": "not a url"}"#).unwrap_err();
        assert!(err.to_string().contains("api_base_url"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = ClientConfig::new("http://localhost:8080");
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
