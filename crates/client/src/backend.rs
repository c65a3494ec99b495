//! Backend seams and the HTTP implementation against the Geobooker API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::models::analytics::{TrackingEvent, TrackingResponse};
use domain::models::{AdCampaign, BusinessRecord, NearbyBusiness, UserGeoContext};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use shared::geo::Coordinates;
use tracing::debug;
use uuid::Uuid;

use crate::error::ClientError;

/// Where campaign pools come from.
#[async_trait]
pub trait CampaignSource: Send + Sync {
    async fn slot_campaigns(
        &self,
        slot: &str,
        ctx: &UserGeoContext,
        today: NaiveDate,
    ) -> Result<Vec<AdCampaign>, ClientError>;

    async fn enterprise_campaigns(
        &self,
        ctx: &UserGeoContext,
        today: NaiveDate,
    ) -> Result<Vec<AdCampaign>, ClientError>;
}

/// Where impressions and clicks are recorded.
#[async_trait]
pub trait TrackingSink: Send + Sync {
    /// Returns whether the backend stored the event.
    async fn record(
        &self,
        campaign_id: Uuid,
        event: TrackingEvent,
        today: NaiveDate,
    ) -> Result<bool, ClientError>;
}

/// Where nearby businesses come from on a cache miss.
#[async_trait]
pub trait BusinessSource: Send + Sync {
    async fn nearby_businesses(
        &self,
        center: Coordinates,
        radius_m: f64,
        category: Option<&str>,
    ) -> Result<Vec<BusinessRecord>, ClientError>;
}

/// `reqwest` client for the `/api/v1` surface.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

type Params = Vec<(&'static str, String)>;

fn context_params(ctx: &UserGeoContext, today: NaiveDate) -> Params {
    let mut params: Params = vec![("today", today.to_string())];
    if let Some(country) = ctx.country_code() {
        params.push(("country", country));
    }
    if let Some(city) = ctx.city_name() {
        params.push(("city", city.to_string()));
    }
    params
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid api_base_url: {e}")))?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geobooker-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid path {path}: {e}")))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ClientError::Http(e)
        }
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T, ClientError> {
        debug!(path = %path, "GET");
        let response = self
            .http
            .get(self.url(path)?)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T, ClientError> {
        debug!(path = %path, "POST");
        let response = self
            .http
            .post(self.url(path)?)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(path, response).await
    }
}

#[async_trait]
impl CampaignSource for ApiClient {
    async fn slot_campaigns(
        &self,
        slot: &str,
        ctx: &UserGeoContext,
        today: NaiveDate,
    ) -> Result<Vec<AdCampaign>, ClientError> {
        let mut params = context_params(ctx, today);
        if let Some(language) = &ctx.language {
            params.push(("language", language.clone()));
        }
        params.push(("device_type", ctx.device_type.as_str().to_string()));
        self.get_json(&format!("api/v1/ads/slots/{slot}"), &params).await
    }

    async fn enterprise_campaigns(
        &self,
        ctx: &UserGeoContext,
        today: NaiveDate,
    ) -> Result<Vec<AdCampaign>, ClientError> {
        self.get_json("api/v1/ads/enterprise", &context_params(ctx, today))
            .await
    }
}

#[async_trait]
impl TrackingSink for ApiClient {
    async fn record(
        &self,
        campaign_id: Uuid,
        event: TrackingEvent,
        today: NaiveDate,
    ) -> Result<bool, ClientError> {
        let segment = match event {
            TrackingEvent::Impression => "impressions",
            TrackingEvent::Click => "clicks",
        };
        let response: TrackingResponse = self
            .post_json(
                &format!("api/v1/ads/campaigns/{campaign_id}/{segment}"),
                &vec![("today", today.to_string())],
            )
            .await?;
        Ok(response.recorded)
    }
}

#[async_trait]
impl BusinessSource for ApiClient {
    async fn nearby_businesses(
        &self,
        center: Coordinates,
        radius_m: f64,
        category: Option<&str>,
    ) -> Result<Vec<BusinessRecord>, ClientError> {
        let mut params: Params = vec![
            ("lat", center.latitude.to_string()),
            ("lng", center.longitude.to_string()),
            ("radius_m", radius_m.to_string()),
        ];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        let nearby: Vec<NearbyBusiness> =
            self.get_json("api/v1/businesses/nearby", &params).await?;
        Ok(nearby.into_iter().map(|n| n.business).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_join_keeps_prefix() {
        let client =
            ApiClient::new("https://geobooker.example/backend/", Duration::from_secs(12)).unwrap();
        let url = client.url("api/v1/ads/enterprise").unwrap();
        assert_eq!(url.as_str(), "https://geobooker.example/backend/api/v1/ads/enterprise");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("::nope", Duration::from_secs(1)),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_context_params_skip_blank_fields() {
        let ctx = UserGeoContext {
            country: Some("mx".to_string()),
            city: Some("   ".to_string()),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let params = context_params(&ctx, today);
        assert!(params.contains(&("country", "MX".to_string())));
        assert!(params.contains(&("today", "2026-10-18".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "city"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let client = ApiClient::new("http://127.0.0.1:1/", Duration::from_secs(2)).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let result = client
            .enterprise_campaigns(&UserGeoContext::default(), today)
            .await;
        assert!(result.is_err());
    }
}
