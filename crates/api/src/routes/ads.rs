//! Ad campaign endpoint handlers.
//!
//! Campaign reads and tracking writes never surface database failures:
//! a broken ad backend yields an empty pool or `recorded: false`.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, Local, NaiveDate};
use domain::models::analytics::{AnalyticsRangeQuery, TrackingEvent, TrackingResponse};
use domain::models::campaign::{EnterpriseCampaignsQuery, SlotCampaignsQuery};
use domain::models::{AdAnalyticsDay, AdAnalyticsReport, AdCampaign, DeviceType, UserGeoContext};
use domain::services::{resolve_active_pool, ActiveSlotResponse};
use persistence::repositories::{AdTrackingRepository, CampaignRepository};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Optional `today` override for tracking endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingQuery {
    pub today: Option<NaiveDate>,
}

fn server_today() -> NaiveDate {
    Local::now().date_naive()
}

fn campaign_repo(state: &AppState) -> CampaignRepository {
    CampaignRepository::new(state.pool.clone())
        .with_smart_targeting(state.config.ads.smart_targeting_enabled)
}

fn validate_slot(slot: &str) -> Result<(), ApiError> {
    shared::validation::validate_slot_name(slot).map_err(ApiError::from)
}

/// First language tag of an `Accept-Language` header, e.g. `es-MX` from
/// `es-MX,es;q=0.9`.
fn primary_language(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or(tag).trim())
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .map(str::to_string)
}

/// Builds the viewer context from explicit query values, falling back to
/// request headers for language and device class.
pub fn viewer_context(
    country: Option<String>,
    city: Option<String>,
    language: Option<String>,
    device_type: Option<&str>,
    headers: &HeaderMap,
) -> UserGeoContext {
    let device_type = match device_type {
        Some(value) => DeviceType::parse(value),
        None => headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(DeviceType::from_user_agent)
            .unwrap_or_default(),
    };

    UserGeoContext {
        country,
        city,
        language: language.or_else(|| primary_language(headers)),
        device_type,
        user_id: None,
    }
}

fn slot_context(query: SlotCampaignsQuery, headers: &HeaderMap) -> UserGeoContext {
    viewer_context(
        query.country,
        query.city,
        query.language,
        query.device_type.as_deref(),
        headers,
    )
}

/// Candidate campaigns for one ad slot.
///
/// GET /api/v1/ads/slots/:slot
pub async fn get_slot_campaigns(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Query(query): Query<SlotCampaignsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdCampaign>>, ApiError> {
    validate_slot(&slot)?;
    query.validate()?;

    let today = query.today.unwrap_or_else(server_today);
    let ctx = slot_context(query, &headers);
    let campaigns = campaign_repo(&state)
        .load_active_campaigns(&slot, &ctx, today)
        .await;

    debug!(slot = %slot, count = campaigns.len(), "Loaded slot campaigns");
    Ok(Json(campaigns))
}

/// Enterprise campaigns targeting the viewer, in display order.
///
/// GET /api/v1/ads/enterprise
pub async fn get_enterprise_campaigns(
    State(state): State<AppState>,
    Query(query): Query<EnterpriseCampaignsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdCampaign>>, ApiError> {
    query.validate()?;

    let today = query.today.unwrap_or_else(server_today);
    let ctx = viewer_context(query.country, query.city, None, None, &headers);
    let campaigns = campaign_repo(&state)
        .load_enterprise_campaigns(&ctx, today)
        .await;

    Ok(Json(campaigns))
}

/// The pool a slot should display right now: enterprise first, local as
/// fallback.
///
/// GET /api/v1/ads/slots/:slot/active
pub async fn get_active_slot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Query(query): Query<SlotCampaignsQuery>,
    headers: HeaderMap,
) -> Result<Json<ActiveSlotResponse>, ApiError> {
    validate_slot(&slot)?;
    query.validate()?;

    let today = query.today.unwrap_or_else(server_today);
    let ctx = slot_context(query, &headers);
    let repo = campaign_repo(&state);

    let (enterprise, local) = tokio::join!(
        repo.load_enterprise_campaigns(&ctx, today),
        repo.load_active_campaigns(&slot, &ctx, today),
    );
    let (slot_state, campaigns) =
        resolve_active_pool(Some(enterprise.as_slice()), Some(local.as_slice()));

    Ok(Json(ActiveSlotResponse {
        slot,
        state: slot_state,
        campaigns,
    }))
}

async fn track(
    state: &AppState,
    campaign_id: Uuid,
    event: TrackingEvent,
    today: Option<NaiveDate>,
) -> (StatusCode, Json<TrackingResponse>) {
    let today = today.unwrap_or_else(server_today);
    let recorded = AdTrackingRepository::new(state.pool.clone())
        .track(campaign_id, event, today)
        .await;
    (StatusCode::ACCEPTED, Json(TrackingResponse { recorded }))
}

/// Record one impression.
///
/// POST /api/v1/ads/campaigns/:id/impressions
pub async fn record_impression(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<TrackingQuery>,
) -> (StatusCode, Json<TrackingResponse>) {
    track(&state, campaign_id, TrackingEvent::Impression, query.today).await
}

/// Record one click.
///
/// POST /api/v1/ads/campaigns/:id/clicks
pub async fn record_click(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<TrackingQuery>,
) -> (StatusCode, Json<TrackingResponse>) {
    track(&state, campaign_id, TrackingEvent::Click, query.today).await
}

/// Resolves the inclusive report range. Defaults to the last
/// `default_days` days ending today.
pub fn analytics_range(
    query: &AnalyticsRangeQuery,
    today: NaiveDate,
    default_days: u32,
    max_days: u32,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .unwrap_or_else(|| to - Duration::days(i64::from(default_days.max(1)) - 1));

    if from > to {
        return Err(ApiError::Validation(
            "from must not be after to".to_string(),
        ));
    }
    let span = (to - from).num_days() + 1;
    if span > i64::from(max_days) {
        return Err(ApiError::Validation(format!(
            "Range must not exceed {} days",
            max_days
        )));
    }
    Ok((from, to))
}

/// Daily impressions, clicks and CTR for one campaign.
///
/// GET /api/v1/ads/campaigns/:id/analytics
pub async fn get_campaign_analytics(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<AnalyticsRangeQuery>,
) -> Result<Json<AdAnalyticsReport>, ApiError> {
    let (from, to) = analytics_range(
        &query,
        server_today(),
        state.config.ads.analytics_default_days,
        state.config.ads.analytics_max_days,
    )?;

    let repo = AdTrackingRepository::new(state.pool.clone());
    if !repo.campaign_exists(campaign_id).await? {
        return Err(ApiError::NotFound("Campaign not found".to_string()));
    }

    let days: Vec<AdAnalyticsDay> = repo
        .find_daily_range(campaign_id, from, to)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(AdAnalyticsReport::from_days(campaign_id, from, to, days)))
}
