//! Business directory endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDateTime;
use domain::models::business::{ListBusinessesQuery, NearbyBusinessesQuery, OpenStatusQuery};
use domain::models::{BusinessRecord, NearbyBusiness};
use domain::services::{evaluate_open_status, evaluate_open_status_now, OpenStatus};
use persistence::repositories::BusinessRepository;
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// List public businesses.
///
/// GET /api/v1/businesses
pub async fn list_businesses(
    State(state): State<AppState>,
    Query(query): Query<ListBusinessesQuery>,
) -> Result<Json<Vec<BusinessRecord>>, ApiError> {
    query.validate()?;

    let limit = state.config.businesses.list_limit(query.limit);
    let entities = BusinessRepository::new(state.pool.clone())
        .list_public(query.category.as_deref(), query.subcategory.as_deref(), limit)
        .await?;

    let total = entities.len();
    let businesses: Vec<BusinessRecord> = entities
        .into_iter()
        .map(BusinessRecord::from)
        .filter(BusinessRecord::has_valid_coordinates)
        .collect();
    if businesses.len() < total {
        warn!(
            dropped = total - businesses.len(),
            "Dropped businesses with invalid coordinates"
        );
    }

    Ok(Json(businesses))
}

/// Public businesses around a point, nearest first.
///
/// GET /api/v1/businesses/nearby
pub async fn nearby_businesses(
    State(state): State<AppState>,
    Query(query): Query<NearbyBusinessesQuery>,
) -> Result<Json<Vec<NearbyBusiness>>, ApiError> {
    query.validate()?;

    let config = &state.config.businesses;
    let center = query.center();
    let radius_m = config.nearby_radius(query.radius_m);
    let limit = config.list_limit(query.limit);

    let candidates = BusinessRepository::new(state.pool.clone())
        .find_public_in_bounding_box(
            &center,
            &center.bounding_box(radius_m),
            query.category.as_deref(),
            config.nearby_max_candidates,
        )
        .await?;

    let candidate_count = candidates.len();
    let mut nearby = NearbyBusiness::rank(
        candidates.into_iter().map(BusinessRecord::from).collect(),
        &center,
        radius_m,
    );
    nearby.truncate(usize::try_from(limit).unwrap_or(0));

    debug!(
        candidates = candidate_count,
        returned = nearby.len(),
        radius_m,
        "Nearby business search"
    );
    Ok(Json(nearby))
}

async fn find_business(state: &AppState, id: Uuid) -> Result<BusinessRecord, ApiError> {
    BusinessRepository::new(state.pool.clone())
        .find_public_by_id(id)
        .await?
        .map(BusinessRecord::from)
        .ok_or_else(|| ApiError::NotFound("Business not found".to_string()))
}

/// Fetch one public business.
///
/// GET /api/v1/businesses/:id
pub async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BusinessRecord>, ApiError> {
    find_business(&state, id).await.map(Json)
}

/// Parses `YYYY-MM-DDTHH:MM` with optional seconds.
pub fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Whether a business is open at `at` (local time), or now.
///
/// GET /api/v1/businesses/:id/open-status
pub async fn get_open_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OpenStatusQuery>,
) -> Result<Json<OpenStatus>, ApiError> {
    let at = match query.at.as_deref() {
        Some(raw) => Some(parse_local_datetime(raw).ok_or_else(|| {
            ApiError::Validation("at must be YYYY-MM-DDTHH:MM[:SS]".to_string())
        })?),
        None => None,
    };

    let business = find_business(&state, id).await?;
    let hours = business.opening_hours.as_ref();
    let status = match at {
        Some(at) => evaluate_open_status(hours, at),
        None => evaluate_open_status_now(hours),
    };
    Ok(Json(status))
}
