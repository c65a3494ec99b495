use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, security_headers_middleware, trace_id};
use crate::routes::{ads, businesses, health};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);
    let state = AppState {
        pool,
        config: config.clone(),
    };

    let ad_routes = Router::new()
        .route("/api/v1/ads/enterprise", get(ads::get_enterprise_campaigns))
        .route("/api/v1/ads/slots/:slot", get(ads::get_slot_campaigns))
        .route("/api/v1/ads/slots/:slot/active", get(ads::get_active_slot))
        .route(
            "/api/v1/ads/campaigns/:id/impressions",
            post(ads::record_impression),
        )
        .route("/api/v1/ads/campaigns/:id/clicks", post(ads::record_click))
        .route(
            "/api/v1/ads/campaigns/:id/analytics",
            get(ads::get_campaign_analytics),
        );

    let business_routes = Router::new()
        .route("/api/v1/businesses", get(businesses::list_businesses))
        .route("/api/v1/businesses/nearby", get(businesses::nearby_businesses))
        .route("/api/v1/businesses/:id", get(businesses::get_business))
        .route(
            "/api/v1/businesses/:id/open-status",
            get(businesses::get_open_status),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Bottom layers run first.
    Router::new()
        .merge(public_routes)
        .merge(ad_routes)
        .merge(business_routes)
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
