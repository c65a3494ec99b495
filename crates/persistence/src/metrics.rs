//! Database and ad-delivery metrics.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Called periodically by the pool metrics job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Smart targeting failed and the slot fell back to the direct query.
pub fn record_campaign_fallback(slot: &str) {
    counter!("ad_campaign_fallback_total", "slot" => slot.to_string()).increment(1);
}

/// A campaign pool degraded to empty. `source` is `slot` or `enterprise`.
pub fn record_campaign_fetch_failure(source: &'static str) {
    counter!("ad_campaign_fetch_failures_total", "source" => source).increment(1);
}

pub fn record_impression() {
    counter!("ad_impressions_total").increment(1);
}

pub fn record_click() {
    counter!("ad_clicks_total").increment(1);
}

/// Times a database operation.
///
/// ```ignore
/// let timer = QueryTimer::new("find_public_business");
/// let result = sqlx::query_as::<_, BusinessEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("list_public_businesses");
        assert_eq!(timer.query_name, "list_public_businesses");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        QueryTimer::new("noop").record();
        record_campaign_fallback("home_banner");
        record_campaign_fetch_failure("enterprise");
        record_impression();
        record_click();
    }
}
