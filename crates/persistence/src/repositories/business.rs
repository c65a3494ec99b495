//! Business repository for database operations.

use shared::geo::{BoundingBox, Coordinates};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::BusinessEntity;
use crate::metrics::QueryTimer;

const BUSINESS_COLUMNS: &str = r#"
    b.id, b.name, b.category, b.subcategory, b.address, b.latitude, b.longitude,
    b.phone, b.rating, b.opening_hours, b.owner_id,
    COALESCE(p.is_premium, false) AS is_premium_owner,
    b.status, b.is_visible, b.updated_at
"#;

/// Repository for public business listings.
///
/// Every query is restricted to approved, visible listings.
#[derive(Clone)]
pub struct BusinessRepository {
    pool: PgPool,
}

impl BusinessRepository {
    /// Creates a new BusinessRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// List public businesses, optionally by exact category and subcategory.
    ///
    /// Premium owners come first, then by rating.
    pub async fn list_public(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BusinessEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_public_businesses");
        let sql = format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            LEFT JOIN user_profiles p ON p.id = b.owner_id
            WHERE b.status = 'approved' AND b.is_visible = true
              AND ($1::text IS NULL OR b.category = $1)
              AND ($2::text IS NULL OR b.subcategory = $2)
            ORDER BY is_premium_owner DESC, b.rating DESC NULLS LAST, b.name ASC
            LIMIT $3
            "#
        );
        let result = sqlx::query_as::<_, BusinessEntity>(&sql)
            .bind(category)
            .bind(subcategory)
            .bind(limit)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a public business by id.
    pub async fn find_public_by_id(&self, id: Uuid) -> Result<Option<BusinessEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_public_business");
        let sql = format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            LEFT JOIN user_profiles p ON p.id = b.owner_id
            WHERE b.id = $1 AND b.status = 'approved' AND b.is_visible = true
            "#
        );
        let result = sqlx::query_as::<_, BusinessEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Candidate businesses inside a bounding box, roughly nearest to
    /// `center` first so `limit` cuts off the farthest rows.
    ///
    /// Callers still filter by exact distance; the box only narrows the scan.
    pub async fn find_public_in_bounding_box(
        &self,
        center: &Coordinates,
        bbox: &BoundingBox,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BusinessEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_public_businesses_in_bbox");
        let sql = format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            LEFT JOIN user_profiles p ON p.id = b.owner_id
            WHERE b.status = 'approved' AND b.is_visible = true
              AND b.latitude BETWEEN $1 AND $2
              AND b.longitude BETWEEN $3 AND $4
              AND ($5::text IS NULL OR b.category = $5)
            ORDER BY (b.latitude - $6) ^ 2
                   + (least(abs(b.longitude - $7), 360 - abs(b.longitude - $7))
                      * cos(radians($6))) ^ 2
            LIMIT $8
            "#
        );
        let result = sqlx::query_as::<_, BusinessEntity>(&sql)
            .bind(bbox.min_latitude)
            .bind(bbox.max_latitude)
            .bind(bbox.min_longitude)
            .bind(bbox.max_longitude)
            .bind(category)
            .bind(center.latitude)
            .bind(center.longitude)
            .bind(limit)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }
}
