//! Business entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{BusinessRecord, DayHours, OpeningHours};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `businesses` joined with the owner's premium flag.
#[derive(Debug, Clone, FromRow)]
pub struct BusinessEntity {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub opening_hours: Option<serde_json::Value>,
    pub owner_id: Option<Uuid>,
    pub is_premium_owner: bool,
    pub status: String,
    pub is_visible: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<BusinessEntity> for BusinessRecord {
    fn from(entity: BusinessEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            category: entity.category,
            subcategory: entity.subcategory,
            address: entity.address,
            latitude: entity.latitude,
            longitude: entity.longitude,
            phone: entity.phone,
            rating: entity.rating,
            updated_at: entity.updated_at,
            owner_id: entity.owner_id,
            is_premium_owner: entity.is_premium_owner,
            opening_hours: entity.opening_hours.and_then(parse_opening_hours),
            is_visible: entity.is_visible,
            status: entity.status,
        }
    }
}

/// Decodes the `opening_hours` JSON object day by day.
///
/// Days whose value isn't an `{open, close}` object are dropped so one bad
/// entry doesn't hide the rest of the week.
fn parse_opening_hours(value: serde_json::Value) -> Option<OpeningHours> {
    let serde_json::Value::Object(days) = value else {
        return None;
    };
    let hours: OpeningHours = days
        .into_iter()
        .filter_map(|(day, entry)| {
            serde_json::from_value::<DayHours>(entry)
                .ok()
                .map(|hours| (day, hours))
        })
        .collect();
    (!hours.is_empty()).then_some(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(opening_hours: Option<serde_json::Value>) -> BusinessEntity {
        BusinessEntity {
            id: Uuid::new_v4(),
            name: "Tacos El Güero".to_string(),
            category: "restaurantes".to_string(),
            subcategory: Some("tacos".to_string()),
            address: Some("Av. Juárez 100".to_string()),
            latitude: 20.6767,
            longitude: -103.3475,
            phone: None,
            rating: Some(4.6),
            opening_hours,
            owner_id: Some(Uuid::new_v4()),
            is_premium_owner: true,
            status: "approved".to_string(),
            is_visible: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_business_entity_to_domain() {
        let e = entity(Some(json!({"lunes": {"open": "09:00", "close": "18:00"}})));
        let record: BusinessRecord = e.clone().into();
        assert_eq!(record.id, e.id);
        assert!(record.is_premium_owner);
        assert!(record.owner_id.is_some());
        let hours = record.opening_hours.unwrap();
        assert_eq!(hours["lunes"].open.as_deref(), Some("09:00"));
    }

    #[test]
    fn test_malformed_days_are_dropped() {
        let e = entity(Some(json!({
            "lunes": {"open": "09:00", "close": "18:00"},
            "martes": "cerrado",
            "miercoles": {"open": 9, "close": 18}
        })));
        let record: BusinessRecord = e.into();
        let hours = record.opening_hours.unwrap();
        assert_eq!(hours.len(), 1);
        assert!(hours.contains_key("lunes"));
    }

    #[test]
    fn test_non_object_hours_are_absent() {
        let record: BusinessRecord = entity(Some(json!("24/7"))).into();
        assert!(record.opening_hours.is_none());
        let record: BusinessRecord = entity(None).into();
        assert!(record.opening_hours.is_none());
    }
}
