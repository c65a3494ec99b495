//! Geographic coordinates and distance helpers.
//!
//! All coordinates are WGS84 decimal degrees.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for every distance computation, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Length of one degree of latitude on the reference sphere, in meters.
const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// Slack added to bounding boxes so the circle never touches the edges.
const BOUNDING_BOX_PADDING: f64 = 1.01;

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        haversine_distance_m(self, other)
    }

    /// Axis-aligned box that fully contains the circle of `radius_m` around this point.
    ///
    /// Longitude span is widened by `1 / cos(lat)`. Near the poles, or when
    /// the circle crosses the antimeridian, the box covers the full longitude
    /// range so points on the far side are not lost.
    pub fn bounding_box(&self, radius_m: f64) -> BoundingBox {
        let radius_m = radius_m * BOUNDING_BOX_PADDING;
        let lat_delta = radius_m / METERS_PER_DEGREE_LAT;
        let cos_lat = self.latitude.to_radians().cos().abs();
        let lng_delta = if cos_lat < 1e-6 {
            f64::INFINITY
        } else {
            radius_m / (METERS_PER_DEGREE_LAT * cos_lat)
        };

        let crosses_antimeridian = self.longitude - lng_delta < -180.0
            || self.longitude + lng_delta > 180.0;
        let (min_longitude, max_longitude) = if lng_delta >= 180.0 || crosses_antimeridian {
            (-180.0, 180.0)
        } else {
            (
                (self.longitude - lng_delta).max(-180.0),
                (self.longitude + lng_delta).min(180.0),
            )
        };

        BoundingBox {
            min_latitude: (self.latitude - lat_delta).max(-90.0),
            max_latitude: (self.latitude + lat_delta).min(90.0),
            min_longitude,
            max_longitude,
        }
    }
}

/// Rectangular coordinate range used to pre-filter spatial queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// Haversine distance between two points, in meters.
pub fn haversine_distance_m(a: &Coordinates, b: &Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point_is_zero() {
        let p = Coordinates::new(20.6597, -103.3496);
        assert_eq!(haversine_distance_m(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_known_pair() {
        // Guadalajara cathedral to Mexico City zocalo, roughly 460 km
        let gdl = Coordinates::new(20.6767, -103.3475);
        let cdmx = Coordinates::new(19.4326, -99.1332);
        let d = gdl.distance_to(&cdmx);
        assert!(d > 455_000.0 && d < 465_000.0, "distance was {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(40.4168, -3.7038);
        let b = Coordinates::new(41.3874, 2.1686);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_small_offset_about_one_km() {
        // 0.009 degrees of latitude is ~1000 m
        let a = Coordinates::new(20.0, -103.0);
        let b = Coordinates::new(20.009, -103.0);
        let d = a.distance_to(&b);
        assert!(d > 990.0 && d < 1010.0, "distance was {}", d);
    }

    #[test]
    fn test_is_valid() {
        assert!(Coordinates::new(0.0, 0.0).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).is_valid());
        assert!(!Coordinates::new(90.1, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center = Coordinates::new(20.6597, -103.3496);
        let bbox = center.bounding_box(5_000.0);
        assert!(bbox.min_latitude < center.latitude && bbox.max_latitude > center.latitude);
        assert!(bbox.min_longitude < center.longitude && bbox.max_longitude > center.longitude);

        let north_edge = Coordinates::new(bbox.max_latitude, center.longitude);
        assert!(center.distance_to(&north_edge) >= 4_990.0);
        let east_edge = Coordinates::new(center.latitude, bbox.max_longitude);
        assert!(center.distance_to(&east_edge) >= 4_990.0);
    }

    #[test]
    fn test_bounding_box_clamped_near_pole() {
        let bbox = Coordinates::new(89.9999, 10.0).bounding_box(50_000.0);
        assert_eq!(bbox.max_latitude, 90.0);
        assert_eq!(bbox.min_longitude, -180.0);
        assert_eq!(bbox.max_longitude, 180.0);
    }

    #[test]
    fn test_bounding_box_across_antimeridian() {
        // Suva, Fiji. A listing just west of the antimeridian is ~11 km away.
        let center = Coordinates::new(-18.1248, 179.9500);
        let across = Coordinates::new(-18.1248, -179.9500);
        assert!(center.distance_to(&across) < 12_000.0);

        let bbox = center.bounding_box(20_000.0);
        assert!((bbox.min_longitude..=bbox.max_longitude).contains(&across.longitude));
        assert!(bbox.max_latitude < -17.0);
    }

    #[test]
    fn test_deserialize_short_aliases() {
        let c: Coordinates = serde_json::from_str(r#"{"lat": 1.5, "lng": -2.5}"#).unwrap();
        assert_eq!(c, Coordinates::new(1.5, -2.5));
    }
}
