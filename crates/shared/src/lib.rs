//! Shared utilities and common types for the Geobooker backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Geographic coordinates and great-circle distance
//! - Common validation logic

pub mod geo;
pub mod validation;

pub use geo::{haversine_distance_m, BoundingBox, Coordinates, EARTH_RADIUS_METERS};
