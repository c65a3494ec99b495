//! Persistence layer for Geobooker.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Query and ad-delivery metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
