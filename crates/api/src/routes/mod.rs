//! HTTP route handlers.

pub mod ads;
pub mod businesses;
pub mod health;
