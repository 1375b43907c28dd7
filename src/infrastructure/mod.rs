//! Infrastructure layer for external integrations.
//!
//! - [`cache`] - Fast cache adapters (Redis and no-op)
//! - [`persistence`] - PostgreSQL durable store adapters

pub mod cache;
pub mod persistence;
