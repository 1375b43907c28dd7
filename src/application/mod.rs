//! Application layer services implementing the core logic.
//!
//! Services consume repository and cache traits, so they run unchanged against
//! PostgreSQL/Redis and against test doubles.
//!
//! # Available Services
//!
//! - [`services::alias_allocator::AliasAllocator`] - Alias allocation with collision retries
//! - [`services::resolver::CacheAsideResolver`] - Cache-aside alias resolution
//! - [`services::redirect_batcher::RedirectBatcher`] - Batched redirect event recording
//! - [`services::stats_service::StatsService`] - Redirect analytics
//! - [`services::shortener::Shortener`] - The three core components bundled together

pub mod services;
