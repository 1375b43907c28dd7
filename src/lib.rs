//! # Shortener
//!
//! The alias and redirect core of a URL shortener, backed by PostgreSQL with
//! an optional Redis cache.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Entities, alias generation and repository traits
//! - **Application Layer** ([`application`]) - Allocator, resolver, redirect batcher, analytics
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL and Redis adapters
//!
//! ## Flow
//!
//! - Create: [`AliasAllocator`](application::services::AliasAllocator) commits to the store,
//!   regenerating synthesized aliases on collision
//! - Resolve: [`CacheAsideResolver`](application::services::CacheAsideResolver) reads the
//!   cache, falls back to the store and repopulates the cache
//! - Record: [`RedirectBatcher`](application::services::RedirectBatcher) buffers redirect
//!   events and writes them in batches, draining the remainder on shutdown
//!
//! ## Configuration
//!
//! Loaded from environment variables via [`config::Config`]; [`bootstrap::build`] turns it
//! into an [`AppState`].

pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        AliasAllocator, CacheAsideResolver, RedirectBatcher, Shortener, StatsService,
    };
    pub use crate::domain::alias::{AliasGenerator, RandomAliasGenerator};
    pub use crate::domain::entities::{NewShortLink, RedirectEvent, ShortLink};
    pub use crate::domain::repositories::{
        AggregatedView, LinkRepository, RedirectFilter, RedirectRepository,
    };
    pub use crate::error::{AppError, StoreError};
    pub use crate::infrastructure::cache::{CacheError, CacheResult, CacheService, NullCache};
    pub use crate::state::AppState;
}
