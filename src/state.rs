//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::application::services::{Shortener, StatsService};
use crate::domain::alias::RandomAliasGenerator;
use crate::domain::entities::{NewShortLink, RedirectEvent, ShortLink};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::persistence::{ConnectionGate, PgLinkRepository, PgRedirectRepository};

/// The core wired to PostgreSQL and the configured cache.
pub type PgShortener = Shortener<PgLinkRepository, PgRedirectRepository, RandomAliasGenerator>;

/// Connectivity of the external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub database: bool,
    pub cache: bool,
}

/// Shared state built once by [`crate::bootstrap::build`].
///
/// Cheap to clone; every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<PgShortener>,
    pub stats: Arc<StatsService<PgRedirectRepository>>,
    pub cache: Arc<dyn CacheService>,
    pub pool: Arc<PgPool>,
    pub gate: ConnectionGate,
}

impl AppState {
    pub async fn allocate(&self, request: NewShortLink) -> Result<ShortLink, AppError> {
        self.core.allocate(request).await
    }

    pub async fn resolve(&self, alias: &str) -> Result<String, AppError> {
        self.core.resolve(alias).await
    }

    pub fn record(&self, event: RedirectEvent) -> bool {
        self.core.record(event)
    }

    /// Resolves an alias and records the redirect.
    pub async fn redirect(&self, alias: &str, user_agent: Option<&str>) -> Result<String, AppError> {
        self.core.redirect(alias, user_agent).await
    }

    pub async fn check_health(&self) -> HealthReport {
        let database = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok();

        HealthReport {
            database,
            cache: self.cache.health_check().await,
        }
    }

    /// Drains buffered redirects, waits for earlier flushes and in-flight
    /// store operations, then closes the pool.
    ///
    /// Returns the number of redirect events drained from the buffer.
    pub async fn shutdown(&self) -> usize {
        let drained = self.core.drain().await;
        self.gate.close().await;
        self.pool.close().await;
        info!(drained, "Shutdown complete");
        drained
    }
}
