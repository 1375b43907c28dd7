//! Wiring of the core from configuration.
//!
//! Opens the PostgreSQL pool (with retries), applies migrations, connects the
//! cache (or falls back to [`NullCache`]) and assembles an [`AppState`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, warn};

use crate::application::services::{
    AliasAllocator, CacheAsideResolver, RedirectBatcher, Shortener, StatsService,
};
use crate::config::Config;
use crate::domain::alias::RandomAliasGenerator;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{ConnectionGate, PgLinkRepository, PgRedirectRepository};
use crate::state::AppState;

/// Builds the whole core from configuration.
///
/// Must be called inside a tokio runtime; redirect flushes are spawned on it.
///
/// # Errors
///
/// Returns an error if the database stays unreachable after every retry or
/// migrations fail. An unreachable cache is not an error.
pub async fn build(config: &Config) -> Result<AppState> {
    let pool = Arc::new(connect_pool(config).await?);

    sqlx::migrate!("./migrations")
        .run(pool.as_ref())
        .await
        .context("Failed to apply migrations")?;
    info!("Migrations applied");

    let cache = connect_cache(config).await;
    let gate = ConnectionGate::new(config.store_max_concurrency);

    let link_repository = Arc::new(PgLinkRepository::new(Arc::clone(&pool), gate.clone()));
    let redirect_repository = Arc::new(PgRedirectRepository::new(Arc::clone(&pool), gate.clone()));

    let allocator = AliasAllocator::new(
        Arc::clone(&link_repository),
        Arc::new(RandomAliasGenerator::from_clock()),
    )
    .with_policy(config.alias_length, config.alias_max_attempts);

    let resolver = CacheAsideResolver::new(link_repository, Arc::clone(&cache))
        .with_cache_ttl(config.cache_ttl_seconds);

    let batcher = RedirectBatcher::new(
        Arc::clone(&redirect_repository),
        config.redirect_batch_size,
        config.flush_concurrency,
    );

    Ok(AppState {
        core: Arc::new(Shortener::new(allocator, resolver, batcher)),
        stats: Arc::new(StatsService::new(redirect_repository)),
        cache,
        pool,
        gate,
    })
}

/// Connects to PostgreSQL, retrying with jittered exponential backoff.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime));

    // 200ms, 400ms, 800ms ... capped at 10s.
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(config.db_connect_retries);

    let url = config.database_url.as_str();
    let mut attempt = 0u32;

    let pool = Retry::spawn(strategy, || {
        attempt += 1;
        let options = options.clone();
        async move {
            options.connect(url).await.inspect_err(|e| {
                warn!(attempt, error = %e, "Database connection attempt failed");
            })
        }
    })
    .await
    .context("Failed to connect to database")?;

    info!("Connected to database");
    Ok(pool)
}

/// Connects the configured cache; any failure degrades to [`NullCache`].
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to Redis, using NullCache");
            Arc::new(NullCache::new())
        }
    }
}
