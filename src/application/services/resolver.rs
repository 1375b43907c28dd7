//! Cache-aside alias resolution.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error};

use crate::domain::repositories::LinkRepository;
use crate::error::{AppError, BestEffortFailure, best_effort};
use crate::infrastructure::cache::CacheService;

/// Resolves aliases through the fast cache, falling back to the durable store.
///
/// # Cache Strategy
///
/// - **Cache hit**: Return immediately, the store is not consulted
/// - **Cache miss**: Query the store, then repopulate the cache
/// - **Cache error**: Log it and treat it as a miss
///
/// Cache writes are best effort: a failed write is logged and counted but the
/// caller still gets the URL read from the store.
pub struct CacheAsideResolver<L: LinkRepository> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    cache_ttl_seconds: Option<u64>,
}

impl<L: LinkRepository> CacheAsideResolver<L> {
    /// Creates a resolver that writes cache entries with the cache's default TTL.
    pub fn new(link_repository: Arc<L>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            link_repository,
            cache,
            cache_ttl_seconds: None,
        }
    }

    /// Overrides the TTL applied to repopulated cache entries.
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.cache_ttl_seconds = Some(ttl_seconds);
        self
    }

    /// Returns the original URL for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the alias is empty.
    /// Returns [`AppError::NotFound`] if the store has no such alias.
    /// Returns [`AppError::StorageUnavailable`] if the store read fails.
    pub async fn resolve(&self, alias: &str) -> Result<String, AppError> {
        if alias.is_empty() {
            return Err(AppError::invalid_input(
                "Alias must not be empty",
                json!({ "alias": alias }),
            ));
        }

        match self.cache.get_url(alias).await {
            Ok(Some(url)) if !url.is_empty() => {
                metrics::counter!("shortener_cache_hits_total").increment(1);
                return Ok(url);
            }
            Ok(_) => {
                metrics::counter!("shortener_cache_misses_total").increment(1);
            }
            Err(e) => best_effort(BestEffortFailure::CacheRead, &e),
        }

        let link = self
            .link_repository
            .find_by_alias(alias)
            .await
            .map_err(|e| {
                error!(alias, error = %e, "Failed to read short link");
                AppError::from(e)
            })?
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "alias": alias }))
            })?;

        if let Err(e) = self
            .cache
            .set_url(alias, &link.original, self.cache_ttl_seconds)
            .await
        {
            best_effort(BestEffortFailure::CacheWrite, &e);
        } else {
            debug!(alias, "Cache repopulated");
        }

        Ok(link.original)
    }
}
