//! Cache service trait and error types.

use async_trait::async_trait;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Best-effort alias → URL cache.
///
/// Implementations must be safe to call concurrently. The cache is never the
/// source of truth: callers treat a read error as a miss and ignore write
/// errors after logging them.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the original URL for an alias.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend cannot be reached.
    async fn get_url(&self, alias: &str) -> CacheResult<Option<String>>;

    /// Stores an alias mapping with an optional TTL in seconds
    /// (implementation default if `None`).
    async fn set_url(&self, alias: &str, original_url: &str, ttl_seconds: Option<u64>)
    -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
