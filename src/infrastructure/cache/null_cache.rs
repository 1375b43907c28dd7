//! No-op cache implementation for disabled caching.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Used when Redis is not configured or unreachable at startup. Every lookup
/// is a miss, so every resolution goes to the durable store.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _alias: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(
        &self,
        _alias: &str,
        _original_url: &str,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
