//! The alias and redirect core as one unit.

use crate::application::services::{AliasAllocator, CacheAsideResolver, RedirectBatcher};
use crate::domain::alias::AliasGenerator;
use crate::domain::entities::{NewShortLink, RedirectEvent, ShortLink};
use crate::domain::repositories::{LinkRepository, RedirectRepository};
use crate::error::AppError;

/// Bundles the allocator, resolver and batcher behind one API.
///
/// Generic over its collaborators so the same core runs against PostgreSQL
/// in production and in-memory fakes in tests.
pub struct Shortener<L, R, G>
where
    L: LinkRepository,
    R: RedirectRepository + 'static,
    G: AliasGenerator,
{
    allocator: AliasAllocator<L, G>,
    resolver: CacheAsideResolver<L>,
    batcher: RedirectBatcher<R>,
}

impl<L, R, G> Shortener<L, R, G>
where
    L: LinkRepository,
    R: RedirectRepository + 'static,
    G: AliasGenerator,
{
    pub fn new(
        allocator: AliasAllocator<L, G>,
        resolver: CacheAsideResolver<L>,
        batcher: RedirectBatcher<R>,
    ) -> Self {
        Self {
            allocator,
            resolver,
            batcher,
        }
    }

    /// See [`AliasAllocator::allocate`].
    pub async fn allocate(&self, request: NewShortLink) -> Result<ShortLink, AppError> {
        self.allocator.allocate(request).await
    }

    /// See [`CacheAsideResolver::resolve`].
    pub async fn resolve(&self, alias: &str) -> Result<String, AppError> {
        self.resolver.resolve(alias).await
    }

    /// See [`RedirectBatcher::record`].
    pub fn record(&self, event: RedirectEvent) -> bool {
        self.batcher.record(event)
    }

    /// Resolves an alias and, on success, records one redirect event for it.
    ///
    /// Failed resolutions record nothing.
    pub async fn redirect(&self, alias: &str, user_agent: Option<&str>) -> Result<String, AppError> {
        let original = self.resolver.resolve(alias).await?;
        self.batcher.record(RedirectEvent::now(alias, user_agent));
        Ok(original)
    }

    pub fn batcher(&self) -> &RedirectBatcher<R> {
        &self.batcher
    }

    /// Drains buffered redirect events. Returns how many were drained.
    pub async fn shutdown(&self) -> usize {
        self.batcher.shutdown().await
    }

    /// Drains buffered redirect events, then waits for every flush started by
    /// earlier fills. After this returns the store can be closed without
    /// losing a sealed batch.
    pub async fn drain(&self) -> usize {
        let drained = self.batcher.shutdown().await;
        self.batcher.wait_flushes().await;
        drained
    }
}
