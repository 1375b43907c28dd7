//! Repository trait for short link data access.

use crate::domain::entities::ShortLink;
use crate::error::StoreError;
use async_trait::async_trait;

/// Authoritative alias → URL storage.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Stores a new short link and returns the committed row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the alias already exists.
    /// Returns [`StoreError::Unavailable`] or [`StoreError::Closed`] otherwise.
    async fn create(&self, link: ShortLink) -> Result<ShortLink, StoreError>;

    /// Finds a short link by alias.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ShortLink))` if found
    /// - `Ok(None)` if not found
    async fn find_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, StoreError>;
}
