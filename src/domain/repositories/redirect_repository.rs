//! Repository trait for the redirect event log.

use crate::domain::entities::RedirectEvent;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of events returned per analytics page.
pub const PAGE_SIZE: i64 = 20;

/// Filter criteria for aggregated redirect queries.
///
/// Supports date range filtering, a user-agent substring match and
/// 1-indexed pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectFilter {
    pub alias: String,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub user_agent: Option<String>,
    pub page: i64,
}

impl RedirectFilter {
    /// Creates a filter for the first page of an alias's events.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            from_date: None,
            to_date: None,
            user_agent: None,
            page: 1,
        }
    }

    /// Adds date range filtering to the query.
    pub fn with_date_range(
        mut self,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from_date;
        self.to_date = to_date;
        self
    }

    /// Keeps only events whose user agent contains `needle`. Empty means no filter.
    pub fn with_user_agent(mut self, needle: Option<String>) -> Self {
        self.user_agent = needle.filter(|n| !n.is_empty());
        self
    }

    /// Selects a page; page 0 is treated as page 1.
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page.max(1);
        self
    }

    /// Rows to skip for the selected page, saturating for absurd page numbers.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(PAGE_SIZE)
    }
}

/// Total count plus one page of events for an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedView {
    pub alias: String,
    pub total: i64,
    pub items: Vec<RedirectEvent>,
}

/// Append-only redirect event log.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRedirectRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectRepository: Send + Sync {
    /// Persists a whole batch with a single write, preserving its order.
    ///
    /// Returns the number of rows written.
    async fn insert_batch(&self, events: Vec<RedirectEvent>) -> Result<u64, StoreError>;

    /// Lists every event for an alias, oldest first.
    async fn list_by_alias(&self, alias: &str) -> Result<Vec<RedirectEvent>, StoreError>;

    /// Counts matching events and returns the requested page, oldest first.
    async fn aggregate(&self, filter: RedirectFilter) -> Result<AggregatedView, StoreError>;
}
