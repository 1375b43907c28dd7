//! Redirect analytics service.

use std::sync::Arc;

use crate::domain::entities::RedirectEvent;
use crate::domain::repositories::{AggregatedView, RedirectFilter, RedirectRepository};
use crate::error::AppError;
use serde_json::json;

/// Read-only access to the redirect event log.
///
/// Provides the full event list for an alias and a filtered, paginated view
/// with a total count.
pub struct StatsService<R: RedirectRepository> {
    repository: Arc<R>,
}

impl<R: RedirectRepository> StatsService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Lists every recorded redirect for an alias, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the alias is empty.
    /// Returns [`AppError::NotFound`] if the alias has no recorded redirects.
    /// Returns [`AppError::StorageUnavailable`] on store errors.
    pub async fn redirects(&self, alias: &str) -> Result<Vec<RedirectEvent>, AppError> {
        if alias.is_empty() {
            return Err(AppError::invalid_input(
                "Alias must not be empty",
                json!({ "alias": alias }),
            ));
        }

        let events = self.repository.list_by_alias(alias).await?;
        if events.is_empty() {
            return Err(AppError::not_found(
                "No redirects found",
                json!({ "alias": alias }),
            ));
        }

        Ok(events)
    }

    /// Retrieves the filtered total and one page of redirects for an alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the alias is empty or the date range is inverted.
    /// Returns [`AppError::NotFound`] if no redirect matches the filter.
    /// Returns [`AppError::StorageUnavailable`] on store errors.
    pub async fn aggregated(&self, filter: RedirectFilter) -> Result<AggregatedView, AppError> {
        if filter.alias.is_empty() {
            return Err(AppError::invalid_input(
                "Alias must not be empty",
                json!({ "alias": filter.alias }),
            ));
        }

        if let (Some(from), Some(to)) = (filter.from_date, filter.to_date)
            && from > to
        {
            return Err(AppError::invalid_input(
                "Start of the date range is after its end",
                json!({ "from": from, "to": to }),
            ));
        }

        let alias = filter.alias.clone();
        let view = self.repository.aggregate(filter).await?;

        if view.total == 0 {
            return Err(AppError::not_found(
                "No redirects found",
                json!({ "alias": alias }),
            ));
        }

        Ok(view)
    }
}
