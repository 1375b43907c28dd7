//! Redirect event recorded on every successful alias resolution.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single redirect, as captured at resolution time.
///
/// Events are never mutated after creation. Ownership moves into the
/// [`crate::application::services::RedirectBatcher`] buffer when recorded
/// and the event is consumed once its batch is flushed.
///
/// The alias is a logical reference to a [`super::ShortLink`]; the reference
/// is not enforced at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectEvent {
    pub alias: String,
    pub occurred_at: DateTime<Utc>,
    pub user_agent: String,
}

impl RedirectEvent {
    /// Creates an event stamped with the current time.
    ///
    /// A missing user agent is stored as an empty string.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = RedirectEvent::now("abc123", Some("Mozilla/5.0"));
    /// ```
    pub fn now(alias: impl Into<String>, user_agent: Option<&str>) -> Self {
        Self::at(alias, Utc::now(), user_agent)
    }

    /// Creates an event with an explicit timestamp.
    pub fn at(
        alias: impl Into<String>,
        occurred_at: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            alias: alias.into(),
            occurred_at,
            user_agent: user_agent.unwrap_or_default().to_string(),
        }
    }
}
