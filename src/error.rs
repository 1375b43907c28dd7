//! Error taxonomy for the alias and redirect core.
//!
//! [`AppError`] is what callers of the allocator, resolver and analytics
//! services see. [`StoreError`] is the narrower vocabulary spoken by the
//! durable store adapters. Best-effort failures (cache writes, dropped
//! redirect batches) never become errors; they go through [`best_effort`]
//! which logs and counts them.

use serde_json::{Value, json};
use std::fmt;

/// Errors surfaced to callers of the core.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller error, never retried by this layer.
    #[error("{message}")]
    InvalidInput { message: String, details: Value },

    /// The caller asked for a specific alias and it already exists.
    #[error("alias '{alias}' is already taken")]
    AliasTaken { alias: String },

    /// Every synthesized alias candidate collided.
    #[error("failed to allocate a unique alias after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// Authoritative absence in the durable store.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Transient infrastructure failure; the whole request may be retried.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::AliasTaken { .. } => "alias_taken",
            Self::AllocationExhausted { .. } => "allocation_exhausted",
            Self::NotFound { .. } => "not_found",
            Self::StorageUnavailable { .. } => "storage_unavailable",
        }
    }

    /// Structured context attached to the error.
    pub fn details(&self) -> Value {
        match self {
            Self::InvalidInput { details, .. } | Self::NotFound { details, .. } => details.clone(),
            Self::AliasTaken { alias } => json!({ "alias": alias }),
            Self::AllocationExhausted { attempts } => json!({ "attempts": attempts }),
            Self::StorageUnavailable { .. } => json!({}),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::storage_unavailable(e.to_string())
    }
}

/// Errors reported by durable store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row with the same unique key already exists.
    #[error("unique constraint violation{}", on_constraint(.constraint))]
    UniqueViolation { constraint: Option<String> },

    /// The store could not complete the operation.
    #[error("store operation failed: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The store has been shut down.
    #[error("store is closed")]
    Closed,
}

fn on_constraint(constraint: &Option<String>) -> String {
    constraint
        .as_deref()
        .map(|c| format!(" on {c}"))
        .unwrap_or_default()
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Kinds of failures that are tolerated and never propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestEffortFailure {
    CacheRead,
    CacheWrite,
    BatchDropped,
    EventRejected,
}

impl BestEffortFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheRead => "cache_read",
            Self::CacheWrite => "cache_write",
            Self::BatchDropped => "batch_dropped",
            Self::EventRejected => "event_rejected",
        }
    }
}

impl fmt::Display for BestEffortFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logs and counts a swallowed failure.
pub fn best_effort(kind: BestEffortFailure, error: &dyn fmt::Display) {
    tracing::warn!(kind = %kind, error = %error, "best-effort operation failed");
    metrics::counter!("shortener_best_effort_failures_total", "kind" => kind.as_str())
        .increment(1);
}
