//! Alias allocation with bounded collision retries.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::domain::alias::{AliasGenerator, DEFAULT_ALIAS_LENGTH, validate_alias};
use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::url_validator::validate_original_url;

/// Default ceiling on commit attempts for synthesized aliases.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Allocates unique aliases and commits them to the durable store.
///
/// Uniqueness is decided by the store: the allocator simply tries to insert
/// and reacts to a unique violation. Caller-chosen aliases are never retried.
/// Synthesized aliases are regenerated one character longer on every retry,
/// which shrinks the collision probability as the attempt count grows.
pub struct AliasAllocator<L: LinkRepository, G: AliasGenerator> {
    link_repository: Arc<L>,
    generator: Arc<G>,
    alias_length: usize,
    max_attempts: usize,
}

impl<L: LinkRepository, G: AliasGenerator> AliasAllocator<L, G> {
    /// Creates an allocator with the default length (6) and attempt ceiling (10).
    pub fn new(link_repository: Arc<L>, generator: Arc<G>) -> Self {
        Self {
            link_repository,
            generator,
            alias_length: DEFAULT_ALIAS_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the base alias length and the attempt ceiling.
    pub fn with_policy(mut self, alias_length: usize, max_attempts: usize) -> Self {
        self.alias_length = alias_length.max(1);
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Validates the request and commits a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the original URL is not absolute or the
    /// requested alias is malformed.
    /// Returns [`AppError::AliasTaken`] if the requested alias already exists.
    /// Returns [`AppError::AllocationExhausted`] if every synthesized candidate collided.
    /// Returns [`AppError::StorageUnavailable`] on any other store failure.
    pub async fn allocate(&self, request: NewShortLink) -> Result<ShortLink, AppError> {
        validate_original_url(&request.original).map_err(|e| {
            AppError::invalid_input(
                "Invalid original URL",
                json!({ "reason": e.to_string(), "original": request.original }),
            )
        })?;

        match request.requested_alias() {
            Some(alias) => {
                validate_alias(alias)?;
                self.commit_requested(alias, &request.original).await
            }
            None => self.commit_generated(&request.original).await,
        }
    }

    async fn commit_requested(&self, alias: &str, original: &str) -> Result<ShortLink, AppError> {
        match self
            .link_repository
            .create(ShortLink::new(alias, original))
            .await
        {
            Ok(link) => Ok(link),
            Err(e) if e.is_unique_violation() => {
                debug!(alias, "Requested alias already taken");
                Err(AppError::AliasTaken {
                    alias: alias.to_string(),
                })
            }
            Err(e) => {
                error!(alias, error = %e, "Failed to store short link");
                Err(e.into())
            }
        }
    }

    async fn commit_generated(&self, original: &str) -> Result<ShortLink, AppError> {
        for attempt in 0..self.max_attempts {
            let alias = self.generator.generate(self.alias_length + attempt);

            match self
                .link_repository
                .create(ShortLink::new(alias.as_str(), original))
                .await
            {
                Ok(link) => {
                    if attempt > 0 {
                        debug!(alias = %link.alias, attempt, "Alias allocated after collisions");
                    }
                    return Ok(link);
                }
                Err(e) if e.is_unique_violation() => {
                    debug!(alias, attempt, "Alias collision, regenerating");
                    metrics::counter!("shortener_alias_collisions_total").increment(1);
                }
                Err(e) => {
                    error!(alias, error = %e, "Failed to store short link");
                    return Err(e.into());
                }
            }
        }

        warn!(
            attempts = self.max_attempts,
            "Alias allocation exhausted all attempts"
        );
        Err(AppError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}
