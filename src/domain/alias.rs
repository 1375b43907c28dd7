//! Alias generation and validation.
//!
//! Synthesized aliases are drawn uniformly from a fixed lowercase
//! alphanumeric alphabet. Aliases are not secrets, so a fast seeded
//! pseudo-random generator is enough; the generator is process-scoped state
//! created once at startup and handed to the allocator.

use crate::error::AppError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::json;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Characters a synthesized alias is drawn from.
pub const ALIAS_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Default length of a synthesized alias.
pub const DEFAULT_ALIAS_LENGTH: usize = 6;

/// Longest alias a caller may request.
pub const MAX_ALIAS_LENGTH: usize = 64;

static ALIAS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("alias pattern is valid"));

/// Source of alias candidates.
///
/// Injected into [`crate::application::services::AliasAllocator`] so tests
/// can supply a deterministic sequence.
#[cfg_attr(test, mockall::automock)]
pub trait AliasGenerator: Send + Sync {
    /// Returns a candidate of exactly `len` characters.
    fn generate(&self, len: usize) -> String;
}

/// Seeded pseudo-random alias generator shared across the process.
pub struct RandomAliasGenerator {
    rng: Mutex<StdRng>,
}

impl RandomAliasGenerator {
    /// Seeds the generator once from wall-clock time.
    pub fn from_clock() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::from_seed(seed)
    }

    /// Creates a generator with a fixed seed, yielding a reproducible sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AliasGenerator for RandomAliasGenerator {
    fn generate(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (0..len)
            .map(|_| ALIAS_ALPHABET[rng.random_range(0..ALIAS_ALPHABET.len())] as char)
            .collect()
    }
}

/// Validates a caller-supplied alias.
///
/// # Rules
///
/// - Length: 1-64 characters
/// - Allowed characters: ASCII letters, digits, hyphens and underscores
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] if any rule is violated.
pub fn validate_alias(alias: &str) -> Result<(), AppError> {
    if alias.is_empty() || alias.len() > MAX_ALIAS_LENGTH {
        return Err(AppError::invalid_input(
            format!("Alias must be 1-{MAX_ALIAS_LENGTH} characters"),
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !ALIAS_PATTERN.is_match(alias) {
        return Err(AppError::invalid_input(
            "Alias can only contain letters, digits, hyphens and underscores",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
