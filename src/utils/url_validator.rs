//! Validation of original URLs submitted for shortening.
//!
//! The original URL is stored and returned exactly as submitted; this module
//! only checks that it is absolute.

use url::Url;

/// Reasons an original URL is rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Original URL is empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL must be absolute (scheme://host/path)")]
    NotAbsolute,
}

/// Checks that `input` is a non-empty absolute URL with both scheme and host.
///
/// # Errors
///
/// Returns [`UrlValidationError::Empty`] for blank input,
/// [`UrlValidationError::InvalidFormat`] when parsing fails and
/// [`UrlValidationError::NotAbsolute`] when the host is missing.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_original_url("https://example.com/page").is_ok());
/// assert!(validate_original_url("mailto:someone@example.com").is_err());
/// ```
pub fn validate_original_url(input: &str) -> Result<(), UrlValidationError> {
    if input.trim().is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    if url.scheme().is_empty() || url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::NotAbsolute);
    }

    Ok(())
}
