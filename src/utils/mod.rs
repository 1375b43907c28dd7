//! Helper functions used across the crate:
//!
//! - [`url_validator`] - Absolute URL checks for original links
//! - [`db_error`] - SQLx error classification

pub mod db_error;
pub mod url_validator;
