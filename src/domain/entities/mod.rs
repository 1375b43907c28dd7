//! Core domain entities.
//!
//! - [`ShortLink`] - A committed alias → URL mapping
//! - [`NewShortLink`] - An allocation request, alias optional
//! - [`RedirectEvent`] - One resolution of an alias, kept for analytics

pub mod redirect_event;
pub mod short_link;

pub use redirect_event::RedirectEvent;
pub use short_link::{NewShortLink, ShortLink};
