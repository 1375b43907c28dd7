//! Repository trait definitions for the domain layer.
//!
//! These traits are the narrow surface the core consumes from the durable
//! store. Concrete implementations live in `crate::infrastructure::persistence`;
//! mock implementations are auto-generated via `mockall` for unit tests.
//!
//! - [`LinkRepository`] - Alias → URL mapping
//! - [`RedirectRepository`] - Redirect event log and analytics reads

pub mod link_repository;
pub mod redirect_repository;

pub use link_repository::LinkRepository;
pub use redirect_repository::{AggregatedView, PAGE_SIZE, RedirectFilter, RedirectRepository};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use redirect_repository::MockRedirectRepository;
