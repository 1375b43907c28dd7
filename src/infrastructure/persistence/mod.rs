//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries. All repositories share one [`ConnectionGate`] that caps the number
//! of simultaneous store operations.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Alias storage and retrieval
//! - [`PgRedirectRepository`] - Redirect batch inserts and analytics queries

pub mod gate;
pub mod pg_link_repository;
pub mod pg_redirect_repository;

pub use gate::ConnectionGate;
pub use pg_link_repository::PgLinkRepository;
pub use pg_redirect_repository::PgRedirectRepository;
