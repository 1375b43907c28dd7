//! Domain layer containing business entities, repository contracts and
//! alias generation.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Durable store trait definitions
//! - [`alias`] - Alias alphabet and random candidate generation
//!
//! # Redirect Flow
//!
//! 1. A caller resolves an alias through [`crate::application::services::CacheAsideResolver`]
//! 2. A [`entities::RedirectEvent`] is recorded into the
//!    [`crate::application::services::RedirectBatcher`] buffer
//! 3. Full buffers are flushed in the background via [`repositories::RedirectRepository`]

pub mod alias;
pub mod entities;
pub mod repositories;
