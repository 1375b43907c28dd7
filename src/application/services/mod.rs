//! Business logic services for the application layer.

pub mod alias_allocator;
pub mod redirect_batcher;
pub mod resolver;
pub mod shortener;
pub mod stats_service;

pub use alias_allocator::AliasAllocator;
pub use redirect_batcher::RedirectBatcher;
pub use resolver::CacheAsideResolver;
pub use shortener::Shortener;
pub use stats_service::StatsService;
