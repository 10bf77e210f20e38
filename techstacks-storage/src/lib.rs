//! TechStacks Storage - Repository Trait, Audit Log and Cache
//!
//! Defines the persistence abstraction for catalog entities together with
//! in-memory implementations. The PostgreSQL implementation lives in
//! techstacks-api.

pub mod audit;
pub mod cache;
pub mod memory;
pub mod repository;
pub mod store;

pub use audit::{AuditLog, InMemoryAuditLog};
pub use cache::{
    CacheBackend, CacheConfig, CacheEntry, CacheKey, CacheOutcome, CacheRead, CacheStats,
    InMemoryCacheBackend, ReadThroughCache,
};
pub use memory::InMemoryRepository;
pub use repository::StackRepository;
pub use store::{OverviewLimits, StackLookup, StackStore};
