//! Service Layer
//!
//! Orchestration of catalog operations: authorization, durable write, history
//! append and cache invalidation for mutations, and cache-then-store lookups
//! for reads. Handlers stay thin and response types stay pure DTOs.

mod stack_service;

pub use stack_service::*;
