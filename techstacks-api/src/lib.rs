//! TechStacks API - REST Layer for the Stack Catalog
//!
//! Axum routes over [`services::StackService`], which orchestrates the
//! catalog: ownership/lock authorization, durable writes, the append-only
//! history ledger and invalidation of the read-through response cache.
//!
//! Storage is either the in-memory repository from `techstacks-storage` or
//! PostgreSQL through [`DbClient`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use auth::{
    authenticate, authenticate_api_key, authenticate_jwt, generate_jwt_token, validate_api_key,
    validate_jwt_token, AuthConfig, AuthContext, AuthMethod, Claims, JwtSecret,
};
pub use config::{ApiConfig, StorageBackend};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::{build_router, create_api_router};
pub use services::StackService;
pub use state::AppState;
pub use types::*;
