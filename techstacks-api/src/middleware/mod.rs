//! Middleware modules for the TechStacks API
//!
//! - `auth`: Authentication middleware and the `AuthExtractor`
//!
//! # Middleware Order
//!
//! ```ignore
//! Router::new()
//!     .route("/api/v1/stacks", post(create_stack))
//!     // Runs before the handler, after observability
//!     .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
//! ```

mod auth;

pub use auth::{auth_middleware, AuthExtractor, AuthMiddlewareError, AuthMiddlewareState};
