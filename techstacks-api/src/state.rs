//! Shared application state for Axum routers.

use std::time::Instant;

use crate::middleware::AuthMiddlewareState;
use crate::services::StackService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Catalog orchestration; owns the store, history ledger and cache.
    pub service: StackService,
    /// Credentials accepted by the mutating routes.
    pub auth: AuthMiddlewareState,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: StackService, auth: AuthMiddlewareState) -> Self {
        Self {
            service,
            auth,
            start_time: Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(StackService, service);
crate::impl_from_ref!(AuthMiddlewareState, auth);
crate::impl_from_ref!(Instant, start_time);
