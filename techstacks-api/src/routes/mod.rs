//! REST API Routes Module
//!
//! Route handlers organized by resource:
//! - Stack CRUD, history, choices and favorites under /api/v1/stacks
//! - Catalog reads (tiers, recent, overview, finder) under /api/v1
//! - Technologies under /api/v1/technologies
//! - Health checks (Kubernetes-compatible) under /health
//! - Prometheus metrics and the OpenAPI document
//!
//! Reads are public. Mutating methods carry `auth_middleware` as a route
//! layer, so an unauthenticated GET on a path never sees a 401.

pub mod config;
pub mod health;
pub mod overview;
pub mod stack;
pub mod technology;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::AuthMiddlewareState;
use crate::services::StackService;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use config::create_router as config_router;
pub use health::create_router as health_router;
pub use overview::create_router as overview_router;
pub use stack::create_router as stack_router;
pub use technology::create_router as technology_router;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;

    axum::Json(crate::openapi::ApiDoc::openapi())
}

/// Handler for /openapi.yaml endpoint.
#[cfg(feature = "openapi")]
async fn openapi_yaml() -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;

    match crate::openapi::ApiDoc::to_yaml() {
        Ok(yaml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/yaml")],
            yaml,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to generate YAML: {}", e),
        ),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Routes under /api/v1.
fn build_api_routes(state: &AppState) -> Router {
    Router::new()
        .nest("/stacks", stack::create_router(state.clone()))
        .nest("/technologies", technology::create_router(state.clone()))
        .merge(overview::create_router(state.clone()))
        .merge(config::create_router(state.clone()))
}

/// Assemble the router around an existing state.
///
/// # Middleware Order (outer to inner)
/// 1. CORS (outermost) - handles preflight requests
/// 2. Observability - tracing span and metrics per request
/// 3. Auth (route layer on mutating methods only)
pub fn build_router(state: AppState, api_config: &ApiConfig) -> Router {
    let mut router = Router::new()
        .nest("/api/v1", build_api_routes(&state))
        // Health checks (no auth required)
        .nest("/health", health::create_router(state))
        .route("/metrics", get(metrics_handler));

    #[cfg(feature = "openapi")]
    {
        router = router
            .route("/openapi.json", get(openapi_json))
            .route("/openapi.yaml", get(openapi_yaml));
    }

    let cors = build_cors_layer(api_config);

    router.layer(from_fn(observability_middleware)).layer(cors)
}

/// Create the complete API router.
///
/// Validates the auth configuration first: in production an insecure JWT
/// secret is an error, elsewhere a warning.
pub fn create_api_router(
    service: StackService,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    auth_config.validate_for_production()?;
    let state = AppState::new(service, AuthMiddlewareState::new(auth_config));
    Ok(build_router(state, api_config))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        // Exact origins plus `*.domain` wildcards over https.
        let allowed = config.clone();
        let origins = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| allowed.is_origin_allowed(o))
                .unwrap_or(false)
        });

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}
