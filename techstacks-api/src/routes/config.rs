//! Configuration Options Route
//!
//! Static option lists for client forms. Never cached; the values are
//! compiled in.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::{services::StackService, state::AppState};

#[cfg(feature = "openapi")]
use crate::types::ConfigOptionsResponse;

/// GET /api/v1/config - Tier labels
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "Config",
    responses(
        (status = 200, description = "Selectable tiers in display order", body = ConfigOptionsResponse),
    ),
))]
pub async fn list_config_options(State(service): State<StackService>) -> impl IntoResponse {
    Json(service.config_options())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/config", get(list_config_options))
        .with_state(state)
}
