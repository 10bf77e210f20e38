//! Catalog-wide read routes: tier listing, recent stacks, overview and the
//! filtered finder. All public.

use axum::{
    extract::{Query, RawQuery, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use techstacks_core::StackQuery;

use crate::{
    error::{ApiError, ApiResult},
    services::StackService,
    state::AppState,
    types::{ReloadParams, TierParams},
};

#[cfg(feature = "openapi")]
use crate::types::{FindStacksResponse, StackDetailsResponse, StackResponse};
#[cfg(feature = "openapi")]
use techstacks_core::Overview;

/// GET /api/v1/tiers/stacks - Stacks that have at least one choice
///
/// The `tier` parameter is validated but does not narrow the result.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/tiers/stacks",
    tag = "Catalog",
    params(TierParams),
    responses(
        (status = 200, description = "Stacks with choices, one row each", body = Vec<StackResponse>),
        (status = 400, description = "Unknown tier", body = ApiError),
    ),
))]
pub async fn list_stacks_by_tier(
    State(service): State<StackService>,
    Query(params): Query<TierParams>,
) -> ApiResult<impl IntoResponse> {
    let tier = params
        .parsed()
        .map_err(|e| ApiError::validation_failed(e.to_string()))?;
    Ok(Json(service.list_by_tier(tier).await?))
}

/// GET /api/v1/recent-stacks - Newest stacks with their choices
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/recent-stacks",
    tag = "Catalog",
    responses(
        (status = 200, description = "Newest stacks first", body = Vec<StackDetailsResponse>),
    ),
))]
pub async fn list_recent_stacks(
    State(service): State<StackService>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.list_recent_with_children().await?))
}

/// GET /api/v1/overview - Landing-page aggregate
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/overview",
    tag = "Catalog",
    params(ReloadParams),
    responses(
        (status = 200, description = "Latest stacks, top users and top technologies", body = Overview),
    ),
))]
pub async fn overview(
    State(service): State<StackService>,
    Query(params): Query<ReloadParams>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.overview(params.reload).await?))
}

/// GET /api/v1/find-stacks - Filtered, paged listing
///
/// Responses are cached under the raw query string, so parameter order
/// matters for cache hits but not for results.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/find-stacks",
    tag = "Catalog",
    params(StackQuery),
    responses(
        (status = 200, description = "Matching stacks", body = FindStacksResponse),
        (status = 400, description = "Invalid filter", body = ApiError),
    ),
))]
pub async fn find_stacks(
    State(service): State<StackService>,
    RawQuery(raw): RawQuery,
    Query(query): Query<StackQuery>,
) -> ApiResult<impl IntoResponse> {
    let raw = raw.unwrap_or_default();
    Ok(Json(service.find(&raw, &query).await?))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/tiers/stacks", get(list_stacks_by_tier))
        .route("/recent-stacks", get(list_recent_stacks))
        .route("/overview", get(overview))
        .route("/find-stacks", get(find_stacks))
        .with_state(state)
}
