//! Technology REST API Routes

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::ApiResult,
    middleware::{auth_middleware, AuthExtractor},
    services::StackService,
    state::AppState,
    types::CreateTechnologyRequest,
};

#[cfg(feature = "openapi")]
use crate::{
    error::ApiError,
    types::{ListTechnologiesResponse, TechnologyResponse},
};

/// POST /api/v1/technologies - Register a technology
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/technologies",
    tag = "Technologies",
    request_body = CreateTechnologyRequest,
    responses(
        (status = 201, description = "Technology created", body = TechnologyResponse),
        (status = 400, description = "Missing or invalid name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Slug already taken", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn create_technology(
    State(service): State<StackService>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<CreateTechnologyRequest>,
) -> ApiResult<impl IntoResponse> {
    let technology = service.create_technology(&auth.actor(), req).await?;
    Ok((StatusCode::CREATED, Json(technology)))
}

/// GET /api/v1/technologies - List technologies by name
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/technologies",
    tag = "Technologies",
    responses(
        (status = 200, description = "Every technology", body = ListTechnologiesResponse),
    ),
))]
pub async fn list_technologies(
    State(service): State<StackService>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.list_technologies().await?))
}

/// Technology routes, mounted at `/technologies`.
pub fn create_router(state: AppState) -> Router {
    let auth = from_fn_with_state(state.auth.clone(), auth_middleware);

    Router::new()
        .route(
            "/",
            get(list_technologies).merge(post(create_technology).route_layer(auth)),
        )
        .with_state(state)
}
