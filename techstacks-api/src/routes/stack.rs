//! Stack REST API Routes
//!
//! Create, update and delete go through the service, which authorizes the
//! caller, writes history and flushes the response cache. Reads are public.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use techstacks_core::{ChoiceId, StackId};

use crate::{
    error::ApiResult,
    extractors::{PathId, PathIds},
    middleware::{auth_middleware, AuthExtractor},
    services::StackService,
    state::AppState,
    types::{AddChoiceRequest, ReloadParams, StackRequest},
};

#[cfg(feature = "openapi")]
use crate::{
    error::ApiError,
    types::{
        DeleteStackResponse, FavoriteResponse, StackDetailsResponse, StackHistoryResponse,
        StackResponse,
    },
};
#[cfg(feature = "openapi")]
use techstacks_core::Choice;

// ============================================================================
// STACK MUTATIONS
// ============================================================================

/// POST /api/v1/stacks - Create a stack owned by the caller
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/stacks",
    tag = "Stacks",
    request_body = StackRequest,
    responses(
        (status = 201, description = "Stack created", body = StackResponse),
        (status = 400, description = "Missing or invalid name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Slug already taken", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn create_stack(
    State(service): State<StackService>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<StackRequest>,
) -> ApiResult<impl IntoResponse> {
    let stack = service.create(&auth.actor(), req.into()).await?;
    Ok((StatusCode::CREATED, Json(stack)))
}

/// PUT /api/v1/stacks/{id} - Replace a stack's editable fields
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/stacks/{id}",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID")
    ),
    request_body = StackRequest,
    responses(
        (status = 200, description = "Stack updated", body = StackResponse),
        (status = 400, description = "Missing or invalid name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the owner, or the stack is locked", body = ApiError),
        (status = 404, description = "Stack not found", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn update_stack(
    State(service): State<StackService>,
    PathId(id): PathId<StackId>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<StackRequest>,
) -> ApiResult<impl IntoResponse> {
    let stack = service.update(&auth.actor(), id, req.into()).await?;
    Ok(Json(stack))
}

/// DELETE /api/v1/stacks/{id} - Delete a stack and its choices
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/stacks/{id}",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID")
    ),
    responses(
        (status = 200, description = "Stack deleted", body = DeleteStackResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the owner", body = ApiError),
        (status = 404, description = "Stack not found", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn delete_stack(
    State(service): State<StackService>,
    PathId(id): PathId<StackId>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let removed = service.delete(&auth.actor(), id).await?;
    Ok(Json(removed))
}

// ============================================================================
// STACK READS
// ============================================================================

/// GET /api/v1/stacks - List stacks
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/stacks",
    tag = "Stacks",
    responses(
        (status = 200, description = "Stacks ordered by id", body = Vec<StackResponse>),
    ),
))]
pub async fn list_stacks(State(service): State<StackService>) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.list().await?))
}

/// GET /api/v1/stacks/{id} - Get a stack by numeric id or slug
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/stacks/{id}",
    tag = "Stacks",
    params(
        ("id" = String, Path, description = "Stack ID or slug"),
        ReloadParams,
    ),
    responses(
        (status = 200, description = "Stack with its choices", body = StackDetailsResponse),
        (status = 404, description = "Stack not found", body = ApiError),
    ),
))]
pub async fn get_stack(
    State(service): State<StackService>,
    Path(slug_or_id): Path<String>,
    Query(params): Query<ReloadParams>,
) -> ApiResult<impl IntoResponse> {
    let details = service.get_by_slug(&slug_or_id, params.reload).await?;
    Ok(Json(details))
}

/// GET /api/v1/stacks/{id}/history - Audit trail, oldest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/stacks/{id}/history",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID")
    ),
    responses(
        (status = 200, description = "History records", body = StackHistoryResponse),
    ),
))]
pub async fn stack_history(
    State(service): State<StackService>,
    PathId(id): PathId<StackId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.history(id).await?))
}

// ============================================================================
// CHOICES
// ============================================================================

/// POST /api/v1/stacks/{id}/choices - Add a technology to a stack
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/stacks/{id}/choices",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID")
    ),
    request_body = AddChoiceRequest,
    responses(
        (status = 201, description = "Choice added", body = Choice),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the owner, or the stack is locked", body = ApiError),
        (status = 404, description = "Stack or technology not found", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn add_choice(
    State(service): State<StackService>,
    PathId(id): PathId<StackId>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<AddChoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let choice = service.add_choice(&auth.actor(), id, req).await?;
    Ok((StatusCode::CREATED, Json(choice)))
}

/// DELETE /api/v1/stacks/{id}/choices/{choice_id} - Remove a choice
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/stacks/{id}/choices/{choice_id}",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID"),
        ("choice_id" = i64, Path, description = "Choice ID")
    ),
    responses(
        (status = 204, description = "Choice removed"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the owner, or the stack is locked", body = ApiError),
        (status = 404, description = "Stack or choice not found", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn remove_choice(
    State(service): State<StackService>,
    PathIds((stack_id, choice_id)): PathIds<(StackId, ChoiceId)>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    service.remove_choice(&auth.actor(), stack_id, choice_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// FAVORITES
// ============================================================================

/// PUT /api/v1/stacks/{id}/favorite - Mark a stack as a favorite
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/stacks/{id}/favorite",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID")
    ),
    responses(
        (status = 200, description = "Favorite recorded", body = FavoriteResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Stack not found", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn favorite_stack(
    State(service): State<StackService>,
    PathId(id): PathId<StackId>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.favorite(&auth.actor(), id).await?))
}

/// DELETE /api/v1/stacks/{id}/favorite - Remove a favorite
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/stacks/{id}/favorite",
    tag = "Stacks",
    params(
        ("id" = i64, Path, description = "Stack ID")
    ),
    responses(
        (status = 200, description = "Favorite removed", body = FavoriteResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Stack not found", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = [])
    )
))]
pub async fn unfavorite_stack(
    State(service): State<StackService>,
    PathId(id): PathId<StackId>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(service.unfavorite(&auth.actor(), id).await?))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Stack routes, mounted at `/stacks`. Only the mutating methods pass through
/// `auth_middleware`.
pub fn create_router(state: AppState) -> Router {
    let auth = from_fn_with_state(state.auth.clone(), auth_middleware);

    Router::new()
        .route(
            "/",
            get(list_stacks).merge(post(create_stack).route_layer(auth.clone())),
        )
        .route(
            "/:id",
            get(get_stack).merge(
                put(update_stack)
                    .delete(delete_stack)
                    .route_layer(auth.clone()),
            ),
        )
        .route("/:id/history", get(stack_history))
        .route("/:id/choices", post(add_choice).route_layer(auth.clone()))
        .route(
            "/:id/choices/:choice_id",
            delete(remove_choice).route_layer(auth.clone()),
        )
        .route(
            "/:id/favorite",
            put(favorite_stack)
                .delete(unfavorite_stack)
                .route_layer(auth),
        )
        .with_state(state)
}
