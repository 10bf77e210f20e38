//! Custom path extractors for type-safe entity IDs.
//!
//! `PathId<T>` extracts an integer path segment into an `EntityIdType`
//! newtype and rejects non-numeric values with a 400 that names the entity.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use techstacks_core::EntityIdType;

/// Extractor for type-safe entity IDs from path parameters.
///
/// ```rust,ignore
/// async fn delete_stack(
///     PathId(stack_id): PathId<StackId>,
/// ) -> ApiResult<impl IntoResponse> {
///     service.delete(&actor, stack_id).await
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId<T: EntityIdType>(pub T);

/// Error returned when PathId extraction fails.
#[derive(Debug)]
pub struct PathIdError {
    pub entity_name: &'static str,
    pub path_param: String,
    pub message: String,
}

impl std::fmt::Display for PathIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid {} ID '{}': {}",
            self.entity_name, self.path_param, self.message
        )
    }
}

impl std::error::Error for PathIdError {}

impl IntoResponse for PathIdError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "code": "INVALID_FORMAT",
            "message": self.to_string(),
            "details": {
                "entity_type": self.entity_name,
                "path_param": self.path_param,
            },
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: EntityIdType,
{
    type Rejection = PathIdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<i64> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| PathIdError {
                entity_name: T::ENTITY_NAME,
                path_param: parts.uri.path().to_string(),
                message: format!("Failed to extract integer id from path: {}", e),
            })?;

        Ok(PathId(T::new(raw)))
    }
}

/// Extractor for two type-safe entity IDs from path parameters.
///
/// ```rust,ignore
/// // For route: /stacks/:id/choices/:choice_id
/// async fn remove_choice(
///     PathIds((stack_id, choice_id)): PathIds<(StackId, ChoiceId)>,
/// ) -> ApiResult<impl IntoResponse> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PathIds<T>(pub T);

#[async_trait]
impl<S, T1, T2> FromRequestParts<S> for PathIds<(T1, T2)>
where
    S: Send + Sync,
    T1: EntityIdType,
    T2: EntityIdType,
{
    type Rejection = PathIdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)): Path<(i64, i64)> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| PathIdError {
                entity_name: "path",
                path_param: parts.uri.path().to_string(),
                message: format!("Failed to extract integer ids from path: {}", e),
            })?;

        Ok(PathIds((T1::new(first), T2::new(second))))
    }
}
