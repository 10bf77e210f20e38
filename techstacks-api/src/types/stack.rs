//! Stack-related API types

use serde::{Deserialize, Serialize};
use techstacks_core::{
    HistoryRecord, Stack, StackDetails, StackDraft, StackId, TechnologyTier, TierChoices,
    ValidationError,
};

use crate::utils::DetailsRenderer;

/// Request body for creating or updating a stack.
///
/// Only these fields are editable; ownership, lock state and audit fields are
/// never taken from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackRequest {
    /// Display name; the slug is derived from it
    pub name: String,
    /// Free-text description (Markdown subset)
    #[serde(default)]
    pub details: String,
}

impl From<StackRequest> for StackDraft {
    fn from(req: StackRequest) -> Self {
        StackDraft::new(req.name, req.details)
    }
}

/// A stack as returned to clients, with its description rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackResponse {
    #[serde(flatten)]
    pub stack: Stack,
    /// `details` rendered to HTML
    pub details_html: String,
}

impl StackResponse {
    pub fn render(stack: Stack, renderer: &dyn DetailsRenderer) -> Self {
        let details_html = renderer.render(&stack.details);
        Self {
            stack,
            details_html,
        }
    }
}

/// A stack with its choices grouped by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackDetailsResponse {
    pub stack: StackResponse,
    pub tiers: Vec<TierChoices>,
}

impl StackDetailsResponse {
    pub fn render(details: StackDetails, renderer: &dyn DetailsRenderer) -> Self {
        Self {
            stack: StackResponse::render(details.stack, renderer),
            tiers: details.tiers,
        }
    }
}

/// Paged result of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FindStacksResponse {
    pub offset: usize,
    pub total: usize,
    pub results: Vec<StackResponse>,
}

/// Response for a delete: the id that was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteStackResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: StackId,
}

/// Audit trail for one stack, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackHistoryResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub stack_id: StackId,
    pub records: Vec<HistoryRecord>,
}

/// Favorite toggle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FavoriteResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub stack_id: StackId,
    /// Whether the stack is now a favorite of the caller
    pub favorited: bool,
    /// Whether this request changed anything
    pub changed: bool,
}

/// `?reload=true` bypasses the cached entry for this request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ReloadParams {
    #[serde(default)]
    pub reload: bool,
}

/// Query for the tier listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct TierParams {
    /// Tier name, e.g. `ProgrammingLanguage`
    pub tier: Option<String>,
}

impl TierParams {
    /// Parse the tier, treating an empty value as absent.
    pub fn parsed(&self) -> Result<Option<TechnologyTier>, ValidationError> {
        match self.tier.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<TechnologyTier>()
                .map(Some)
                .map_err(|e| ValidationError::InvalidValue {
                    field: "tier".to_string(),
                    reason: e.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MarkdownRenderer;
    use techstacks_core::{now, ActorContext, EntityIdType, StackDraft};

    fn stack(details: &str) -> Stack {
        StackDraft::new("Rust Web", details)
            .into_new_stack(&ActorContext::new("u1", "alice"), now())
            .expect("valid draft")
            .into_stack(StackId::new(1))
    }

    #[test]
    fn test_stack_response_flattens_and_renders() -> Result<(), serde_json::Error> {
        let response = StackResponse::render(stack("uses **axum**"), &MarkdownRenderer::new());
        let json = serde_json::to_value(&response)?;
        assert_eq!(json["slug"], "rust-web");
        assert_eq!(json["details"], "uses **axum**");
        assert_eq!(json["details_html"], "<p>uses <strong>axum</strong></p>");
        Ok(())
    }

    #[test]
    fn test_tier_params_parse() {
        let empty = TierParams { tier: Some(" ".to_string()) };
        assert_eq!(empty.parsed(), Ok(None));

        let data = TierParams { tier: Some("data".to_string()) };
        assert_eq!(data.parsed(), Ok(Some(TechnologyTier::Data)));

        let bogus = TierParams { tier: Some("Mainframe".to_string()) };
        assert!(bogus.parsed().is_err());
    }
}
