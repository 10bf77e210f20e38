//! Choice and technology API types

use serde::{Deserialize, Serialize};
use techstacks_core::{Technology, TechnologyId, TechnologyTier};

use crate::utils::DetailsRenderer;

/// Request to add a technology choice to a stack. The tier is taken from the
/// technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddChoiceRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub technology_id: TechnologyId,
    /// Why this technology was picked
    #[serde(default)]
    pub justification: String,
}

/// Request to register a technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTechnologyRequest {
    pub name: String,
    pub tier: TechnologyTier,
    #[serde(default)]
    pub details: String,
}

/// A technology with its description rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TechnologyResponse {
    #[serde(flatten)]
    pub technology: Technology,
    pub details_html: String,
}

impl TechnologyResponse {
    pub fn render(technology: Technology, renderer: &dyn DetailsRenderer) -> Self {
        let details_html = renderer.render(&technology.details);
        Self {
            technology,
            details_html,
        }
    }
}

/// Response containing every technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListTechnologiesResponse {
    pub technologies: Vec<TechnologyResponse>,
    pub total: usize,
}
