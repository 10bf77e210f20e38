//! OpenAPI Specification for the TechStacks API
//!
//! Generated with utoipa from the route annotations and the schema derives
//! on the request, response and catalog types.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{config, health, overview, stack, technology};
use crate::types::*;

use techstacks_core::{
    Choice, ChoiceDetails, HistoryRecord, Overview, Stack, StackDraft, StackOperation,
    StackOrderField, StackQuery, Technology, TechnologyRanking, TechnologyTier, TierChoices,
    TierRanking, UserRanking,
};

/// OpenAPI document for the TechStacks API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TechStacks API",
        version = "0.1.0",
        description = "Community catalog of technology stacks: stacks, their technology choices, history and rankings",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Stacks", description = "Stack CRUD, history, choices and favorites"),
        (name = "Catalog", description = "Tier listing, recent stacks, overview and the finder"),
        (name = "Technologies", description = "Technologies that stacks can choose"),
        (name = "Config", description = "Static option lists"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Stack Routes ===
        stack::create_stack,
        stack::update_stack,
        stack::delete_stack,
        stack::list_stacks,
        stack::get_stack,
        stack::stack_history,
        stack::add_choice,
        stack::remove_choice,
        stack::favorite_stack,
        stack::unfavorite_stack,

        // === Catalog Routes ===
        overview::list_stacks_by_tier,
        overview::list_recent_stacks,
        overview::overview,
        overview::find_stacks,

        // === Technology Routes ===
        technology::create_technology,
        technology::list_technologies,

        // === Config Routes ===
        config::list_config_options,

        // === Health & Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        crate::telemetry::metrics::metrics_handler,
    ),
    components(
        schemas(
            // Errors
            ApiError,
            ErrorCode,

            // Catalog entities
            Stack,
            StackDraft,
            Choice,
            ChoiceDetails,
            Technology,
            TechnologyTier,
            TierChoices,
            HistoryRecord,
            StackOperation,
            StackQuery,
            StackOrderField,
            Overview,
            UserRanking,
            TechnologyRanking,
            TierRanking,

            // Requests and responses
            StackRequest,
            StackResponse,
            StackDetailsResponse,
            FindStacksResponse,
            DeleteStackResponse,
            StackHistoryResponse,
            FavoriteResponse,
            AddChoiceRequest,
            CreateTechnologyRequest,
            TechnologyResponse,
            ListTechnologiesResponse,
            TierOption,
            ConfigOptionsResponse,

            // Health
            health::HealthResponse,
            health::HealthStatus,
            health::HealthDetails,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }

    /// Generate OpenAPI spec as YAML string.
    pub fn to_yaml() -> Result<String, String> {
        let openapi = Self::openapi();
        serde_yaml::to_string(&openapi).map_err(|e| e.to_string())
    }
}
