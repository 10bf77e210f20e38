//! Enum types for catalog entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTITY TYPE
// ============================================================================

/// Kind of persisted entity, used in error reporting and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Stack,
    Choice,
    Technology,
    Favorite,
    HistoryRecord,
}

impl EntityType {
    /// Lowercase label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Stack => "stack",
            EntityType::Choice => "choice",
            EntityType::Technology => "technology",
            EntityType::Favorite => "favorite",
            EntityType::HistoryRecord => "history",
        }
    }
}

// ============================================================================
// TECHNOLOGY TIER
// ============================================================================

/// Categorical grouping used to classify technologies and stack choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TechnologyTier {
    ProgrammingLanguage,
    Client,
    Http,
    Server,
    Data,
    SoftwareAsAService,
    OperatingSystem,
    Hardware,
    ThirdPartyServices,
}

impl TechnologyTier {
    /// Every tier in display order.
    pub const ALL: [TechnologyTier; 9] = [
        TechnologyTier::ProgrammingLanguage,
        TechnologyTier::Client,
        TechnologyTier::Http,
        TechnologyTier::Server,
        TechnologyTier::Data,
        TechnologyTier::SoftwareAsAService,
        TechnologyTier::OperatingSystem,
        TechnologyTier::Hardware,
        TechnologyTier::ThirdPartyServices,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TechnologyTier::ProgrammingLanguage => "ProgrammingLanguage",
            TechnologyTier::Client => "Client",
            TechnologyTier::Http => "Http",
            TechnologyTier::Server => "Server",
            TechnologyTier::Data => "Data",
            TechnologyTier::SoftwareAsAService => "SoftwareAsAService",
            TechnologyTier::OperatingSystem => "OperatingSystem",
            TechnologyTier::Hardware => "Hardware",
            TechnologyTier::ThirdPartyServices => "ThirdPartyServices",
        }
    }

    /// Parse from database string representation (case-insensitive).
    pub fn from_db_str(s: &str) -> Result<Self, TierParseError> {
        TechnologyTier::ALL
            .into_iter()
            .find(|tier| tier.as_db_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TierParseError(s.to_string()))
    }

    /// Human-readable label shown in option listings.
    pub fn title(&self) -> &'static str {
        match self {
            TechnologyTier::ProgrammingLanguage => "Programming Languages",
            TechnologyTier::Client => "Client Libraries",
            TechnologyTier::Http => "HTTP Server Technologies",
            TechnologyTier::Server => "Server Libraries",
            TechnologyTier::Data => "Databases and NoSQL Stores",
            TechnologyTier::SoftwareAsAService => "SaaS Technologies",
            TechnologyTier::OperatingSystem => "Operating Systems",
            TechnologyTier::Hardware => "Hardware Technologies",
            TechnologyTier::ThirdPartyServices => "3rd Party APIs/Services",
        }
    }
}

impl fmt::Display for TechnologyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for TechnologyTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid tier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierParseError(pub String);

impl fmt::Display for TierParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid technology tier: {}", self.0)
    }
}

impl std::error::Error for TierParseError {}

// ============================================================================
// STACK OPERATION
// ============================================================================

/// Mutation kind. Used both as the intended operation for authorization and
/// as the tag on history records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackOperation {
    Create,
    Update,
    Delete,
}

impl StackOperation {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            StackOperation::Create => "CREATE",
            StackOperation::Update => "UPDATE",
            StackOperation::Delete => "DELETE",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, OperationParseError> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(StackOperation::Create),
            "UPDATE" => Ok(StackOperation::Update),
            "DELETE" => Ok(StackOperation::Delete),
            _ => Err(OperationParseError(s.to_string())),
        }
    }

    /// Label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            StackOperation::Create => "create",
            StackOperation::Update => "update",
            StackOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for StackOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for StackOperation {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid operation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationParseError(pub String);

impl fmt::Display for OperationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid stack operation: {}", self.0)
    }
}

impl std::error::Error for OperationParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_db_str_round_trip() {
        for tier in TechnologyTier::ALL {
            assert_eq!(TechnologyTier::from_db_str(tier.as_db_str()), Ok(tier));
        }
    }

    #[test]
    fn test_tier_parse_is_case_insensitive() {
        assert_eq!("server".parse::<TechnologyTier>(), Ok(TechnologyTier::Server));
        assert_eq!(" DATA ".parse::<TechnologyTier>(), Ok(TechnologyTier::Data));
        assert!("mainframe".parse::<TechnologyTier>().is_err());
    }

    #[test]
    fn test_operation_serializes_as_upper_case_tag() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&StackOperation::Create)?, "\"CREATE\"");
        assert_eq!(StackOperation::Delete.to_string(), "DELETE");
        assert_eq!("update".parse::<StackOperation>(), Ok(StackOperation::Update));
        Ok(())
    }
}
