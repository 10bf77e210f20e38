//! Identity types for catalog entities

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Current time as a [`Timestamp`].
pub fn now() -> Timestamp {
    Utc::now()
}

/// Common behaviour for the integer identifier newtypes.
///
/// Identifiers are assigned by storage (sequence or auto-increment), so the
/// only way to obtain one outside storage is to parse or wrap a raw value.
pub trait EntityIdType:
    Copy + Clone + fmt::Debug + fmt::Display + PartialEq + Eq + std::hash::Hash + Send + Sync + 'static
{
    /// Human-readable entity name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap a raw identifier.
    fn new(raw: i64) -> Self;

    /// Get the raw identifier.
    fn as_i64(&self) -> i64;
}

/// Error returned when an identifier string is not a valid integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    pub entity_name: &'static str,
    pub value: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} id: {}", self.entity_name, self.value)
    }
}

impl std::error::Error for IdParseError {}

/// Define an `i64` identifier newtype implementing [`EntityIdType`].
///
/// # Example
/// ```ignore
/// define_entity_id!(StackId, "Stack");
/// ```
#[macro_export]
macro_rules! define_entity_id {
    ($name:ident, $entity:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $crate::identity::EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(raw: i64) -> Self {
                Self(raw)
            }

            fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::identity::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| $crate::identity::IdParseError {
                        entity_name: $entity,
                        value: s.to_string(),
                    })
            }
        }
    };
}

define_entity_id!(StackId, "Stack");
define_entity_id!(ChoiceId, "Choice");
define_entity_id!(TechnologyId, "Technology");
define_entity_id!(HistoryId, "History record");

/// Parse any identifier type from its string form.
pub fn parse_id<T>(s: &str) -> Result<T, IdParseError>
where
    T: EntityIdType + FromStr<Err = IdParseError>,
{
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_id_round_trips_through_display() {
        let id = StackId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(parse_id::<StackId>("42"), Ok(id));
    }

    #[test]
    fn test_id_parse_rejects_non_numeric() {
        let err = parse_id::<StackId>("go-web-server").unwrap_err();
        assert_eq!(err.entity_name, "Stack");
        assert!(err.to_string().contains("go-web-server"));
    }

    #[test]
    fn test_id_serializes_transparently() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&TechnologyId::new(7))?;
        assert_eq!(json, "7");
        Ok(())
    }
}
