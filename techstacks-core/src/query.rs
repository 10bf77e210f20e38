//! Filtered stack listing

use crate::{Stack, ValidationError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Page size when the caller does not supply `take`.
pub const DEFAULT_TAKE: usize = 100;
/// Largest page a caller can request.
pub const MAX_TAKE: usize = 1000;

/// Sortable stack columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum StackOrderField {
    Id,
    Name,
    Created,
    LastModified,
}

impl StackOrderField {
    /// Column name in the relational schema.
    pub fn column(&self) -> &'static str {
        match self {
            StackOrderField::Id => "id",
            StackOrderField::Name => "name",
            StackOrderField::Created => "created",
            StackOrderField::LastModified => "last_modified",
        }
    }
}

/// Parsed `order_by` value: a field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackOrder {
    pub field: StackOrderField,
    pub descending: bool,
}

impl Default for StackOrder {
    fn default() -> Self {
        Self {
            field: StackOrderField::Id,
            descending: false,
        }
    }
}

impl StackOrder {
    /// Parse `name`, `-created`, `lastModified`, `last_modified` and so on.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let (descending, field) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match field.to_ascii_lowercase().replace('_', "").as_str() {
            "id" => StackOrderField::Id,
            "name" => StackOrderField::Name,
            "created" => StackOrderField::Created,
            "lastmodified" => StackOrderField::LastModified,
            _ => {
                return Err(ValidationError::InvalidValue {
                    field: "order_by".to_string(),
                    reason: format!("unknown sort field '{}'", field),
                })
            }
        };
        Ok(Self { field, descending })
    }

    pub fn compare(&self, a: &Stack, b: &Stack) -> Ordering {
        let ord = match self.field {
            StackOrderField::Id => a.id.cmp(&b.id),
            StackOrderField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            StackOrderField::Created => a.created.cmp(&b.created),
            StackOrderField::LastModified => a.last_modified.cmp(&b.last_modified),
        }
        .then_with(|| a.id.cmp(&b.id));
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Caller-defined filter for `FindStacks`.
///
/// All supplied predicates must match. String matches are
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct StackQuery {
    pub name: Option<String>,
    pub name_contains: Option<String>,
    pub slug: Option<String>,
    pub owner_id: Option<String>,
    pub created_by: Option<String>,
    pub is_locked: Option<bool>,
    /// Sort field, prefix with `-` for descending.
    pub order_by: Option<String>,
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

impl StackQuery {
    pub fn matches(&self, stack: &Stack) -> bool {
        fn eq_ci(expected: &Option<String>, actual: &str) -> bool {
            expected
                .as_deref()
                .map_or(true, |e| e.to_lowercase() == actual.to_lowercase())
        }

        eq_ci(&self.name, &stack.name)
            && eq_ci(&self.slug, &stack.slug)
            && eq_ci(&self.owner_id, &stack.owner_id)
            && eq_ci(&self.created_by, &stack.created_by)
            && self.is_locked.map_or(true, |l| l == stack.is_locked)
            && self.name_contains.as_deref().map_or(true, |needle| {
                stack.name.to_lowercase().contains(&needle.to_lowercase())
            })
    }

    pub fn order(&self) -> Result<StackOrder, ValidationError> {
        self.order_by
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map_or(Ok(StackOrder::default()), StackOrder::parse)
    }

    pub fn offset(&self) -> usize {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.take.unwrap_or(DEFAULT_TAKE).min(MAX_TAKE)
    }

    /// Reject malformed queries before they reach storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(skip) = self.skip {
            if i64::try_from(skip).is_err() {
                return Err(ValidationError::InvalidValue {
                    field: "skip".to_string(),
                    reason: format!("must not exceed {}", i64::MAX),
                });
            }
        }
        self.order().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identity::EntityIdType, now, ActorContext, StackDraft, StackId};

    fn stack(id: i64, name: &str, owner: &str) -> Stack {
        StackDraft::new(name, "")
            .into_new_stack(&ActorContext::new(owner, owner), now())
            .map(|s| s.into_stack(StackId::new(id)))
            .unwrap()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(StackQuery::default().matches(&stack(1, "Rust", "u1")));
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let s = stack(1, "Rust Web Stack", "u1");
        let query = StackQuery {
            name_contains: Some("web".to_string()),
            owner_id: Some("U1".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&s));

        let wrong_owner = StackQuery {
            owner_id: Some("u2".to_string()),
            ..query
        };
        assert!(!wrong_owner.matches(&s));
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!(
            StackOrder::parse("-lastModified"),
            Ok(StackOrder {
                field: StackOrderField::LastModified,
                descending: true
            })
        );
        assert_eq!(StackOrder::parse("name").map(|o| o.field), Ok(StackOrderField::Name));
        assert!(StackOrder::parse("favorites").is_err());
    }

    #[test]
    fn test_order_compare_descending() {
        let order = StackOrder::parse("-id").unwrap();
        let mut stacks = vec![stack(1, "a", "u"), stack(3, "b", "u"), stack(2, "c", "u")];
        stacks.sort_by(|a, b| order.compare(a, b));
        let ids: Vec<i64> = stacks.iter().map(|s| s.id.as_i64()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_equality_filters_fold_unicode_case() {
        let s = stack(1, "Ökosystem", "Émile");
        let query = StackQuery {
            name: Some("ÖKOSYSTEM".to_string()),
            owner_id: Some("émile".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&s));
    }

    #[test]
    fn test_skip_must_fit_in_i64() {
        let too_far = StackQuery {
            skip: Some(usize::MAX),
            ..Default::default()
        };
        if i64::try_from(usize::MAX).is_err() {
            assert!(matches!(
                too_far.validate(),
                Err(ValidationError::InvalidValue { ref field, .. }) if field == "skip"
            ));
        }
        let fine = StackQuery {
            skip: Some(10),
            ..Default::default()
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_limit_is_capped() {
        let query = StackQuery {
            take: Some(50_000),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_TAKE);
        assert_eq!(StackQuery::default().limit(), DEFAULT_TAKE);
    }
}
