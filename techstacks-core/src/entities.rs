//! Core entity structures

use crate::{
    slug::slug_for_name, ActorContext, ChoiceId, HistoryId, StackId, StackOperation,
    TechnologyId, TechnologyTier, Timestamp, ValidationError,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// STACK
// ============================================================================

/// A named, community-curated collection of technology choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Stack {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: StackId,
    pub name: String,
    pub slug: String,
    pub details: String,
    pub owner_id: String,
    pub is_locked: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created: Timestamp,
    pub created_by: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub last_modified: Timestamp,
    pub last_modified_by: String,
}

/// A fully derived stack ready to be inserted. Storage assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStack {
    pub name: String,
    pub slug: String,
    pub details: String,
    pub owner_id: String,
    pub is_locked: bool,
    pub created: Timestamp,
    pub created_by: String,
    pub last_modified: Timestamp,
    pub last_modified_by: String,
}

impl NewStack {
    /// Attach a storage-assigned id.
    pub fn into_stack(self, id: StackId) -> Stack {
        Stack {
            id,
            name: self.name,
            slug: self.slug,
            details: self.details,
            owner_id: self.owner_id,
            is_locked: self.is_locked,
            created: self.created,
            created_by: self.created_by,
            last_modified: self.last_modified,
            last_modified_by: self.last_modified_by,
        }
    }
}

/// Caller-supplied stack fields. Everything else on a [`Stack`] is derived
/// or carried over from trusted state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackDraft {
    pub name: String,
    #[serde(default)]
    pub details: String,
}

impl StackDraft {
    pub fn new(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Build the row for a brand new stack owned by `actor`.
    pub fn into_new_stack(
        self,
        actor: &ActorContext,
        now: Timestamp,
    ) -> Result<NewStack, ValidationError> {
        let slug = slug_for_name(&self.name)?;
        Ok(NewStack {
            name: self.name,
            slug,
            details: self.details,
            owner_id: actor.user_id.clone(),
            is_locked: false,
            created: now,
            created_by: actor.user_name.clone(),
            last_modified: now,
            last_modified_by: actor.user_name.clone(),
        })
    }

    /// Merge the editable fields onto the stored row.
    ///
    /// Identity, ownership, lock state and creation audit come from `prior`;
    /// only `name` and `details` are taken from the draft.
    pub fn merge_onto(
        self,
        prior: &Stack,
        actor: &ActorContext,
        now: Timestamp,
    ) -> Result<Stack, ValidationError> {
        let slug = slug_for_name(&self.name)?;
        Ok(Stack {
            id: prior.id,
            name: self.name,
            slug,
            details: self.details,
            owner_id: prior.owner_id.clone(),
            is_locked: prior.is_locked,
            created: prior.created,
            created_by: prior.created_by.clone(),
            last_modified: now,
            last_modified_by: actor.user_name.clone(),
        })
    }
}

// ============================================================================
// CHOICES AND TECHNOLOGIES
// ============================================================================

/// A technology picked for a stack within a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Choice {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: ChoiceId,
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub stack_id: StackId,
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub technology_id: TechnologyId,
    pub tier: TechnologyTier,
    pub justification: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created: Timestamp,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChoice {
    pub stack_id: StackId,
    pub technology_id: TechnologyId,
    pub tier: TechnologyTier,
    pub justification: String,
    pub created: Timestamp,
    pub created_by: String,
}

impl NewChoice {
    pub fn into_choice(self, id: ChoiceId) -> Choice {
        Choice {
            id,
            stack_id: self.stack_id,
            technology_id: self.technology_id,
            tier: self.tier,
            justification: self.justification,
            created: self.created,
            created_by: self.created_by,
        }
    }
}

/// A technology that stacks can choose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Technology {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: TechnologyId,
    pub name: String,
    pub slug: String,
    pub tier: TechnologyTier,
    pub details: String,
    pub owner_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created: Timestamp,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTechnology {
    pub name: String,
    pub slug: String,
    pub tier: TechnologyTier,
    pub details: String,
    pub owner_id: String,
    pub created: Timestamp,
    pub created_by: String,
}

impl NewTechnology {
    /// Validate the name and derive the slug.
    pub fn build(
        name: impl Into<String>,
        tier: TechnologyTier,
        details: impl Into<String>,
        actor: &ActorContext,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let slug = slug_for_name(&name)?;
        Ok(Self {
            name,
            slug,
            tier,
            details: details.into(),
            owner_id: actor.user_id.clone(),
            created: now,
            created_by: actor.user_name.clone(),
        })
    }

    pub fn into_technology(self, id: TechnologyId) -> Technology {
        Technology {
            id,
            name: self.name,
            slug: self.slug,
            tier: self.tier,
            details: self.details,
            owner_id: self.owner_id,
            created: self.created,
            created_by: self.created_by,
        }
    }
}

// ============================================================================
// HISTORY
// ============================================================================

/// Immutable snapshot of a stack taken after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HistoryRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: HistoryId,
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub stack_id: StackId,
    pub operation: StackOperation,
    pub snapshot: Stack,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub recorded_at: Timestamp,
    pub recorded_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryRecord {
    pub stack_id: StackId,
    pub operation: StackOperation,
    pub snapshot: Stack,
    pub recorded_at: Timestamp,
    pub recorded_by: String,
}

impl NewHistoryRecord {
    /// Snapshot every field of `stack` under the given operation tag.
    pub fn snapshot(
        stack: &Stack,
        operation: StackOperation,
        actor: &ActorContext,
        now: Timestamp,
    ) -> Self {
        Self {
            stack_id: stack.id,
            operation,
            snapshot: stack.clone(),
            recorded_at: now,
            recorded_by: actor.user_name.clone(),
        }
    }

    pub fn into_record(self, id: HistoryId) -> HistoryRecord {
        HistoryRecord {
            id,
            stack_id: self.stack_id,
            operation: self.operation,
            snapshot: self.snapshot,
            recorded_at: self.recorded_at,
            recorded_by: self.recorded_by,
        }
    }
}

// ============================================================================
// READ MODELS
// ============================================================================

/// A choice joined with the technology it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChoiceDetails {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub choice_id: ChoiceId,
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub technology_id: TechnologyId,
    pub technology_name: String,
    pub technology_slug: String,
    pub justification: String,
}

/// Choices of one stack grouped under a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TierChoices {
    pub tier: TechnologyTier,
    pub title: String,
    pub choices: Vec<ChoiceDetails>,
}

/// A stack with its tier/choice breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackDetails {
    pub stack: Stack,
    pub tiers: Vec<TierChoices>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserRanking {
    pub user_id: String,
    pub user_name: String,
    pub favorites_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TechnologyRanking {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub technology_id: TechnologyId,
    pub name: String,
    pub slug: String,
    pub tier: TechnologyTier,
    pub stacks_count: i64,
}

/// Most-chosen technologies within one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TierRanking {
    pub tier: TechnologyTier,
    pub title: String,
    pub technologies: Vec<TechnologyRanking>,
}

/// Aggregate landing-page view of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Overview {
    pub latest_stacks: Vec<StackDetails>,
    pub top_users: Vec<UserRanking>,
    pub top_technologies: Vec<TechnologyRanking>,
    pub top_technologies_by_tier: Vec<TierRanking>,
}

/// One page of a filtered listing plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StackPage {
    pub offset: usize,
    pub total: usize,
    pub results: Vec<Stack>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identity::EntityIdType, now};

    fn owner() -> ActorContext {
        ActorContext::new("owner-1", "olivia")
    }

    #[test]
    fn test_new_stack_is_owned_by_actor() -> Result<(), ValidationError> {
        let ts = now();
        let new = StackDraft::new("Go Web Server", "net/http").into_new_stack(&owner(), ts)?;
        assert_eq!(new.slug, "go-web-server");
        assert_eq!(new.owner_id, "owner-1");
        assert_eq!(new.created_by, "olivia");
        assert!(!new.is_locked);
        assert_eq!(new.created, ts);
        Ok(())
    }

    #[test]
    fn test_merge_keeps_trusted_fields() -> Result<(), ValidationError> {
        let created = now();
        let mut prior = StackDraft::new("Go Web Server", "")
            .into_new_stack(&owner(), created)?
            .into_stack(StackId::new(9));
        prior.is_locked = true;

        let editor = ActorContext::new("admin-1", "ada");
        let later = created + chrono::Duration::seconds(5);
        let merged = StackDraft::new("Go HTTP Server", "updated").merge_onto(&prior, &editor, later)?;

        assert_eq!(merged.id, prior.id);
        assert_eq!(merged.slug, "go-http-server");
        assert_eq!(merged.details, "updated");
        assert_eq!(merged.owner_id, "owner-1");
        assert!(merged.is_locked);
        assert_eq!(merged.created, created);
        assert_eq!(merged.created_by, "olivia");
        assert_eq!(merged.last_modified, later);
        assert_eq!(merged.last_modified_by, "ada");
        Ok(())
    }

    #[test]
    fn test_merge_rejects_blank_name() -> Result<(), ValidationError> {
        let prior = StackDraft::new("Rust", "")
            .into_new_stack(&owner(), now())?
            .into_stack(StackId::new(1));
        let result = StackDraft::new("  ", "").merge_onto(&prior, &owner(), now());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_history_snapshot_copies_stack() -> Result<(), ValidationError> {
        let stack = StackDraft::new("Rust", "")
            .into_new_stack(&owner(), now())?
            .into_stack(StackId::new(3));
        let record = NewHistoryRecord::snapshot(&stack, StackOperation::Create, &owner(), now())
            .into_record(HistoryId::new(1));
        assert_eq!(record.stack_id, stack.id);
        assert_eq!(record.snapshot, stack);
        assert_eq!(record.operation, StackOperation::Create);
        Ok(())
    }
}
