//! TechStacks Core - Catalog Types and Rules
//!
//! Data structures shared by every other crate, plus the pure pieces of the
//! catalog's business rules: slug derivation, the update merge step, and the
//! ownership/lock authorization policy. No I/O lives here.

pub mod actor;
pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod policy;
pub mod query;
pub mod slug;

pub use actor::{ActorContext, ADMIN_ROLE};
pub use config::CatalogConfig;
pub use entities::{
    Choice, ChoiceDetails, HistoryRecord, NewChoice, NewHistoryRecord, NewStack, NewTechnology,
    Overview, Stack, StackDetails, StackDraft, StackPage, Technology, TechnologyRanking,
    TierChoices, TierRanking, UserRanking,
};
pub use enums::{
    EntityType, OperationParseError, StackOperation, TechnologyTier, TierParseError,
};
pub use error::{
    AuditError, CacheError, ConfigError, PolicyDenial, StorageError, TechStacksError,
    TechStacksResult, ValidationError,
};
pub use identity::{
    now, parse_id, ChoiceId, EntityIdType, HistoryId, IdParseError, StackId, TechnologyId,
    Timestamp,
};
pub use policy::{AuthorizationPolicy, Decision};
pub use query::{StackOrder, StackOrderField, StackQuery};
pub use slug::{slug_for_name, slugify, MAX_SLUG_LEN};
