//! Error types for catalog operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: String,
        reason: String,
    },

    #[error("Delete failed for {entity_type:?} with id {id}: {reason}")]
    DeleteFailed {
        entity_type: EntityType,
        id: String,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Backend error: {reason}")]
    Backend { reason: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StorageError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity_type: EntityType, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Reasons the authorization policy refuses a mutation.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PolicyDenial {
    #[error("Stack is locked and can only be modified by an administrator")]
    Locked,

    #[error("Only the owner or an administrator may modify this stack")]
    NotOwner,
}

impl PolicyDenial {
    /// Label for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            PolicyDenial::Locked => "locked",
            PolicyDenial::NotOwner => "not_owner",
        }
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// History ledger errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("Failed to append history record for stack {stack_id}: {reason}")]
    AppendFailed { stack_id: i64, reason: String },

    #[error("Failed to read history: {reason}")]
    ReadFailed { reason: String },
}

/// Cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Failed to serialize cache entry {key}: {reason}")]
    Serialization { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all catalog errors.
#[derive(Debug, Clone, Error)]
pub enum TechStacksError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] PolicyDenial),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl TechStacksError {
    /// True when the underlying cause is a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TechStacksError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for catalog operations.
pub type TechStacksResult<T> = Result<T, TechStacksError>;

// =============================================================================
// TESTS
// =============================================================================
