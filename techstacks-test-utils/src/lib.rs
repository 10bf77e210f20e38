//! TechStacks Test Utilities
//!
//! Shared test infrastructure for the TechStacks workspace:
//! - Proptest generators for catalog types
//! - Failing doubles for the audit log and cache backend
//! - Fixtures for in-memory stores, caches and actors
//! - Custom assertions for catalog-specific results

pub use techstacks_core::{
    now, ActorContext, EntityIdType, EntityType, HistoryRecord, NewHistoryRecord, NewStack,
    PolicyDenial, Stack, StackDraft, StackId, StackOperation, StorageError, TechStacksError,
    TechStacksResult, TechnologyTier, Timestamp, ADMIN_ROLE,
};
pub use techstacks_storage::{
    AuditLog, CacheBackend, CacheConfig, CacheEntry, CacheKey, CacheStats, InMemoryAuditLog,
    InMemoryCacheBackend, InMemoryRepository, ReadThroughCache, StackRepository, StackStore,
};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use techstacks_core::{AuditError, CacheError};

// ============================================================================
// FAILING DOUBLES
// ============================================================================

/// Audit log whose appends always fail. Counts the attempts.
#[derive(Debug, Default)]
pub struct FailingAuditLog {
    attempts: AtomicUsize,
}

impl FailingAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of append calls seen so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditLog for FailingAuditLog {
    async fn append(&self, record: NewHistoryRecord) -> TechStacksResult<HistoryRecord> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::AppendFailed {
            stack_id: record.stack_id.as_i64(),
            reason: "audit store unavailable".to_string(),
        }
        .into())
    }

    async fn history_for(&self, _stack_id: StackId) -> TechStacksResult<Vec<HistoryRecord>> {
        Err(AuditError::ReadFailed {
            reason: "audit store unavailable".to_string(),
        }
        .into())
    }
}

/// Cache backend that misses on every read and fails every write.
#[derive(Debug, Default)]
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &CacheKey) -> TechStacksResult<Option<CacheEntry>> {
        Ok(None)
    }

    async fn put(&self, _key: &CacheKey, _entry: CacheEntry) -> TechStacksResult<()> {
        Err(CacheError::LockPoisoned.into())
    }

    async fn remove(&self, _key: &CacheKey) -> TechStacksResult<bool> {
        Err(CacheError::LockPoisoned.into())
    }

    async fn flush_all(&self) -> TechStacksResult<u64> {
        Err(CacheError::LockPoisoned.into())
    }

    async fn stats(&self) -> TechStacksResult<CacheStats> {
        Ok(CacheStats::default())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalog types.

    use super::*;
    use proptest::prelude::*;

    /// A display name that always yields a non-empty slug.
    pub fn arb_stack_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 .#+-]{0,40}"
    }

    /// Free text with the odd Markdown marker mixed in.
    pub fn arb_details() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-zA-Z0-9 ,.]{1,80}",
            "[a-z ]{1,20}\\*\\*[a-z]{1,10}\\*\\*[a-z ]{0,20}",
        ]
    }

    pub fn arb_user_id() -> impl Strategy<Value = String> {
        "user-[0-9]{1,6}"
    }

    /// An actor without roles.
    pub fn arb_actor() -> impl Strategy<Value = ActorContext> {
        (arb_user_id(), "[a-z]{3,12}").prop_map(|(id, name)| ActorContext::new(id, name))
    }

    pub fn arb_tier() -> impl Strategy<Value = TechnologyTier> {
        proptest::sample::select(TechnologyTier::ALL.to_vec())
    }

    pub fn arb_draft() -> impl Strategy<Value = StackDraft> {
        (arb_stack_name(), arb_details()).prop_map(|(name, details)| StackDraft::new(name, details))
    }

    /// A persisted-looking stack with a random owner and lock flag.
    pub fn arb_stack() -> impl Strategy<Value = Stack> {
        (1i64..100_000, arb_draft(), arb_actor(), any::<bool>()).prop_filter_map(
            "draft must derive a slug",
            |(id, draft, owner, locked)| {
                let mut stack = draft
                    .into_new_stack(&owner, now())
                    .ok()?
                    .into_stack(StackId::new(id));
                stack.is_locked = locked;
                Some(stack)
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;

    pub fn memory_repository() -> Arc<InMemoryRepository> {
        Arc::new(InMemoryRepository::new())
    }

    /// A store over a fresh in-memory repository.
    pub fn memory_store() -> StackStore {
        StackStore::new(memory_repository())
    }

    /// A read-through cache plus a handle on its backend for inspection.
    pub fn memory_cache() -> (Arc<ReadThroughCache>, Arc<InMemoryCacheBackend>) {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = Arc::new(ReadThroughCache::with_defaults(backend.clone()));
        (cache, backend)
    }

    pub fn memory_audit() -> Arc<InMemoryAuditLog> {
        Arc::new(InMemoryAuditLog::new())
    }

    /// Owner of the stacks in most scenarios.
    pub fn owner_actor() -> ActorContext {
        ActorContext::new("owner-1", "olivia")
    }

    /// A signed-in user who owns nothing.
    pub fn other_actor() -> ActorContext {
        ActorContext::new("other-2", "oscar")
    }

    pub fn admin_actor() -> ActorContext {
        ActorContext::new("admin-3", "ada").with_role(ADMIN_ROLE)
    }

    pub fn sample_draft() -> StackDraft {
        StackDraft::new("Go Web Server", "net/http with **chi**")
    }

    /// A fully derived stack owned by [`owner_actor`].
    pub fn sample_new_stack() -> TechStacksResult<NewStack> {
        Ok(sample_draft().into_new_stack(&owner_actor(), now())?)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for catalog-specific results.

    use super::*;

    /// Assert that a result is a NotFound storage error for `entity_type`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(
        result: &TechStacksResult<T>,
        entity_type: EntityType,
    ) {
        match result {
            Err(TechStacksError::Storage(StorageError::NotFound {
                entity_type: et, ..
            })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that a result is a policy denial with the given reason.
    #[track_caller]
    pub fn assert_denied<T: std::fmt::Debug>(result: &TechStacksResult<T>, reason: PolicyDenial) {
        match result {
            Err(TechStacksError::Unauthorized(denial)) => {
                assert_eq!(*denial, reason, "Wrong denial reason");
            }
            other => panic!("Expected Unauthorized({:?}), got: {:?}", reason, other),
        }
    }

    /// Assert that a stack's slug matches the slug derived from its name.
    #[track_caller]
    pub fn assert_slug_matches(stack: &Stack) {
        assert_eq!(
            stack.slug,
            techstacks_core::slugify(&stack.name),
            "slug out of sync with name"
        );
    }

    /// Assert the operation tags of a history trail, oldest first.
    #[track_caller]
    pub fn assert_history_ops(records: &[HistoryRecord], expected: &[StackOperation]) {
        let ops: Vec<StackOperation> = records.iter().map(|r| r.operation).collect();
        assert_eq!(ops, expected, "unexpected history operations");
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixture_actors_roles() {
        assert!(fixtures::admin_actor().is_admin(ADMIN_ROLE));
        assert!(!fixtures::owner_actor().is_admin(ADMIN_ROLE));
        assert_ne!(fixtures::owner_actor().user_id, fixtures::other_actor().user_id);
    }

    #[test]
    fn test_sample_new_stack_slug() -> TechStacksResult<()> {
        let new = fixtures::sample_new_stack()?;
        assert_eq!(new.slug, "go-web-server");
        assert_eq!(new.owner_id, "owner-1");
        Ok(())
    }

    #[test]
    fn test_assertion_not_found() {
        let result: TechStacksResult<()> =
            Err(StorageError::not_found(EntityType::Stack, "missing").into());
        assertions::assert_not_found(&result, EntityType::Stack);
    }

    #[test]
    fn test_assertion_denied() {
        let result: TechStacksResult<()> = Err(PolicyDenial::Locked.into());
        assertions::assert_denied(&result, PolicyDenial::Locked);
    }

    #[test]
    fn test_failing_audit_log_counts_attempts() {
        let log = FailingAuditLog::new();
        assert_eq!(log.attempts(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_names_slugify(name in generators::arb_stack_name()) {
            prop_assert!(techstacks_core::slug_for_name(&name).is_ok());
        }

        #[test]
        fn prop_generated_stacks_have_consistent_slugs(stack in generators::arb_stack()) {
            assertions::assert_slug_matches(&stack);
        }
    }
}
