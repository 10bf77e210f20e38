//! Persistence contract for catalog entities.
//!
//! Implementations: [`crate::InMemoryRepository`] here and the PostgreSQL
//! client in `techstacks-api`. Methods are single-purpose; composition
//! (re-reads, enrichment, overview aggregation) lives in [`crate::StackStore`].

use async_trait::async_trait;
use techstacks_core::{
    Choice, ChoiceId, NewChoice, NewStack, NewTechnology, Stack, StackId, StackQuery,
    TechStacksResult, Technology, TechnologyId, TechnologyRanking, UserRanking,
};

#[async_trait]
pub trait StackRepository: Send + Sync {
    // ========================================================================
    // STACK OPERATIONS
    // ========================================================================

    /// Insert a new stack and return its assigned id.
    async fn stack_insert(&self, new: &NewStack) -> TechStacksResult<StackId>;

    /// Get a stack by id.
    async fn stack_get(&self, id: StackId) -> TechStacksResult<Option<Stack>>;

    /// Get a stack by slug, ignoring ASCII case.
    async fn stack_get_by_slug(&self, slug: &str) -> TechStacksResult<Option<Stack>>;

    /// Overwrite every column of an existing stack.
    ///
    /// Fails with `StorageError::NotFound` when the id is absent.
    async fn stack_update(&self, stack: &Stack) -> TechStacksResult<()>;

    /// Delete a stack together with its choices and favorites.
    ///
    /// The cascade is atomic per backend. Fails with `StorageError::NotFound`
    /// when the id is absent.
    async fn stack_delete(&self, id: StackId) -> TechStacksResult<()>;

    /// Stacks ordered by id ascending, at most `limit`.
    async fn stack_list(&self, limit: usize) -> TechStacksResult<Vec<Stack>>;

    /// Stacks that have at least one choice, one row per stack, ordered by
    /// id ascending, at most `limit`.
    async fn stack_list_with_choices(&self, limit: usize) -> TechStacksResult<Vec<Stack>>;

    /// Most recently created stacks (id descending).
    async fn stack_list_recent(&self, limit: usize) -> TechStacksResult<Vec<Stack>>;

    /// Most recently modified stacks (last_modified descending).
    async fn stack_list_recently_modified(&self, limit: usize) -> TechStacksResult<Vec<Stack>>;

    /// Apply a caller-defined filter. Returns the requested page and the
    /// total number of matches.
    async fn stack_find(&self, query: &StackQuery) -> TechStacksResult<(Vec<Stack>, usize)>;

    // ========================================================================
    // CHOICE OPERATIONS
    // ========================================================================

    async fn choice_insert(&self, new: &NewChoice) -> TechStacksResult<Choice>;

    /// Remove one choice from a stack. NotFound when the pair does not exist.
    async fn choice_delete(&self, stack_id: StackId, choice_id: ChoiceId) -> TechStacksResult<()>;

    /// Choices belonging to any of the given stacks, ordered by choice id.
    async fn choices_for_stacks(&self, stack_ids: &[StackId]) -> TechStacksResult<Vec<Choice>>;

    // ========================================================================
    // TECHNOLOGY OPERATIONS
    // ========================================================================

    async fn technology_insert(&self, new: &NewTechnology) -> TechStacksResult<Technology>;

    async fn technology_get(&self, id: TechnologyId) -> TechStacksResult<Option<Technology>>;

    async fn technology_list(&self) -> TechStacksResult<Vec<Technology>>;

    async fn technologies_by_ids(&self, ids: &[TechnologyId]) -> TechStacksResult<Vec<Technology>>;

    // ========================================================================
    // FAVORITES
    // ========================================================================

    /// Returns `true` when the favorite was newly recorded.
    async fn favorite_add(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool>;

    /// Returns `true` when a favorite was removed.
    async fn favorite_remove(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool>;

    // ========================================================================
    // AGGREGATES
    // ========================================================================

    /// Stack owners ranked by favorites received on their stacks. Owners
    /// with no favorites are omitted.
    async fn top_users(&self, limit: usize) -> TechStacksResult<Vec<UserRanking>>;

    /// Every technology chosen by at least one stack, ranked by the number of
    /// distinct stacks choosing it (ties by name).
    async fn technology_rankings(&self) -> TechStacksResult<Vec<TechnologyRanking>>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn health_check(&self) -> TechStacksResult<bool>;
}
