//! Stack Service
//!
//! Every mutation runs the same sequence: resolve the target, authorize,
//! derive fields, write, append history, flush the cache, project. Reads go
//! through the read-through cache where the operation is cached and straight
//! to the store otherwise. Reads carry no authorization gate.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use techstacks_core::{
    now, ActorContext, AuthorizationPolicy, CatalogConfig, Choice, ChoiceId, Decision,
    NewChoice, NewHistoryRecord, NewTechnology, Overview, Stack, StackDraft, StackId,
    StackOperation, StackQuery, TechStacksError, TechStacksResult, TechnologyTier,
};
use techstacks_storage::{
    AuditLog, CacheKey, CacheStats, OverviewLimits, ReadThroughCache, StackStore,
};
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;
use crate::types::{
    AddChoiceRequest, ConfigOptionsResponse, CreateTechnologyRequest, DeleteStackResponse,
    FavoriteResponse, FindStacksResponse, ListTechnologiesResponse, StackDetailsResponse,
    StackHistoryResponse, StackResponse, TechnologyResponse,
};
use crate::utils::{DetailsRenderer, MarkdownRenderer};

/// Catalog orchestration over a store, an audit log and a cache.
#[derive(Clone)]
pub struct StackService {
    store: StackStore,
    audit: Arc<dyn AuditLog>,
    cache: Arc<ReadThroughCache>,
    policy: AuthorizationPolicy,
    config: CatalogConfig,
    renderer: Arc<dyn DetailsRenderer>,
}

impl StackService {
    pub fn new(
        store: StackStore,
        audit: Arc<dyn AuditLog>,
        cache: Arc<ReadThroughCache>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            store,
            audit,
            cache,
            policy: config.policy(),
            config,
            renderer: Arc::new(MarkdownRenderer::new()),
        }
    }

    /// Replace the renderer used for `details_html`.
    pub fn with_renderer(mut self, renderer: Arc<dyn DetailsRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn store(&self) -> &StackStore {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ReadThroughCache> {
        &self.cache
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // ========================================================================
    // STACK MUTATIONS
    // ========================================================================

    /// Create a stack owned by `actor`.
    pub async fn create(&self, actor: &ActorContext, draft: StackDraft) -> ApiResult<StackResponse> {
        let result = self.try_create(actor, draft).await;
        let stack = self.finish(StackOperation::Create, result)?;
        Ok(self.render(stack))
    }

    /// Apply the draft's editable fields to an existing stack.
    pub async fn update(
        &self,
        actor: &ActorContext,
        id: StackId,
        draft: StackDraft,
    ) -> ApiResult<StackResponse> {
        let result = self.try_update(actor, id, draft).await;
        let stack = self.finish(StackOperation::Update, result)?;
        Ok(self.render(stack))
    }

    /// Delete a stack and its choices.
    pub async fn delete(&self, actor: &ActorContext, id: StackId) -> ApiResult<DeleteStackResponse> {
        let result = self.try_delete(actor, id).await;
        let removed = self.finish(StackOperation::Delete, result)?;
        Ok(DeleteStackResponse { id: removed.id })
    }

    async fn try_create(&self, actor: &ActorContext, draft: StackDraft) -> TechStacksResult<Stack> {
        let new = draft.into_new_stack(actor, now())?;
        let stack = self.store.create(new).await?;
        self.commit(actor, StackOperation::Create, &stack).await;
        Ok(stack)
    }

    async fn try_update(
        &self,
        actor: &ActorContext,
        id: StackId,
        draft: StackDraft,
    ) -> TechStacksResult<Stack> {
        let prior = self.store.get_by_id(id).await?;
        self.authorize(actor, &prior, StackOperation::Update)?;
        let merged = draft.merge_onto(&prior, actor, now())?;
        let stack = self.store.update(&merged).await?;
        self.commit(actor, StackOperation::Update, &stack).await;
        Ok(stack)
    }

    async fn try_delete(&self, actor: &ActorContext, id: StackId) -> TechStacksResult<Stack> {
        let prior = self.store.get_by_id(id).await?;
        self.authorize(actor, &prior, StackOperation::Delete)?;
        let removed = self.store.delete(id).await?;
        self.commit(actor, StackOperation::Delete, &removed).await;
        Ok(removed)
    }

    fn authorize(
        &self,
        actor: &ActorContext,
        stack: &Stack,
        op: StackOperation,
    ) -> TechStacksResult<()> {
        if let Decision::Deny(reason) = self.policy.authorize(actor, stack, op) {
            warn!(
                stack_id = %stack.id,
                operation = op.label(),
                user_id = %actor.user_id,
                reason = reason.label(),
                "Stack mutation denied"
            );
            return Err(reason.into());
        }
        Ok(())
    }

    /// History append and cache flush after a durable write. Neither failure
    /// undoes the write.
    async fn commit(&self, actor: &ActorContext, op: StackOperation, stack: &Stack) {
        let record = NewHistoryRecord::snapshot(stack, op, actor, now());
        if let Err(e) = self.audit.append(record).await {
            warn!(
                stack_id = %stack.id,
                operation = op.label(),
                error = %e,
                "History append failed, mutation kept"
            );
            if let Ok(metrics) = METRICS.as_ref() {
                metrics.record_audit_failure(op.label());
            }
        }

        self.invalidate().await;

        info!(
            stack_id = %stack.id,
            operation = op.label(),
            actor = %actor.user_name,
            "Stack mutation committed"
        );
    }

    fn finish(&self, op: StackOperation, result: TechStacksResult<Stack>) -> ApiResult<Stack> {
        let status = match &result {
            Ok(_) => "committed",
            Err(TechStacksError::Unauthorized(_)) => "rejected",
            Err(_) => "failed",
        };
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_mutation(op.label(), status);
        }
        result.map_err(ApiError::from)
    }

    async fn invalidate(&self) {
        match self.cache.flush_all().await {
            Ok(removed) => {
                debug!(removed, "Cache flushed");
                if let Ok(metrics) = METRICS.as_ref() {
                    metrics.record_cache_flush();
                }
            }
            Err(e) => error!(error = %e, "Cache flush failed after commit"),
        }
    }

    // ========================================================================
    // CHOICES, TECHNOLOGIES, FAVORITES
    // ========================================================================

    /// Add a technology to a stack. Needs the same rights as an update; the
    /// tier comes from the technology.
    pub async fn add_choice(
        &self,
        actor: &ActorContext,
        stack_id: StackId,
        request: AddChoiceRequest,
    ) -> ApiResult<Choice> {
        let stack = self.store.get_by_id(stack_id).await?;
        self.authorize(actor, &stack, StackOperation::Update)?;
        let technology = self.store.get_technology(request.technology_id).await?;

        let choice = self
            .store
            .add_choice(NewChoice {
                stack_id,
                technology_id: technology.id,
                tier: technology.tier,
                justification: request.justification,
                created: now(),
                created_by: actor.user_name.clone(),
            })
            .await?;

        self.invalidate().await;
        info!(
            stack_id = %stack_id,
            choice_id = %choice.id,
            technology = %technology.slug,
            "Choice added"
        );
        Ok(choice)
    }

    pub async fn remove_choice(
        &self,
        actor: &ActorContext,
        stack_id: StackId,
        choice_id: ChoiceId,
    ) -> ApiResult<()> {
        let stack = self.store.get_by_id(stack_id).await?;
        self.authorize(actor, &stack, StackOperation::Update)?;
        self.store.remove_choice(stack_id, choice_id).await?;

        self.invalidate().await;
        info!(stack_id = %stack_id, choice_id = %choice_id, "Choice removed");
        Ok(())
    }

    pub async fn create_technology(
        &self,
        actor: &ActorContext,
        request: CreateTechnologyRequest,
    ) -> ApiResult<TechnologyResponse> {
        let new = NewTechnology::build(request.name, request.tier, request.details, actor, now())?;
        let technology = self.store.create_technology(new).await?;

        self.invalidate().await;
        info!(technology_id = %technology.id, slug = %technology.slug, "Technology created");
        Ok(TechnologyResponse::render(technology, self.renderer.as_ref()))
    }

    pub async fn list_technologies(&self) -> ApiResult<ListTechnologiesResponse> {
        let technologies: Vec<TechnologyResponse> = self
            .store
            .list_technologies()
            .await?
            .into_iter()
            .map(|t| TechnologyResponse::render(t, self.renderer.as_ref()))
            .collect();
        let total = technologies.len();
        Ok(ListTechnologiesResponse {
            technologies,
            total,
        })
    }

    pub async fn favorite(&self, actor: &ActorContext, stack_id: StackId) -> ApiResult<FavoriteResponse> {
        self.store.get_by_id(stack_id).await?;
        let changed = self.store.favorite(&actor.user_id, stack_id).await?;
        if changed {
            self.invalidate().await;
        }
        Ok(FavoriteResponse {
            stack_id,
            favorited: true,
            changed,
        })
    }

    pub async fn unfavorite(
        &self,
        actor: &ActorContext,
        stack_id: StackId,
    ) -> ApiResult<FavoriteResponse> {
        self.store.get_by_id(stack_id).await?;
        let changed = self.store.unfavorite(&actor.user_id, stack_id).await?;
        if changed {
            self.invalidate().await;
        }
        Ok(FavoriteResponse {
            stack_id,
            favorited: false,
            changed,
        })
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Single stack with its choices, cached under the raw lookup string.
    ///
    /// `reload` drops just this key before the lookup.
    pub async fn get_by_slug(
        &self,
        slug_or_id: &str,
        reload: bool,
    ) -> ApiResult<StackDetailsResponse> {
        let key = CacheKey::stack(slug_or_id);
        if reload {
            let removed = self.cache.remove(&key).await?;
            debug!(key = %key, removed, "Cache entry reloaded");
        }

        self.cached(&key, || async move {
            let details = self.store.details_by_slug(slug_or_id).await?;
            Ok::<_, TechStacksError>(StackDetailsResponse::render(
                details,
                self.renderer.as_ref(),
            ))
        })
        .await
    }

    /// Uncached listing, capped at the configured limit.
    pub async fn list(&self) -> ApiResult<Vec<StackResponse>> {
        let stacks = self.store.list(self.config.stack_list_limit).await?;
        Ok(self.render_all(stacks))
    }

    pub async fn list_by_tier(&self, tier: Option<TechnologyTier>) -> ApiResult<Vec<StackResponse>> {
        let stacks = self
            .store
            .list_by_tier(tier, self.config.stack_list_limit)
            .await?;
        Ok(self.render_all(stacks))
    }

    pub async fn list_recent_with_children(&self) -> ApiResult<Vec<StackDetailsResponse>> {
        let details = self
            .store
            .list_recent_with_children(self.config.recent_limit)
            .await?;
        Ok(details
            .into_iter()
            .map(|d| StackDetailsResponse::render(d, self.renderer.as_ref()))
            .collect())
    }

    /// Landing-page aggregate. `reload` flushes the whole cache first.
    pub async fn overview(&self, reload: bool) -> ApiResult<Overview> {
        if reload {
            self.invalidate().await;
        }

        let limits = OverviewLimits {
            latest_stacks: self.config.overview_limit,
            top_users: self.config.overview_limit,
            top_technologies: self.config.overview_limit,
            per_tier: self.config.top_by_tier_limit,
        };
        self.cached(&CacheKey::overview(), || async move {
            self.store.overview(&limits).await
        })
        .await
    }

    pub fn config_options(&self) -> ConfigOptionsResponse {
        ConfigOptionsResponse::all_tiers()
    }

    /// Filtered listing cached under the full query string it was parsed from.
    pub async fn find(&self, raw_query: &str, query: &StackQuery) -> ApiResult<FindStacksResponse> {
        let key = CacheKey::find_stacks(raw_query);
        self.cached(&key, || async move {
            let page = self.store.find(query).await?;
            Ok::<_, TechStacksError>(FindStacksResponse {
                offset: page.offset,
                total: page.total,
                results: self.render_all(page.results),
            })
        })
        .await
    }

    /// History of a stack, oldest first. Deleted stacks keep their trail.
    pub async fn history(&self, stack_id: StackId) -> ApiResult<StackHistoryResponse> {
        let records = self.audit.history_for(stack_id).await?;
        Ok(StackHistoryResponse { stack_id, records })
    }

    pub async fn cache_stats(&self) -> ApiResult<CacheStats> {
        Ok(self.cache.stats().await?)
    }

    pub async fn health_check(&self) -> ApiResult<bool> {
        Ok(self.store.health_check().await?)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    async fn cached<T, F, Fut>(&self, key: &CacheKey, compute: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = TechStacksResult<T>>,
    {
        let read = self.cache.get_or_compute(key, compute).await?;
        debug!(key = %key, outcome = read.outcome.label(), "Cache lookup");
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_cache_lookup(key.kind(), read.is_hit());
        }
        Ok(read.into_value())
    }

    fn render(&self, stack: Stack) -> StackResponse {
        StackResponse::render(stack, self.renderer.as_ref())
    }

    fn render_all(&self, stacks: Vec<Stack>) -> Vec<StackResponse> {
        stacks.into_iter().map(|s| self.render(s)).collect()
    }
}

impl std::fmt::Debug for StackService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackService")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
