//! Catalog reads and writes composed over a [`StackRepository`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use techstacks_core::{
    Choice, ChoiceDetails, ChoiceId, EntityType, NewChoice, NewStack, NewTechnology, Overview,
    Stack, StackDetails, StackId, StackPage, StackQuery, StorageError, TechStacksResult,
    Technology, TechnologyId, TechnologyRanking, TechnologyTier, TierChoices, TierRanking,
};

use crate::repository::StackRepository;

/// Sizes of the overview sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewLimits {
    pub latest_stacks: usize,
    pub top_users: usize,
    pub top_technologies: usize,
    pub per_tier: usize,
}

impl Default for OverviewLimits {
    fn default() -> Self {
        Self {
            latest_stacks: 20,
            top_users: 20,
            top_technologies: 20,
            per_tier: 5,
        }
    }
}

/// How a `slug_or_id` lookup string was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackLookup {
    Id(StackId),
    Slug(String),
}

impl StackLookup {
    /// A value that parses as an integer is an id; anything else is a slug.
    pub fn parse(slug_or_id: &str) -> Self {
        match slug_or_id.parse::<StackId>() {
            Ok(id) => StackLookup::Id(id),
            Err(_) => StackLookup::Slug(slug_or_id.to_string()),
        }
    }
}

/// CRUD and query operations against persistent storage.
///
/// Writes re-read the row after persisting so callers always see what
/// storage holds, including storage-side defaults.
#[derive(Clone)]
pub struct StackStore {
    repo: Arc<dyn StackRepository>,
}

impl StackStore {
    pub fn new(repo: Arc<dyn StackRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn StackRepository> {
        &self.repo
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Persist a fully derived stack and return the stored row.
    pub async fn create(&self, new: NewStack) -> TechStacksResult<Stack> {
        let id = self.repo.stack_insert(&new).await?;
        self.get_by_id(id).await
    }

    /// Overwrite an existing stack and return the stored row.
    pub async fn update(&self, stack: &Stack) -> TechStacksResult<Stack> {
        self.repo.stack_update(stack).await?;
        self.get_by_id(stack.id).await
    }

    /// Delete a stack and its choices. Returns the row as it was before
    /// deletion.
    pub async fn delete(&self, id: StackId) -> TechStacksResult<Stack> {
        let existing = self.get_by_id(id).await?;
        self.repo.stack_delete(id).await?;
        Ok(existing)
    }

    // ========================================================================
    // SINGLE-STACK READS
    // ========================================================================

    pub async fn get_by_id(&self, id: StackId) -> TechStacksResult<Stack> {
        self.repo
            .stack_get(id)
            .await?
            .ok_or_else(|| StorageError::not_found(EntityType::Stack, id).into())
    }

    /// Resolve a slug or numeric id.
    ///
    /// A numeric value is looked up by id only, with no slug fallback. Any
    /// other value is matched against slugs ignoring case.
    pub async fn get_by_slug(&self, slug_or_id: &str) -> TechStacksResult<Stack> {
        match StackLookup::parse(slug_or_id) {
            StackLookup::Id(id) => self.get_by_id(id).await,
            StackLookup::Slug(slug) => self
                .repo
                .stack_get_by_slug(&slug)
                .await?
                .ok_or_else(|| StorageError::not_found(EntityType::Stack, slug).into()),
        }
    }

    /// A single stack with its tier/choice breakdown.
    pub async fn details_by_slug(&self, slug_or_id: &str) -> TechStacksResult<StackDetails> {
        let stack = self.get_by_slug(slug_or_id).await?;
        let mut details = self.enrich_with_children(vec![stack]).await?;
        details
            .pop()
            .ok_or_else(|| StorageError::not_found(EntityType::Stack, slug_or_id).into())
    }

    // ========================================================================
    // LISTINGS
    // ========================================================================

    pub async fn list(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        self.repo.stack_list(limit).await
    }

    /// Stacks for the tier listing.
    ///
    /// With a tier, returns stacks that have at least one choice, one row
    /// per stack. The tier value itself does not narrow the result.
    /// Without a tier, returns the plain listing. Both are capped at `limit`.
    pub async fn list_by_tier(
        &self,
        tier: Option<TechnologyTier>,
        limit: usize,
    ) -> TechStacksResult<Vec<Stack>> {
        match tier {
            Some(_) => self.repo.stack_list_with_choices(limit).await,
            None => self.repo.stack_list(limit).await,
        }
    }

    /// The `limit` most recently created stacks with their choices.
    pub async fn list_recent_with_children(
        &self,
        limit: usize,
    ) -> TechStacksResult<Vec<StackDetails>> {
        let stacks = self.repo.stack_list_recent(limit).await?;
        self.enrich_with_children(stacks).await
    }

    pub async fn find(&self, query: &StackQuery) -> TechStacksResult<StackPage> {
        query.validate()?;
        let (results, total) = self.repo.stack_find(query).await?;
        Ok(StackPage {
            offset: query.offset(),
            total,
            results,
        })
    }

    // ========================================================================
    // ENRICHMENT AND AGGREGATES
    // ========================================================================

    /// Attach each stack's choices, grouped by tier in tier display order.
    /// Input order is preserved.
    pub async fn enrich_with_children(
        &self,
        stacks: Vec<Stack>,
    ) -> TechStacksResult<Vec<StackDetails>> {
        if stacks.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<StackId> = stacks.iter().map(|s| s.id).collect();
        let choices = self.repo.choices_for_stacks(&ids).await?;

        let tech_ids: Vec<TechnologyId> = choices.iter().map(|c| c.technology_id).collect();
        let technologies: HashMap<TechnologyId, Technology> = self
            .repo
            .technologies_by_ids(&tech_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut by_stack: HashMap<StackId, BTreeMap<TechnologyTier, Vec<ChoiceDetails>>> =
            HashMap::new();
        for choice in choices {
            let Some(tech) = technologies.get(&choice.technology_id) else {
                continue;
            };
            by_stack
                .entry(choice.stack_id)
                .or_default()
                .entry(choice.tier)
                .or_default()
                .push(ChoiceDetails {
                    choice_id: choice.id,
                    technology_id: tech.id,
                    technology_name: tech.name.clone(),
                    technology_slug: tech.slug.clone(),
                    justification: choice.justification,
                });
        }

        Ok(stacks
            .into_iter()
            .map(|stack| {
                let tiers = by_stack
                    .remove(&stack.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(tier, choices)| TierChoices {
                        tier,
                        title: tier.title().to_string(),
                        choices,
                    })
                    .collect();
                StackDetails { stack, tiers }
            })
            .collect())
    }

    /// Landing-page aggregate.
    pub async fn overview(&self, limits: &OverviewLimits) -> TechStacksResult<Overview> {
        let latest = self
            .repo
            .stack_list_recently_modified(limits.latest_stacks)
            .await?;
        let latest_stacks = self.enrich_with_children(latest).await?;
        let top_users = self.repo.top_users(limits.top_users).await?;
        let rankings = self.repo.technology_rankings().await?;

        let top_technologies = rankings
            .iter()
            .take(limits.top_technologies)
            .cloned()
            .collect();
        let top_technologies_by_tier = rank_by_tier(&rankings, limits.per_tier);

        Ok(Overview {
            latest_stacks,
            top_users,
            top_technologies,
            top_technologies_by_tier,
        })
    }

    // ========================================================================
    // CHOICES, TECHNOLOGIES, FAVORITES
    // ========================================================================

    pub async fn add_choice(&self, new: NewChoice) -> TechStacksResult<Choice> {
        self.repo.choice_insert(&new).await
    }

    pub async fn remove_choice(&self, stack_id: StackId, choice_id: ChoiceId) -> TechStacksResult<()> {
        self.repo.choice_delete(stack_id, choice_id).await
    }

    pub async fn create_technology(&self, new: NewTechnology) -> TechStacksResult<Technology> {
        self.repo.technology_insert(&new).await
    }

    pub async fn get_technology(&self, id: TechnologyId) -> TechStacksResult<Technology> {
        self.repo
            .technology_get(id)
            .await?
            .ok_or_else(|| StorageError::not_found(EntityType::Technology, id).into())
    }

    pub async fn list_technologies(&self) -> TechStacksResult<Vec<Technology>> {
        self.repo.technology_list().await
    }

    pub async fn favorite(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool> {
        self.repo.favorite_add(user_id, stack_id).await
    }

    pub async fn unfavorite(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool> {
        self.repo.favorite_remove(user_id, stack_id).await
    }

    pub async fn health_check(&self) -> TechStacksResult<bool> {
        self.repo.health_check().await
    }
}

impl std::fmt::Debug for StackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackStore").finish_non_exhaustive()
    }
}

/// Group pre-ranked technologies by tier, keeping the top `per_tier` of
/// each. Tiers without any chosen technology are omitted.
fn rank_by_tier(rankings: &[TechnologyRanking], per_tier: usize) -> Vec<TierRanking> {
    TechnologyTier::ALL
        .into_iter()
        .filter_map(|tier| {
            let technologies: Vec<TechnologyRanking> = rankings
                .iter()
                .filter(|r| r.tier == tier)
                .take(per_tier)
                .cloned()
                .collect();
            (!technologies.is_empty()).then(|| TierRanking {
                tier,
                title: tier.title().to_string(),
                technologies,
            })
        })
        .collect()
}
