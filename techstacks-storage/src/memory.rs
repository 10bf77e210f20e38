//! In-memory repository backed by a single lock-guarded table set.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use techstacks_core::{
    Choice, ChoiceId, EntityIdType, EntityType, NewChoice, NewStack, NewTechnology, Stack,
    StackId, StackQuery, StorageError, TechStacksResult, Technology, TechnologyId,
    TechnologyRanking, UserRanking, ValidationError,
};

use crate::repository::StackRepository;

#[derive(Debug, Default)]
struct Tables {
    stacks: BTreeMap<StackId, Stack>,
    choices: BTreeMap<ChoiceId, Choice>,
    technologies: BTreeMap<TechnologyId, Technology>,
    favorites: BTreeSet<(String, StackId)>,
    last_stack_id: i64,
    last_choice_id: i64,
    last_technology_id: i64,
}

/// Repository used by tests and the default `memory` storage backend.
///
/// Every operation takes the lock once, so multi-row writes such as the
/// delete cascade are atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TechStacksResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> TechStacksResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    /// Number of stored stacks.
    pub fn stack_count(&self) -> TechStacksResult<usize> {
        Ok(self.read()?.stacks.len())
    }

    /// Number of stored choices across all stacks.
    pub fn choice_count(&self) -> TechStacksResult<usize> {
        Ok(self.read()?.choices.len())
    }
}

#[async_trait]
impl StackRepository for InMemoryRepository {
    async fn stack_insert(&self, new: &NewStack) -> TechStacksResult<StackId> {
        let mut tables = self.write()?;
        tables.last_stack_id += 1;
        let id = StackId::new(tables.last_stack_id);
        tables.stacks.insert(id, new.clone().into_stack(id));
        Ok(id)
    }

    async fn stack_get(&self, id: StackId) -> TechStacksResult<Option<Stack>> {
        Ok(self.read()?.stacks.get(&id).cloned())
    }

    async fn stack_get_by_slug(&self, slug: &str) -> TechStacksResult<Option<Stack>> {
        let tables = self.read()?;
        let slug = slug.to_lowercase();
        Ok(tables
            .stacks
            .values()
            .find(|s| s.slug.to_lowercase() == slug)
            .cloned())
    }

    async fn stack_update(&self, stack: &Stack) -> TechStacksResult<()> {
        let mut tables = self.write()?;
        let existing = tables
            .stacks
            .get_mut(&stack.id)
            .ok_or_else(|| StorageError::not_found(EntityType::Stack, stack.id))?;
        *existing = stack.clone();
        Ok(())
    }

    async fn stack_delete(&self, id: StackId) -> TechStacksResult<()> {
        let mut tables = self.write()?;
        if tables.stacks.remove(&id).is_none() {
            return Err(StorageError::not_found(EntityType::Stack, id).into());
        }
        tables.choices.retain(|_, c| c.stack_id != id);
        tables.favorites.retain(|(_, stack_id)| *stack_id != id);
        Ok(())
    }

    async fn stack_list(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        Ok(self.read()?.stacks.values().take(limit).cloned().collect())
    }

    async fn stack_list_with_choices(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        let tables = self.read()?;
        let mut seen = HashSet::new();
        let mut stacks = Vec::new();
        // Join order, first occurrence wins.
        for choice in tables.choices.values() {
            if !seen.insert(choice.stack_id) {
                continue;
            }
            if let Some(stack) = tables.stacks.get(&choice.stack_id) {
                stacks.push(stack.clone());
            }
        }
        stacks.sort_by_key(|s| s.id);
        stacks.truncate(limit);
        Ok(stacks)
    }

    async fn stack_list_recent(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        Ok(self
            .read()?
            .stacks
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stack_list_recently_modified(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        let mut stacks: Vec<Stack> = self.read()?.stacks.values().cloned().collect();
        stacks.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.id.cmp(&a.id))
        });
        stacks.truncate(limit);
        Ok(stacks)
    }

    async fn stack_find(&self, query: &StackQuery) -> TechStacksResult<(Vec<Stack>, usize)> {
        let order = query.order()?;
        let mut matches: Vec<Stack> = self
            .read()?
            .stacks
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| order.compare(a, b));
        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .collect();
        Ok((page, total))
    }

    async fn choice_insert(&self, new: &NewChoice) -> TechStacksResult<Choice> {
        let mut tables = self.write()?;
        if !tables.stacks.contains_key(&new.stack_id) {
            return Err(StorageError::not_found(EntityType::Stack, new.stack_id).into());
        }
        if !tables.technologies.contains_key(&new.technology_id) {
            return Err(StorageError::not_found(EntityType::Technology, new.technology_id).into());
        }
        tables.last_choice_id += 1;
        let choice = new.clone().into_choice(ChoiceId::new(tables.last_choice_id));
        tables.choices.insert(choice.id, choice.clone());
        Ok(choice)
    }

    async fn choice_delete(&self, stack_id: StackId, choice_id: ChoiceId) -> TechStacksResult<()> {
        let mut tables = self.write()?;
        let belongs = tables
            .choices
            .get(&choice_id)
            .is_some_and(|c| c.stack_id == stack_id);
        if !belongs {
            return Err(StorageError::not_found(EntityType::Choice, choice_id).into());
        }
        tables.choices.remove(&choice_id);
        Ok(())
    }

    async fn choices_for_stacks(&self, stack_ids: &[StackId]) -> TechStacksResult<Vec<Choice>> {
        let wanted: HashSet<StackId> = stack_ids.iter().copied().collect();
        Ok(self
            .read()?
            .choices
            .values()
            .filter(|c| wanted.contains(&c.stack_id))
            .cloned()
            .collect())
    }

    async fn technology_insert(&self, new: &NewTechnology) -> TechStacksResult<Technology> {
        let mut tables = self.write()?;
        if tables
            .technologies
            .values()
            .any(|t| t.slug.eq_ignore_ascii_case(&new.slug))
        {
            return Err(ValidationError::ConstraintViolation {
                constraint: "technologies_slug_key".to_string(),
                reason: format!("slug '{}' already exists", new.slug),
            }
            .into());
        }
        tables.last_technology_id += 1;
        let technology = new
            .clone()
            .into_technology(TechnologyId::new(tables.last_technology_id));
        tables.technologies.insert(technology.id, technology.clone());
        Ok(technology)
    }

    async fn technology_get(&self, id: TechnologyId) -> TechStacksResult<Option<Technology>> {
        Ok(self.read()?.technologies.get(&id).cloned())
    }

    async fn technology_list(&self) -> TechStacksResult<Vec<Technology>> {
        Ok(self.read()?.technologies.values().cloned().collect())
    }

    async fn technologies_by_ids(&self, ids: &[TechnologyId]) -> TechStacksResult<Vec<Technology>> {
        let tables = self.read()?;
        Ok(ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| tables.technologies.get(id).cloned())
            .collect())
    }

    async fn favorite_add(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool> {
        let mut tables = self.write()?;
        if !tables.stacks.contains_key(&stack_id) {
            return Err(StorageError::not_found(EntityType::Stack, stack_id).into());
        }
        Ok(tables.favorites.insert((user_id.to_string(), stack_id)))
    }

    async fn favorite_remove(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool> {
        let mut tables = self.write()?;
        Ok(tables.favorites.remove(&(user_id.to_string(), stack_id)))
    }

    async fn top_users(&self, limit: usize) -> TechStacksResult<Vec<UserRanking>> {
        let tables = self.read()?;
        let mut counts: HashMap<&str, (&str, i64)> = HashMap::new();
        for (_, stack_id) in &tables.favorites {
            if let Some(stack) = tables.stacks.get(stack_id) {
                counts
                    .entry(stack.owner_id.as_str())
                    .or_insert((stack.created_by.as_str(), 0))
                    .1 += 1;
            }
        }
        let mut ranking: Vec<UserRanking> = counts
            .into_iter()
            .map(|(user_id, (user_name, favorites_count))| UserRanking {
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                favorites_count,
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.favorites_count
                .cmp(&a.favorites_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        ranking.truncate(limit);
        Ok(ranking)
    }

    async fn technology_rankings(&self) -> TechStacksResult<Vec<TechnologyRanking>> {
        let tables = self.read()?;
        let mut stacks_per_tech: HashMap<TechnologyId, HashSet<StackId>> = HashMap::new();
        for choice in tables.choices.values() {
            stacks_per_tech
                .entry(choice.technology_id)
                .or_default()
                .insert(choice.stack_id);
        }
        let mut ranking: Vec<TechnologyRanking> = stacks_per_tech
            .into_iter()
            .filter_map(|(tech_id, stacks)| {
                tables.technologies.get(&tech_id).map(|t| TechnologyRanking {
                    technology_id: t.id,
                    name: t.name.clone(),
                    slug: t.slug.clone(),
                    tier: t.tier,
                    stacks_count: stacks.len() as i64,
                })
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.stacks_count
                .cmp(&a.stacks_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(ranking)
    }

    async fn health_check(&self) -> TechStacksResult<bool> {
        Ok(self.read().is_ok())
    }
}
