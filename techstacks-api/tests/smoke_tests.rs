//! End-to-end smoke tests for the PostgreSQL backend.
//!
//! Run with `--features db-tests` against a database reachable through the
//! `TECHSTACKS_DB_*` variables.

#![cfg(feature = "db-tests")]

use std::sync::Arc;

use techstacks_api::{ApiResult, DbClient, DbConfig, StackService};
use techstacks_core::{CatalogConfig, StackQuery, TechnologyTier};
use techstacks_test_utils::*;

async fn test_db() -> ApiResult<Arc<DbClient>> {
    let db = Arc::new(DbClient::from_config(&DbConfig::from_env())?);
    db.migrate().await?;
    Ok(db)
}

/// Names unique per run so reruns against the same database do not collide.
fn unique(prefix: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{} {}", prefix, nanos)
}

fn service_over(db: Arc<DbClient>) -> StackService {
    let (cache, _backend) = fixtures::memory_cache();
    let audit: Arc<dyn AuditLog> = db.clone();
    StackService::new(StackStore::new(db), audit, cache, CatalogConfig::default())
}

#[tokio::test]
async fn smoke_test_stack_lifecycle() -> ApiResult<()> {
    let service = service_over(test_db().await?);
    let owner = fixtures::owner_actor();
    let name = unique("Smoke Stack");

    let created = service
        .create(&owner, StackDraft::new(name.clone(), "first"))
        .await?;
    assert_eq!(created.stack.owner_id, owner.user_id);
    assertions::assert_slug_matches(&created.stack);

    let id = created.stack.id;
    let by_slug = service.get_by_slug(&created.stack.slug, false).await?;
    assert_eq!(by_slug.stack.stack.id, id);
    let by_id = service.get_by_slug(&id.to_string(), false).await?;
    assert_eq!(by_id.stack.stack.slug, created.stack.slug);

    let renamed = format!("{} renamed", name);
    let updated = service
        .update(&owner, id, StackDraft::new(renamed, "second"))
        .await?;
    assert_eq!(updated.stack.created, created.stack.created);
    assert_eq!(updated.stack.details, "second");

    service.delete(&owner, id).await?;
    assert!(service.get_by_slug(&id.to_string(), true).await.is_err());

    let history = service.history(id).await?;
    assertions::assert_history_ops(
        &history.records,
        &[
            StackOperation::Create,
            StackOperation::Update,
            StackOperation::Delete,
        ],
    );
    Ok(())
}

#[tokio::test]
async fn smoke_test_find_is_case_insensitive() -> ApiResult<()> {
    let service = service_over(test_db().await?);
    let name = unique("Finder");
    service
        .create(&fixtures::owner_actor(), StackDraft::new(name.clone(), ""))
        .await?;

    let query = StackQuery {
        name: Some(name.to_uppercase()),
        ..StackQuery::default()
    };
    let page = service.find(&format!("name={}", name), &query).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.results[0].stack.name, name);
    Ok(())
}

#[tokio::test]
async fn smoke_test_choices_cascade_on_delete() -> ApiResult<()> {
    let db = test_db().await?;
    let service = service_over(db.clone());
    let owner = fixtures::owner_actor();

    let stack = service
        .create(&owner, StackDraft::new(unique("Cascade"), ""))
        .await?;
    let tech = service
        .create_technology(
            &owner,
            techstacks_api::CreateTechnologyRequest {
                name: unique("Tech"),
                tier: TechnologyTier::Data,
                details: String::new(),
            },
        )
        .await?;
    service
        .add_choice(
            &owner,
            stack.stack.id,
            techstacks_api::AddChoiceRequest {
                technology_id: tech.technology.id,
                justification: "smoke".to_string(),
            },
        )
        .await?;

    let details = service.get_by_slug(&stack.stack.slug, false).await?;
    assert_eq!(details.tiers.len(), 1);
    assert_eq!(details.tiers[0].tier, TechnologyTier::Data);

    service.delete(&owner, stack.stack.id).await?;
    let remaining = db.choices_for_stacks(&[stack.stack.id]).await?;
    assert!(remaining.is_empty());
    Ok(())
}

#[tokio::test]
async fn smoke_test_health_check() -> ApiResult<()> {
    let db = test_db().await?;
    assert!(db.health_check().await?);
    Ok(())
}
