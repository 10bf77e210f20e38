//! End-to-end router tests over in-memory storage.
//!
//! Each test builds the full router (auth, CORS, observability) around a
//! fresh service and drives it with `tower::ServiceExt::oneshot`.

use axum::http::{Method, StatusCode};
use serde_json::json;
use techstacks_core::{CatalogConfig, EntityIdType, StackId};

#[path = "support/app.rs"]
mod app;

use app::TestApp;

// ============================================================================
// AUTHENTICATION
// ============================================================================

#[tokio::test]
async fn test_mutations_require_authentication() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/stacks",
            None,
            Some(json!({ "name": "Anonymous" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/stacks",
            Some("Bearer not-a-token"),
            Some(json!({ "name": "Anonymous" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reads_are_public() {
    let app = TestApp::new();
    app.create_stack(&app.owner(), "Public Stack", "").await;

    let (status, body) = app.get("/api/v1/stacks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, _) = app.get("/api/v1/stacks/public-stack").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// CREATE / UPDATE / DELETE
// ============================================================================

#[tokio::test]
async fn test_create_derives_slug_and_audit_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/stacks",
            Some(&app.owner()),
            Some(json!({ "name": "Rust Web Server", "details": "built on **axum**" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "rust-web-server");
    assert_eq!(body["owner_id"], "owner-1");
    assert_eq!(body["created_by"], "olivia");
    assert_eq!(body["last_modified_by"], "olivia");
    assert_eq!(body["is_locked"], false);
    assert_eq!(body["details_html"], "<p>built on <strong>axum</strong></p>");
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/stacks",
            Some(&app.owner()),
            Some(json!({ "name": "   " })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn test_duplicate_technology_slug_conflicts() {
    let app = TestApp::new();
    app.create_technology(&app.owner(), "Go", "ProgrammingLanguage")
        .await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/technologies",
            Some(&app.other()),
            Some(json!({ "name": "GO", "tier": "ProgrammingLanguage" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ENTITY_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_update_by_owner_renames_and_reslugs() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Old Name", "").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.owner()),
            Some(json!({ "name": "New Name", "details": "changed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "new-name");
    assert_eq!(body["owner_id"], "owner-1");

    let (status, _) = app.get("/api/v1/stacks/new-name").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/v1/stacks/old-name").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn test_update_by_non_owner_is_forbidden() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Mine", "").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.other()),
            Some(json!({ "name": "Theirs" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Nothing changed and no update was recorded.
    let (_, stack) = app.get(&format!("/api/v1/stacks/{}", id)).await;
    assert_eq!(stack["stack"]["name"], "Mine");
    let (_, history) = app.get(&format!("/api/v1/stacks/{}/history", id)).await;
    assert_eq!(history["records"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_locked_stack_only_admin_may_update() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Frozen", "").await;

    let store = app.service.store();
    let mut stack = store
        .get_by_id(StackId::new(id))
        .await
        .expect("stack exists");
    stack.is_locked = true;
    store.update(&stack).await.expect("lock stack");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.owner()),
            Some(json!({ "name": "Thawed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.admin()),
            Some(json!({ "name": "Thawed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "thawed");
    assert_eq!(body["owner_id"], "owner-1");
    assert_eq!(body["last_modified_by"], "ada");
    assert_eq!(body["is_locked"], true);
}

#[tokio::test]
async fn test_lock_does_not_guard_delete_by_default() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Locked Delete", "").await;

    let store = app.service.store();
    let mut stack = store
        .get_by_id(StackId::new(id))
        .await
        .expect("stack exists");
    stack.is_locked = true;
    store.update(&stack).await.expect("lock stack");

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.owner()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn test_lock_guards_delete_when_configured() {
    let config = CatalogConfig {
        lock_guards_delete: true,
        ..CatalogConfig::default()
    };
    let app = TestApp::with_config(config);
    let id = app.create_stack(&app.owner(), "Guarded", "").await;

    let store = app.service.store();
    let mut stack = store
        .get_by_id(StackId::new(id))
        .await
        .expect("stack exists");
    stack.is_locked = true;
    store.update(&stack).await.expect("lock stack");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.owner()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.admin()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_keeps_history_trail() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Short Lived", "").await;

    app.send(
        Method::PUT,
        &format!("/api/v1/stacks/{}", id),
        Some(&app.owner()),
        Some(json!({ "name": "Short Lived", "details": "edited" })),
    )
    .await;

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.owner()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/v1/stacks/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, history) = app.get(&format!("/api/v1/stacks/{}/history", id)).await;
    assert_eq!(status, StatusCode::OK);
    let ops: Vec<&str> = history["records"]
        .as_array()
        .expect("records")
        .iter()
        .filter_map(|r| r["operation"].as_str())
        .collect();
    assert_eq!(ops, vec!["CREATE", "UPDATE", "DELETE"]);
    assert_eq!(history["records"][2]["snapshot"]["details"], "edited");
}

#[tokio::test]
async fn test_two_updates_append_two_history_records() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Evolving", "v1").await;

    for details in ["v2", "v3"] {
        let (status, _) = app
            .send(
                Method::PUT,
                &format!("/api/v1/stacks/{}", id),
                Some(&app.owner()),
                Some(json!({ "name": "Evolving", "details": details })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, history) = app.get(&format!("/api/v1/stacks/{}/history", id)).await;
    assert_eq!(status, StatusCode::OK);
    let records = history["records"].as_array().expect("records");
    let ops: Vec<&str> = records
        .iter()
        .filter_map(|r| r["operation"].as_str())
        .collect();
    assert_eq!(ops, vec!["CREATE", "UPDATE", "UPDATE"]);
    assert!(records.iter().all(|r| r["stack_id"] == id));
    assert_eq!(records[2]["snapshot"]["details"], "v3");
}

#[tokio::test]
async fn test_update_body_cannot_override_trusted_fields() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Guarded Fields", "").await;
    let smuggled = json!({
        "name": "Taken Over",
        "owner_id": "attacker",
        "is_locked": false,
        "created_by": "x",
        "last_modified_by": "x",
        "id": 999
    });

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.other()),
            Some(smuggled.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let store = app.service.store();
    let mut stack = store
        .get_by_id(StackId::new(id))
        .await
        .expect("stack exists");
    stack.is_locked = true;
    store.update(&stack).await.expect("lock stack");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.owner()),
            Some(smuggled.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/stacks/{}", id),
            Some(&app.admin()),
            Some(smuggled),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["name"], "Taken Over");
    assert_eq!(body["owner_id"], "owner-1");
    assert_eq!(body["is_locked"], true);
    assert_eq!(body["created_by"], "olivia");
    assert_eq!(body["last_modified_by"], "ada");

    let (status, _) = app.get("/api/v1/stacks/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_stack_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            Method::DELETE,
            "/api/v1/stacks/999",
            Some(&app.admin()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// LOOKUPS AND LISTINGS
// ============================================================================

#[tokio::test]
async fn test_numeric_lookup_prefers_id_over_slug() {
    let app = TestApp::new();
    let first = app.create_stack(&app.owner(), "Alpha", "").await;
    let second = app.create_stack(&app.owner(), "1", "").await;
    assert_ne!(first, second);

    let (status, body) = app.get(&format!("/api/v1/stacks/{}", first)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stack"]["slug"], "alpha");

    // "1" names the stack with id 1, never the stack whose slug is "1".
    let (_, body) = app.get("/api/v1/stacks/1").await;
    assert_eq!(body["stack"]["id"], 1);
}

#[tokio::test]
async fn test_slug_lookup_ignores_case() {
    let app = TestApp::new();
    app.create_stack(&app.owner(), "Case Test", "").await;

    let (status, body) = app.get("/api/v1/stacks/CASE-TEST").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stack"]["slug"], "case-test");
}

#[tokio::test]
async fn test_tier_listing_joins_and_deduplicates() {
    let app = TestApp::new();
    let owner = app.owner();
    let with_choices = app.create_stack(&owner, "Full Stack", "").await;
    app.create_stack(&owner, "Bare Stack", "").await;

    let rust = app.create_technology(&owner, "Rust", "ProgrammingLanguage").await;
    let postgres = app.create_technology(&owner, "PostgreSQL", "Data").await;
    app.add_choice(&owner, with_choices, rust).await;
    app.add_choice(&owner, with_choices, postgres).await;

    // The tier only switches to the joined listing; it does not filter.
    let (status, body) = app.get("/api/v1/tiers/stacks?tier=Server").await;
    assert_eq!(status, StatusCode::OK);
    let stacks = body.as_array().expect("array");
    assert_eq!(stacks.len(), 1);
    assert_eq!(stacks[0]["id"], with_choices);

    let (_, all) = app.get("/api/v1/tiers/stacks").await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_tier_listing_rejects_unknown_tier() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/v1/tiers/stacks?tier=Mainframe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_recent_stacks_include_choices_grouped_by_tier() {
    let app = TestApp::new();
    let owner = app.owner();
    let id = app.create_stack(&owner, "Data Platform", "").await;
    let tech = app.create_technology(&owner, "Redis", "Data").await;
    app.add_choice(&owner, id, tech).await;

    let (status, body) = app.get("/api/v1/recent-stacks").await;
    assert_eq!(status, StatusCode::OK);
    let first = &body[0];
    assert_eq!(first["stack"]["id"], id);
    assert_eq!(first["tiers"][0]["tier"], "Data");
    assert_eq!(
        first["tiers"][0]["choices"].as_array().map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn test_find_stacks_filters_and_pages() {
    let app = TestApp::new();
    let owner = app.owner();
    app.create_stack(&owner, "Web Alpha", "").await;
    app.create_stack(&owner, "Web Beta", "").await;
    app.create_stack(&app.other(), "Mobile Gamma", "").await;

    let (status, body) = app
        .get("/api/v1/find-stacks?name_contains=web&order_by=-name")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][0]["slug"], "web-beta");
    assert_eq!(body["results"][1]["slug"], "web-alpha");

    let (_, body) = app.get("/api/v1/find-stacks?owner_id=OTHER-2").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["slug"], "mobile-gamma");

    let (_, body) = app
        .get("/api/v1/find-stacks?order_by=name&skip=1&take=1")
        .await;
    assert_eq!(body["offset"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_find_stacks_rejects_unknown_order_field() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/v1/find-stacks?order_by=color").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_find_stacks_rejects_out_of_range_skip() {
    let app = TestApp::new();

    let uri = format!("/api/v1/find-stacks?skip={}", u64::MAX);
    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("skip"));
}

#[tokio::test]
async fn test_config_lists_every_tier() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/v1/config").await;
    assert_eq!(status, StatusCode::OK);
    let tiers = body["tiers"].as_array().expect("tiers");
    assert_eq!(tiers.len(), 9);
    assert_eq!(tiers[0]["value"], "ProgrammingLanguage");
    assert_eq!(tiers[0]["title"], "Programming Languages");
}

// ============================================================================
// CACHE COHERENCE
// ============================================================================

#[tokio::test]
async fn test_writes_flush_cached_reads() {
    let app = TestApp::new();
    let owner = app.owner();
    let id = app.create_stack(&owner, "Cached", "v1").await;

    let (_, before) = app.get("/api/v1/stacks/cached").await;
    assert_eq!(before["stack"]["details"], "v1");
    let (_, overview) = app.get("/api/v1/overview").await;
    assert_eq!(overview["latest_stacks"].as_array().map(Vec::len), Some(1));
    let (_, found) = app.get("/api/v1/find-stacks?name_contains=cach").await;
    assert_eq!(found["total"], 1);

    app.send(
        Method::PUT,
        &format!("/api/v1/stacks/{}", id),
        Some(&owner),
        Some(json!({ "name": "Cached", "details": "v2" })),
    )
    .await;
    app.create_stack(&owner, "Cache Two", "").await;

    let (_, after) = app.get("/api/v1/stacks/cached").await;
    assert_eq!(after["stack"]["details"], "v2");
    let (_, overview) = app.get("/api/v1/overview").await;
    assert_eq!(overview["latest_stacks"].as_array().map(Vec::len), Some(2));
    let (_, found) = app.get("/api/v1/find-stacks?name_contains=cach").await;
    assert_eq!(found["total"], 2);
}

#[tokio::test]
async fn test_reload_bypasses_stale_entry() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Reloadable", "fresh").await;

    let (_, cached) = app.get("/api/v1/stacks/reloadable").await;
    assert_eq!(cached["stack"]["details"], "fresh");

    // Write behind the service's back so only the cache knows the old value.
    let store = app.service.store();
    let mut stack = store
        .get_by_id(StackId::new(id))
        .await
        .expect("stack exists");
    stack.details = "changed underneath".to_string();
    store.update(&stack).await.expect("direct update");

    let (_, stale) = app.get("/api/v1/stacks/reloadable").await;
    assert_eq!(stale["stack"]["details"], "fresh");

    let (_, reloaded) = app.get("/api/v1/stacks/reloadable?reload=true").await;
    assert_eq!(reloaded["stack"]["details"], "changed underneath");
}

// ============================================================================
// FAVORITES AND TECHNOLOGIES
// ============================================================================

#[tokio::test]
async fn test_favorite_toggle_is_idempotent() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Loved", "").await;
    let uri = format!("/api/v1/stacks/{}/favorite", id);

    let (status, body) = app.send(Method::PUT, &uri, Some(&app.other()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorited"], true);
    assert_eq!(body["changed"], true);

    let (_, body) = app.send(Method::PUT, &uri, Some(&app.other()), None).await;
    assert_eq!(body["changed"], false);

    let (_, overview) = app.get("/api/v1/overview").await;
    assert_eq!(overview["top_users"][0]["user_name"], "olivia");

    let (_, body) = app.send(Method::DELETE, &uri, Some(&app.other()), None).await;
    assert_eq!(body["favorited"], false);
    assert_eq!(body["changed"], true);
}

#[tokio::test]
async fn test_choice_on_foreign_stack_is_forbidden() {
    let app = TestApp::new();
    let id = app.create_stack(&app.owner(), "Guarded Choices", "").await;
    let tech = app.create_technology(&app.other(), "Elixir", "ProgrammingLanguage").await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/stacks/{}/choices", id),
            Some(&app.other()),
            Some(json!({ "technology_id": tech })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_remove_choice() {
    let app = TestApp::new();
    let owner = app.owner();
    let id = app.create_stack(&owner, "Trimmed", "").await;
    let tech = app.create_technology(&owner, "nginx", "Http").await;

    let (status, choice) = app
        .send(
            Method::POST,
            &format!("/api/v1/stacks/{}/choices", id),
            Some(&owner),
            Some(json!({ "technology_id": tech, "justification": "fast" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let choice_id = choice["id"].as_i64().expect("choice id");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/stacks/{}/choices/{}", id, choice_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, details) = app.get(&format!("/api/v1/stacks/{}", id)).await;
    assert_eq!(details["tiers"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_technologies_listing() {
    let app = TestApp::new();
    app.create_technology(&app.owner(), "Kotlin", "ProgrammingLanguage")
        .await;

    let (status, body) = app.get("/api/v1/technologies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["technologies"][0]["slug"], "kotlin");
    assert_eq!(body["technologies"][0]["tier"], "ProgrammingLanguage");
}

// ============================================================================
// OPERATIONAL ENDPOINTS
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, _) = app.get("/health/ping").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["storage"]["status"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();

    let (status, body) = app.get("/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/stacks"].is_object());
}
