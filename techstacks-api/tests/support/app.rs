//! Shared router harness for the API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use techstacks_api::{
    auth::{generate_jwt_token, AuthConfig, JwtSecret},
    build_router, ApiConfig, AppState, AuthMiddlewareState, StackService,
};
use techstacks_core::{CatalogConfig, ADMIN_ROLE};
use techstacks_test_utils::fixtures;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "router_test_key_123";
const TEST_SECRET: &str = "router-tests-secret-with-at-least-32-chars";

pub fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.add_api_key(TEST_API_KEY.to_string());
    config.jwt_secret = JwtSecret::new(TEST_SECRET.to_string()).expect("non-empty secret");
    config
}

/// A service over fresh in-memory storage.
pub fn test_service(config: CatalogConfig) -> StackService {
    let (cache, _backend) = fixtures::memory_cache();
    StackService::new(
        fixtures::memory_store(),
        fixtures::memory_audit(),
        cache,
        config,
    )
}

/// The full router plus a handle on the service behind it.
pub struct TestApp {
    pub router: Router,
    pub service: StackService,
    auth: Arc<AuthConfig>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        let service = test_service(config);
        let auth_config = test_auth_config();
        let auth = Arc::new(auth_config.clone());
        let state = AppState::new(service.clone(), AuthMiddlewareState::new(auth_config));
        Self {
            router: build_router(state, &ApiConfig::default()),
            service,
            auth,
        }
    }

    /// Bearer header value for a user with the given roles.
    pub fn bearer(&self, user_id: &str, user_name: &str, roles: &[&str]) -> String {
        let token = generate_jwt_token(
            &self.auth,
            user_id.to_string(),
            Some(user_name.to_string()),
            roles.iter().map(|r| r.to_string()).collect(),
        )
        .expect("token generation");
        format!("Bearer {}", token)
    }

    pub fn owner(&self) -> String {
        self.bearer("owner-1", "olivia", &[])
    }

    pub fn other(&self) -> String {
        self.bearer("other-2", "oscar", &[])
    }

    pub fn admin(&self) -> String {
        self.bearer("admin-3", "ada", &[ADMIN_ROLE])
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = authorization {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    /// Create a stack as `authorization` and return its id.
    pub async fn create_stack(&self, authorization: &str, name: &str, details: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/stacks",
                Some(authorization),
                Some(serde_json::json!({ "name": name, "details": details })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_i64().expect("stack id")
    }

    /// Register a technology and return its id.
    pub async fn create_technology(&self, authorization: &str, name: &str, tier: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/technologies",
                Some(authorization),
                Some(serde_json::json!({ "name": name, "tier": tier })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "technology create failed: {}", body);
        body["id"].as_i64().expect("technology id")
    }

    pub async fn add_choice(&self, authorization: &str, stack_id: i64, technology_id: i64) {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/v1/stacks/{}/choices", stack_id),
                Some(authorization),
                Some(serde_json::json!({ "technology_id": technology_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add choice failed: {}", body);
    }
}
