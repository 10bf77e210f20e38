//! TechStacks API Server Entry Point
//!
//! Bootstraps configuration, picks the storage backend, applies the schema
//! when running on PostgreSQL, and starts the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use techstacks_api::telemetry::{init_tracer, TelemetryConfig};
use techstacks_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AuthConfig, DbClient, DbConfig,
    StackService, StorageBackend,
};
use techstacks_core::CatalogConfig;
use techstacks_storage::{
    AuditLog, CacheConfig, InMemoryAuditLog, InMemoryCacheBackend, InMemoryRepository,
    ReadThroughCache, StackRepository, StackStore,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let auth_config = AuthConfig::from_env();
    let catalog_config = CatalogConfig::from_env()?;
    let cache_config = CacheConfig::from_env();

    let (repo, audit) = build_storage(&api_config).await?;

    let backend = Arc::new(InMemoryCacheBackend::with_capacity(cache_config.max_entries));
    let cache = Arc::new(ReadThroughCache::new(backend, cache_config));
    let service = StackService::new(StackStore::new(repo), audit, cache, catalog_config);

    let app: Router = create_api_router(service, &api_config, auth_config)?;

    let addr = api_config.socket_addr();
    tracing::info!(
        %addr,
        service = %telemetry_config.service_name,
        version = %telemetry_config.service_version,
        environment = %telemetry_config.environment,
        storage = ?api_config.storage_backend,
        "Starting TechStacks API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Repository and history ledger for the configured backend.
async fn build_storage(
    config: &ApiConfig,
) -> ApiResult<(Arc<dyn StackRepository>, Arc<dyn AuditLog>)> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; catalog contents are lost on restart");
            let repo: Arc<dyn StackRepository> = Arc::new(InMemoryRepository::new());
            let audit: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new());
            Ok((repo, audit))
        }
        StorageBackend::Postgres => {
            let db_config = DbConfig::from_env();
            let db = Arc::new(DbClient::from_config(&db_config)?);
            if config.run_migrations {
                db.migrate().await?;
            }
            tracing::info!(
                host = %db_config.host,
                dbname = %db_config.dbname,
                pool_size = db_config.max_size,
                "Using PostgreSQL storage"
            );
            let repo: Arc<dyn StackRepository> = db.clone();
            let audit: Arc<dyn AuditLog> = db;
            Ok((repo, audit))
        }
    }
}
