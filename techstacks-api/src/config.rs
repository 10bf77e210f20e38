//! API Configuration Module
//!
//! CORS, storage backend selection and listener settings. Configuration is
//! loaded from environment variables with defaults suitable for development.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// STORAGE BACKEND
// ============================================================================

/// Where catalog rows and history live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process-local tables; contents are lost on restart.
    #[default]
    Memory,
    /// PostgreSQL through the deadpool pool.
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(ApiError::invalid_input(format!(
                "Unknown storage backend '{}', expected 'memory' or 'postgres'",
                other
            ))),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, storage and the listener.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Storage
    // ========================================================================
    pub storage_backend: StorageBackend,

    /// Apply the bundled schema on startup (postgres only).
    pub run_migrations: bool,

    // ========================================================================
    // Listener
    // ========================================================================
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            storage_backend: StorageBackend::Memory,
            run_migrations: true,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TECHSTACKS_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `TECHSTACKS_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `TECHSTACKS_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `TECHSTACKS_STORAGE`: "memory" or "postgres" (default: memory)
    /// - `TECHSTACKS_RUN_MIGRATIONS`: "true" or "false" (default: true)
    /// - `TECHSTACKS_API_BIND`: Listen address (default: 0.0.0.0)
    /// - `PORT` or `TECHSTACKS_API_PORT`: Listen port (default: 3000)
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("TECHSTACKS_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("TECHSTACKS_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.cors_allow_credentials);

        let cors_max_age_secs = lookup("TECHSTACKS_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let storage_backend = match lookup("TECHSTACKS_STORAGE") {
            Some(raw) => raw.parse()?,
            None => defaults.storage_backend,
        };

        let run_migrations = lookup("TECHSTACKS_RUN_MIGRATIONS")
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.run_migrations);

        let bind_addr = match lookup("TECHSTACKS_API_BIND") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ApiError::invalid_format("TECHSTACKS_API_BIND", "an IP address")
            })?,
            None => defaults.bind_addr,
        };

        let port = match lookup("PORT").or_else(|| lookup("TECHSTACKS_API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ApiError::invalid_format("PORT", "a port number"))?,
            None => defaults.port,
        };

        Ok(Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            storage_backend,
            run_migrations,
            bind_addr,
            port,
        })
    }

    /// Socket address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.techstacks.io
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}
