//! Catalog configuration

use crate::{
    AuthorizationPolicy, ConfigError, TechStacksError, TechStacksResult, ADMIN_ROLE,
};
use serde::{Deserialize, Serialize};

/// Limits and policy switches for the catalog core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CatalogConfig {
    /// Row cap for the plain stack listing.
    pub stack_list_limit: usize,
    /// Number of stacks in the recent-with-children listing.
    pub recent_limit: usize,
    /// Size of each overview ranking.
    pub overview_limit: usize,
    /// Technologies shown per tier in the overview.
    pub top_by_tier_limit: usize,
    /// Whether the lock flag also blocks non-admin deletes.
    pub lock_guards_delete: bool,
    /// Role that bypasses ownership and lock checks.
    pub admin_role: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            stack_list_limit: 100,
            recent_limit: 20,
            overview_limit: 20,
            top_by_tier_limit: 5,
            lock_guards_delete: false,
            admin_role: ADMIN_ROLE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Create CatalogConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TECHSTACKS_STACK_LIST_LIMIT` (default: 100)
    /// - `TECHSTACKS_RECENT_LIMIT` (default: 20)
    /// - `TECHSTACKS_OVERVIEW_LIMIT` (default: 20)
    /// - `TECHSTACKS_TOP_BY_TIER_LIMIT` (default: 5)
    /// - `TECHSTACKS_LOCK_GUARDS_DELETE`: "true" or "false" (default: false)
    /// - `TECHSTACKS_ADMIN_ROLE` (default: "Admin")
    pub fn from_env() -> TechStacksResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers are errors.
    pub fn from_lookup<F>(lookup: F) -> TechStacksResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let number = |key: &str, default: usize| -> TechStacksResult<usize> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    TechStacksError::from(ConfigError::InvalidValue {
                        field: key.to_string(),
                        value: raw.clone(),
                        reason: "expected a non-negative integer".to_string(),
                    })
                }),
                None => Ok(default),
            }
        };

        let config = Self {
            stack_list_limit: number("TECHSTACKS_STACK_LIST_LIMIT", defaults.stack_list_limit)?,
            recent_limit: number("TECHSTACKS_RECENT_LIMIT", defaults.recent_limit)?,
            overview_limit: number("TECHSTACKS_OVERVIEW_LIMIT", defaults.overview_limit)?,
            top_by_tier_limit: number(
                "TECHSTACKS_TOP_BY_TIER_LIMIT",
                defaults.top_by_tier_limit,
            )?,
            lock_guards_delete: lookup("TECHSTACKS_LOCK_GUARDS_DELETE")
                .map(|s| s.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.lock_guards_delete),
            admin_role: lookup("TECHSTACKS_ADMIN_ROLE")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.admin_role),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// All limits must be greater than zero.
    pub fn validate(&self) -> TechStacksResult<()> {
        let limits = [
            ("stack_list_limit", self.stack_list_limit),
            ("recent_limit", self.recent_limit),
            ("overview_limit", self.overview_limit),
            ("top_by_tier_limit", self.top_by_tier_limit),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "must be greater than zero".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Authorization policy configured by these settings.
    pub fn policy(&self) -> AuthorizationPolicy {
        AuthorizationPolicy::new(self.lock_guards_delete, self.admin_role.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert_eq!(config.stack_list_limit, 100);
        assert_eq!(config.recent_limit, 20);
        assert_eq!(config.overview_limit, 20);
        assert!(!config.lock_guards_delete);
        assert_eq!(config.admin_role, "Admin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CatalogConfig::from_lookup(lookup_from(&[
            ("TECHSTACKS_RECENT_LIMIT", "5"),
            ("TECHSTACKS_LOCK_GUARDS_DELETE", "TRUE"),
            ("TECHSTACKS_ADMIN_ROLE", "Moderator"),
        ]))
        .unwrap();
        assert_eq!(config.recent_limit, 5);
        assert!(config.lock_guards_delete);
        assert_eq!(config.policy().admin_role, "Moderator");
        assert_eq!(config.stack_list_limit, 100);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = CatalogConfig::from_lookup(lookup_from(&[(
            "TECHSTACKS_STACK_LIST_LIMIT",
            "lots",
        )]));
        assert!(matches!(result, Err(TechStacksError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let config = CatalogConfig {
            overview_limit: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overview_limit"));
    }
}
