//! Per-request caller identity

use serde::{Deserialize, Serialize};

/// Role name that grants administrative rights unless overridden by config.
pub const ADMIN_ROLE: &str = "Admin";

/// The authenticated caller of a request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the actor holds the given administrator role.
    pub fn is_admin(&self, admin_role: &str) -> bool {
        self.has_role(admin_role)
    }
}
