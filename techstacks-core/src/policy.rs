//! Ownership and lock rules for stack mutations

use crate::{ActorContext, PolicyDenial, Stack, StackOperation, ADMIN_ROLE};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(PolicyDenial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), PolicyDenial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Pure ownership/lock policy.
///
/// Update: a locked stack needs an admin, then the actor must own the stack
/// or be an admin. Delete: ownership only, unless `lock_guards_delete` is set.
/// Create has no target and is always allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    pub lock_guards_delete: bool,
    pub admin_role: String,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self {
            lock_guards_delete: false,
            admin_role: ADMIN_ROLE.to_string(),
        }
    }
}

impl AuthorizationPolicy {
    pub fn new(lock_guards_delete: bool, admin_role: impl Into<String>) -> Self {
        Self {
            lock_guards_delete,
            admin_role: admin_role.into(),
        }
    }

    pub fn authorize(&self, actor: &ActorContext, stack: &Stack, op: StackOperation) -> Decision {
        let is_admin = actor.is_admin(&self.admin_role);

        let lock_applies = match op {
            StackOperation::Create => return Decision::Allow,
            StackOperation::Update => true,
            StackOperation::Delete => self.lock_guards_delete,
        };

        if lock_applies && stack.is_locked && !is_admin {
            return Decision::Deny(PolicyDenial::Locked);
        }
        if actor.user_id != stack.owner_id && !is_admin {
            return Decision::Deny(PolicyDenial::NotOwner);
        }
        Decision::Allow
    }
}
