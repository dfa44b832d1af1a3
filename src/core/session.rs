//! Explicit session context.
//!
//! The acting user and their role are resolved once at the calling boundary and
//! passed down, instead of being looked up from ambient state.

use crate::{
    entities::{Role, user},
    errors::{Error, Result},
};

/// The user on whose behalf an action runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Acting user id
    pub uid: String,
    /// Acting user's email
    pub email: String,
    /// Acting user's display name
    pub name: String,
    /// Capability level
    pub role: Role,
}

impl Session {
    /// Builds a session from a stored user.
    #[must_use]
    pub fn from_user(user: user::Model) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }

    /// Fails with [`Error::PermissionDenied`] unless the session has `required`.
    ///
    /// Admins hold every capability.
    pub fn require(&self, required: Role, action: &str) -> Result<()> {
        if self.role == required || self.role == Role::Admin {
            return Ok(());
        }
        Err(Error::PermissionDenied {
            action: action.to_string(),
            required: required.as_str().to_string(),
        })
    }
}
