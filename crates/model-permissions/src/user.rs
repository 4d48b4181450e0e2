use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The user a request is executed for. Anonymous users have no id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Option<u64>,
    pub username: String,
    pub is_superuser: bool,
    pub is_active: bool,
    /// Global permissions, qualified as `<app_label>.<codename>`.
    pub permissions: BTreeSet<String>,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            username: username.into(),
            is_superuser: false,
            is_active: true,
            permissions: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_anonymous(&self) -> bool {
        !self.is_authenticated()
    }

    /// Global permission check. Active superusers hold every permission, inactive users none.
    pub fn has_perm(&self, permission: &str) -> bool {
        self.is_active && (self.is_superuser || self.permissions.contains(permission))
    }

    /// Permissions explicitly granted to the user, ignoring superuser status.
    pub fn explicit_permissions(&self) -> impl Iterator<Item = &str> + '_ {
        self.permissions
            .iter()
            .filter(|_| self.is_active)
            .map(String::as_str)
    }
}
