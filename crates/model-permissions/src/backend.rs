use std::{
    collections::{BTreeSet, HashMap},
    sync::RwLock,
};

use model_catalog::ModelWalker;
use model_store::EntityId;

use crate::{PermissionError, User};

/// Entities of one model a user may access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectFilter {
    All,
    Only(BTreeSet<EntityId>),
}

/// The object-level ACL provider.
pub trait PermissionBackend: Send + Sync + 'static {
    /// Qualified permissions granted to `user` on one entity. Global permissions are not
    /// included.
    fn object_permissions(
        &self,
        user: &User,
        model: ModelWalker<'_>,
        pk: EntityId,
    ) -> Result<BTreeSet<String>, PermissionError>;

    /// Entities of `model` on which `user` holds the qualified `perms`, global
    /// permissions included.
    fn objects_for_user(
        &self,
        user: &User,
        model: ModelWalker<'_>,
        perms: &[String],
        any_perm: bool,
        with_superuser: bool,
    ) -> Result<ObjectFilter, PermissionError>;

    /// The user anonymous requests are evaluated as. Without one, anonymous users are
    /// denied everything.
    fn anonymous_user(&self) -> Option<User> {
        None
    }
}

type Grants = HashMap<(u64, String, EntityId), BTreeSet<String>>;

/// A permission backend keeping explicit per-object grants in memory.
#[derive(Default)]
pub struct MemoryPermissionBackend {
    grants: RwLock<Grants>,
    anonymous_user: Option<User>,
}

impl MemoryPermissionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates anonymous requests as `user`, which can then receive grants itself.
    #[must_use]
    pub fn with_anonymous_user(mut self, user: User) -> Self {
        self.anonymous_user = Some(user);
        self
    }

    pub fn assign_perm(
        &self,
        permission: &str,
        user: &User,
        model: ModelWalker<'_>,
        pk: EntityId,
    ) -> Result<(), PermissionError> {
        let user_id = user.id.ok_or(PermissionError::AnonymousGrant)?;

        if !model.declares_permission(permission) {
            return Err(PermissionError::UnknownPermission {
                model: model.name().to_string(),
                permission: permission.to_string(),
            });
        }

        let mut grants = self.grants.write().map_err(|_| PermissionError::Poisoned)?;

        grants
            .entry((user_id, model.name().to_string(), pk))
            .or_default()
            .insert(model.qualify_permission(permission));

        Ok(())
    }

    pub fn remove_perm(
        &self,
        permission: &str,
        user: &User,
        model: ModelWalker<'_>,
        pk: EntityId,
    ) -> Result<(), PermissionError> {
        let user_id = user.id.ok_or(PermissionError::AnonymousGrant)?;
        let mut grants = self.grants.write().map_err(|_| PermissionError::Poisoned)?;

        if let Some(perms) = grants.get_mut(&(user_id, model.name().to_string(), pk)) {
            perms.remove(&model.qualify_permission(permission));
        }

        Ok(())
    }
}

impl PermissionBackend for MemoryPermissionBackend {
    fn object_permissions(
        &self,
        user: &User,
        model: ModelWalker<'_>,
        pk: EntityId,
    ) -> Result<BTreeSet<String>, PermissionError> {
        let Some(user_id) = user.id.filter(|_| user.is_active) else {
            return Ok(BTreeSet::new());
        };

        let grants = self.grants.read().map_err(|_| PermissionError::Poisoned)?;

        Ok(grants
            .get(&(user_id, model.name().to_string(), pk))
            .cloned()
            .unwrap_or_default())
    }

    fn objects_for_user(
        &self,
        user: &User,
        model: ModelWalker<'_>,
        perms: &[String],
        any_perm: bool,
        with_superuser: bool,
    ) -> Result<ObjectFilter, PermissionError> {
        let Some(user_id) = user.id.filter(|_| user.is_active) else {
            return Ok(ObjectFilter::Only(BTreeSet::new()));
        };

        if with_superuser && user.is_superuser {
            return Ok(ObjectFilter::All);
        }

        let (global, remaining): (Vec<_>, Vec<_>) = perms
            .iter()
            .partition(|perm| user.explicit_permissions().any(|held| held == perm.as_str()));

        if remaining.is_empty() || (any_perm && !global.is_empty()) {
            return Ok(ObjectFilter::All);
        }

        let grants = self.grants.read().map_err(|_| PermissionError::Poisoned)?;

        let pks = grants
            .iter()
            .filter(|((grantee, grant_model, _), _)| *grantee == user_id && grant_model == model.name())
            .filter(|(_, held)| {
                if any_perm {
                    remaining.iter().any(|perm| held.contains(*perm))
                } else {
                    remaining.iter().all(|perm| held.contains(*perm))
                }
            })
            .map(|((_, _, pk), _)| *pk)
            .collect();

        Ok(ObjectFilter::Only(pks))
    }

    fn anonymous_user(&self) -> Option<User> {
        self.anonymous_user.clone()
    }
}
