use std::{borrow::Cow, sync::Arc};

use model_catalog::ModelWalker;
use model_store::{Datastore, Entity, QuerySet};

use crate::{ObjectFilter, PermissionBackend, PermissionError, User};

/// Object-level permission checks for guarded models.
///
/// Without a backend every check passes and every entity is visible.
#[derive(Clone, Default)]
pub struct PermissionService {
    backend: Option<Arc<dyn PermissionBackend>>,
}

impl PermissionService {
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend: Some(backend) }
    }

    pub fn unchecked() -> Self {
        Self::default()
    }

    pub fn backend(&self) -> Option<&dyn PermissionBackend> {
        self.backend.as_deref()
    }

    /// Whether `user` holds `perms` on `entity`, globally or on the entity itself.
    ///
    /// Models guarded by a related entity check the permissions they do not declare on
    /// that entity. Delegated checks run first.
    pub fn has_perm<P: AsRef<str>>(
        &self,
        store: &dyn Datastore,
        user: &User,
        model: ModelWalker<'_>,
        entity: &Entity,
        perms: &[P],
        any_perm: bool,
    ) -> Result<bool, PermissionError> {
        let Some(backend) = self.backend() else {
            return Ok(true);
        };

        let Some((field, target)) = model.delegation() else {
            return self.has_own_perm(backend, user, model, entity, perms, any_perm);
        };

        let (own, other) = split_perms(model, target, perms);

        let mut checks: Vec<Box<dyn FnOnce() -> Result<bool, PermissionError> + '_>> = Vec::with_capacity(2);

        if !other.is_empty() {
            checks.push(Box::new(|| {
                let Some(pk) = entity.related_pk(field.name()) else {
                    return Ok(false);
                };

                let Some(parent) = store.get(target.name(), pk)? else {
                    return Ok(false);
                };

                self.has_perm(store, user, target, &parent, &other, any_perm)
            }));
        }

        if !own.is_empty() {
            checks.push(Box::new(|| {
                self.has_own_perm(backend, user, model, entity, &own, any_perm)
            }));
        }

        for check in checks {
            let granted = check()?;

            if granted == any_perm {
                return Ok(granted);
            }
        }

        Ok(!any_perm)
    }

    fn has_own_perm<P: AsRef<str>>(
        &self,
        backend: &dyn PermissionBackend,
        user: &User,
        model: ModelWalker<'_>,
        entity: &Entity,
        perms: &[P],
        any_perm: bool,
    ) -> Result<bool, PermissionError> {
        let Some(user) = identity(backend, user) else {
            return Ok(perms.is_empty() && !any_perm);
        };

        let object_perms = match entity.pk() {
            Some(pk) => backend.object_permissions(&user, model, pk)?,
            None => Default::default(),
        };

        let held = |perm: &P| {
            let perm = model.qualify_permission(perm.as_ref());
            user.has_perm(&perm) || object_perms.contains(&perm)
        };

        Ok(if any_perm {
            perms.iter().any(held)
        } else {
            perms.iter().all(held)
        })
    }

    /// The entities of `model` on which `user` holds `perms`.
    pub fn for_user<P: AsRef<str>>(
        &self,
        store: &dyn Datastore,
        user: &User,
        model: ModelWalker<'_>,
        perms: &[P],
        any_perm: bool,
        with_superuser: bool,
    ) -> Result<QuerySet, PermissionError> {
        let Some(backend) = self.backend() else {
            return all(store, model);
        };

        let Some(user) = identity(backend, user) else {
            tracing::debug!("anonymous access to {} is not configured", model.name());
            return Ok(QuerySet::none(model.name()));
        };

        let Some((field, target)) = model.delegation() else {
            return own_queryset(store, backend, &user, model, perms, any_perm, with_superuser);
        };

        let (own, other) = split_perms(model, target, perms);

        let own_qs = if own.is_empty() {
            None
        } else {
            Some(own_queryset(store, backend, &user, model, &own, any_perm, with_superuser)?)
        };

        let other_qs = if other.is_empty() {
            None
        } else {
            let parents = self.for_user(store, &user, target, &other, any_perm, with_superuser)?;
            let pks = store
                .all(model.name())?
                .into_iter()
                .filter(|entity| {
                    entity
                        .related_pk(field.name())
                        .is_some_and(|parent| parents.contains(parent))
                })
                .filter_map(|entity| entity.pk());

            Some(QuerySet::new(model.name(), pks))
        };

        match (own_qs, other_qs) {
            (Some(own), Some(other)) if any_perm => Ok(own.union(&other)),
            (Some(own), Some(other)) => Ok(own.intersection(&other)),
            (Some(queryset), None) | (None, Some(queryset)) => Ok(queryset),
            (None, None) => Err(PermissionError::NoApplicablePermissions {
                model: model.name().to_string(),
                permissions: perms.iter().map(|perm| perm.as_ref().to_string()).collect(),
            }),
        }
    }
}

/// Anonymous users are evaluated as the backend's anonymous user, if any.
fn identity<'a>(backend: &dyn PermissionBackend, user: &'a User) -> Option<Cow<'a, User>> {
    if user.is_authenticated() {
        return Some(Cow::Borrowed(user));
    }

    backend.anonymous_user().map(Cow::Owned)
}

/// Splits permissions into those of the model itself and those it delegates to `target`.
/// Permissions declared nowhere stay with the model, where they fail.
fn split_perms<P: AsRef<str>>(
    model: ModelWalker<'_>,
    target: ModelWalker<'_>,
    perms: &[P],
) -> (Vec<String>, Vec<String>) {
    perms
        .iter()
        .map(|perm| perm.as_ref().to_string())
        .partition(|perm| model.declares_permission(perm) || !target.declares_permission(perm))
}

fn own_queryset<P: AsRef<str>>(
    store: &dyn Datastore,
    backend: &dyn PermissionBackend,
    user: &User,
    model: ModelWalker<'_>,
    perms: &[P],
    any_perm: bool,
    with_superuser: bool,
) -> Result<QuerySet, PermissionError> {
    let perms: Vec<_> = perms.iter().map(|perm| model.qualify_permission(perm.as_ref())).collect();

    match backend.objects_for_user(user, model, &perms, any_perm, with_superuser)? {
        ObjectFilter::All => all(store, model),
        ObjectFilter::Only(pks) => {
            let existing = all(store, model)?;
            Ok(existing.intersection(&QuerySet::new(model.name(), pks)))
        }
    }
}

fn all(store: &dyn Datastore, model: ModelWalker<'_>) -> Result<QuerySet, PermissionError> {
    let pks = store.all(model.name())?.into_iter().filter_map(|entity| entity.pk());
    Ok(QuerySet::new(model.name(), pks))
}
