use std::sync::Arc;

use async_graphql::dynamic::ResolverContext;
use model_mutations::{MutationContext, MutationRegistry, Settings, Uploads};
use model_permissions::{PermissionService, User};
use model_schema::{ModelType, QueryContext, TypeRegistry};
use model_store::Datastore;

/// Everything resolvers share, stored as schema data.
pub(crate) struct SchemaState {
    pub(crate) types: TypeRegistry,
    pub(crate) mutations: MutationRegistry,
    pub(crate) store: Arc<dyn Datastore>,
    pub(crate) permissions: PermissionService,
    pub(crate) settings: Settings,
    anonymous: User,
    no_uploads: Uploads,
}

impl SchemaState {
    pub(crate) fn new(
        types: TypeRegistry,
        mutations: MutationRegistry,
        store: Arc<dyn Datastore>,
        permissions: PermissionService,
        settings: Settings,
    ) -> Self {
        Self {
            types,
            mutations,
            store,
            permissions,
            settings,
            anonymous: User::anonymous(),
            no_uploads: Uploads::new(),
        }
    }
}

/// The schema state and the request data of one resolver call.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) state: &'a SchemaState,
    pub(crate) user: &'a User,
    pub(crate) uploads: &'a Uploads,
}

impl<'a> Scope<'a> {
    pub(crate) fn of(ctx: &ResolverContext<'a>) -> async_graphql::Result<Self> {
        let context = ctx.ctx;
        let state = context.data::<Arc<SchemaState>>()?.as_ref();

        Ok(Self {
            state,
            user: context.data_opt::<User>().unwrap_or(&state.anonymous),
            uploads: context.data_opt::<Uploads>().unwrap_or(&state.no_uploads),
        })
    }

    pub(crate) fn query(&self) -> QueryContext<'a> {
        QueryContext {
            types: &self.state.types,
            store: self.state.store.as_ref(),
            permissions: &self.state.permissions,
            user: self.user,
        }
    }

    pub(crate) fn mutation(&self) -> MutationContext<'a> {
        MutationContext {
            query: self.query(),
            uploads: self.uploads,
            settings: &self.state.settings,
        }
    }

    pub(crate) fn object_type(&self, name: &str) -> async_graphql::Result<&'a ModelType> {
        self.state
            .types
            .get(name)
            .ok_or_else(|| async_graphql::Error::new(format!("Relay Node \"{name}\" not found in schema")))
    }
}
