use std::{collections::BTreeMap, sync::Arc};

use async_graphql::{
    dynamic::{Schema, SchemaBuilder},
    Request, Response,
};
use model_mutations::{MutationDefinition, MutationRegistry, Settings};
use model_permissions::PermissionService;
use model_schema::TypeRegistry;
use model_store::Datastore;

use crate::{
    mutation::{MutationTypes, MUTATION},
    objects::{node_interface, ObjectTypes},
    query::{query_root, QUERY},
    reflection,
    scalars::{choice_enum, custom_scalars},
    scope::SchemaState,
    BuildError,
};

/// The executable GraphQL schema of a model catalog.
pub struct ModelSchema {
    schema: Schema,
}

impl ModelSchema {
    pub fn builder(types: TypeRegistry, store: Arc<dyn Datastore>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            types,
            store,
            permissions: PermissionService::unchecked(),
            settings: Settings::default(),
            mutations: Vec::new(),
        }
    }

    /// Runs a request. The request data may hold the current `User` and the `Uploads` of
    /// the request.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        self.schema.execute(request).await
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

pub struct ModelSchemaBuilder {
    types: TypeRegistry,
    store: Arc<dyn Datastore>,
    permissions: PermissionService,
    settings: Settings,
    mutations: Vec<MutationDefinition>,
}

impl ModelSchemaBuilder {
    /// Object permissions are not checked without a permission service.
    #[must_use]
    pub fn permissions(mut self, permissions: PermissionService) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn mutation(mut self, definition: MutationDefinition) -> Self {
        self.mutations.push(definition);
        self
    }

    #[must_use]
    pub fn mutations(mut self, definitions: impl IntoIterator<Item = MutationDefinition>) -> Self {
        self.mutations.extend(definitions);
        self
    }

    pub fn finish(self) -> Result<ModelSchema, BuildError> {
        let Self {
            types,
            store,
            permissions,
            settings,
            mutations,
        } = self;

        let mutations = MutationRegistry::build(&types, &settings, mutations)?;

        let object_types = ObjectTypes::build(&types);
        let mutation_types = MutationTypes::build(&mutations);

        let mut builder = Schema::build(
            QUERY,
            mutation_types.root.as_ref().map(|_| MUTATION),
            None,
        )
        .register(query_root(&types))
        .register(node_interface())
        .register(reflection::field_kind_enum());

        builder = register_all(builder, custom_scalars());
        builder = register_all(builder, reflection::objects());
        builder = register_all(builder, object_types.objects);
        builder = register_all(builder, mutation_types.objects);
        builder = register_all(builder, mutation_types.inputs);

        let mut enums = object_types.enums;
        enums.extend(mutation_types.enums);
        builder = register_all(builder, choice_enums(&enums));

        if let Some(root) = mutation_types.root {
            builder = builder.register(root);
        }

        let state = SchemaState::new(types, mutations, store, permissions, settings);
        let schema = builder.data(Arc::new(state)).finish()?;

        tracing::info!("built the GraphQL schema");

        Ok(ModelSchema { schema })
    }
}

fn register_all<T: Into<async_graphql::dynamic::Type>>(
    builder: SchemaBuilder,
    types: impl IntoIterator<Item = T>,
) -> SchemaBuilder {
    types.into_iter().fold(builder, |builder, ty| builder.register(ty))
}

fn choice_enums(enums: &BTreeMap<String, model_schema::ChoiceEnum>) -> Vec<async_graphql::dynamic::Enum> {
    enums.values().map(choice_enum).collect()
}
