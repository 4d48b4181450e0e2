use std::{collections::HashMap, sync::Arc};

use heck::ToLowerCamelCase;
use model_catalog::{Catalog, ModelId, ModelWalker};
use model_permissions::{check_authenticated, check_perms, PermissionService, User};
use model_store::{Datastore, Entity, EntityId, QuerySet};

use crate::{
    describe_field, global_id::to_global_id, output_shape, SchemaError, SchemaRegistry, TypeShape,
};

/// Everything a query-time permission check needs.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub types: &'a TypeRegistry,
    pub store: &'a dyn Datastore,
    pub permissions: &'a PermissionService,
    pub user: &'a User,
}

impl<'a> QueryContext<'a> {
    pub fn catalog(&self) -> &'a Catalog {
        self.types.catalog()
    }
}

/// Model name to object type name.
#[derive(Debug, Clone, Default)]
pub struct TypeNames(HashMap<String, String>);

impl TypeNames {
    pub fn get(&self, model: &str) -> Option<&str> {
        self.0.get(model).map(String::as_str)
    }
}

impl<M: Into<String>, T: Into<String>> FromIterator<(M, T)> for TypeNames {
    fn from_iter<I: IntoIterator<Item = (M, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(model, name)| (model.into(), name.into())).collect())
    }
}

/// Options of an object type exposing a model.
#[derive(Debug, Clone)]
pub struct ModelTypeDefinition {
    model: String,
    name: Option<String>,
    description: Option<String>,
    list_field: Option<String>,
    node_field: Option<String>,
    only_fields: Vec<String>,
    exclude_fields: Vec<String>,
    allow_unauthenticated: bool,
    permissions: Vec<String>,
    permissions_any: bool,
    object_permissions: Vec<String>,
    object_permissions_any: bool,
}

impl ModelTypeDefinition {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: None,
            description: None,
            list_field: None,
            node_field: None,
            only_fields: Vec::new(),
            exclude_fields: Vec::new(),
            allow_unauthenticated: false,
            permissions: Vec::new(),
            permissions_any: true,
            object_permissions: Vec::new(),
            object_permissions_any: true,
        }
    }

    /// The object type name, `<Model>Type` by default.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The query field listing the model, its camel-cased plural name by default.
    #[must_use]
    pub fn list_field(mut self, name: impl Into<String>) -> Self {
        self.list_field = Some(name.into());
        self
    }

    /// The query field fetching one entity by id, the camel-cased model name by default.
    #[must_use]
    pub fn node_field(mut self, name: impl Into<String>) -> Self {
        self.node_field = Some(name.into());
        self
    }

    #[must_use]
    pub fn only_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.only_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn exclude_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.exclude_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn allow_unauthenticated(mut self) -> Self {
        self.allow_unauthenticated = true;
        self
    }

    #[must_use]
    pub fn permissions<S: Into<String>>(mut self, permissions: impl IntoIterator<Item = S>) -> Self {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn permissions_any(mut self, any: bool) -> Self {
        self.permissions_any = any;
        self
    }

    #[must_use]
    pub fn object_permissions<S: Into<String>>(mut self, permissions: impl IntoIterator<Item = S>) -> Self {
        self.object_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn object_permissions_any(mut self, any: bool) -> Self {
        self.object_permissions_any = any;
        self
    }
}

/// A field of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    /// The model field name.
    pub field: String,
    pub name: String,
    pub shape: TypeShape,
    pub nullable: bool,
    pub description: Option<String>,
}

/// An object type exposing a model, with the permission rules of its queries.
#[derive(Debug, Clone)]
pub struct ModelType {
    name: String,
    model: ModelId,
    description: Option<String>,
    list_field: String,
    node_field: String,
    fields: Vec<OutputField>,
    allow_unauthenticated: bool,
    permissions: Vec<String>,
    permissions_any: bool,
    object_permissions: Vec<String>,
    object_permissions_any: bool,
}

impl ModelType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model<'a>(&self, catalog: &'a Catalog) -> ModelWalker<'a> {
        catalog.walk(self.model)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn list_field(&self) -> &str {
        &self.list_field
    }

    pub fn node_field(&self) -> &str {
        &self.node_field
    }

    pub fn fields(&self) -> &[OutputField] {
        &self.fields
    }

    pub fn global_id(&self, pk: EntityId) -> String {
        to_global_id(&self.name, pk)
    }

    /// Whether `user` may query this type at all.
    pub fn check_permissions(&self, user: &User) -> bool {
        if !self.allow_unauthenticated && !check_authenticated(user) {
            return false;
        }

        if self.permissions.is_empty() {
            return true;
        }

        check_perms(user, self.permissions.as_slice(), self.permissions_any, true)
    }

    /// Whether the user of `ctx` holds the object permissions of this type on `entity`.
    /// Unguarded models have no object permissions.
    pub fn check_object_permissions(&self, ctx: &QueryContext<'_>, entity: &Entity) -> Result<bool, SchemaError> {
        let model = self.model(ctx.catalog());

        if self.object_permissions.is_empty() || !model.is_guarded() {
            return Ok(true);
        }

        let granted = ctx.permissions.has_perm(
            ctx.store,
            ctx.user,
            model,
            entity,
            self.object_permissions.as_slice(),
            self.object_permissions_any,
        )?;

        Ok(granted)
    }

    /// The entities the user of `ctx` may see. Users failing the type permissions see
    /// nothing.
    pub fn get_queryset(&self, ctx: &QueryContext<'_>) -> Result<QuerySet, SchemaError> {
        let model = self.model(ctx.catalog());

        if !self.check_permissions(ctx.user) {
            tracing::debug!("{:?} is not allowed to query {}", ctx.user.username, self.name);
            return Ok(QuerySet::none(model.name()));
        }

        let pks = ctx.store.all(model.name())?.into_iter().filter_map(|entity| entity.pk());
        let queryset = QuerySet::new(model.name(), pks);

        if self.object_permissions.is_empty() || !model.is_guarded() {
            return Ok(queryset);
        }

        let allowed = ctx.permissions.for_user(
            ctx.store,
            ctx.user,
            model,
            self.object_permissions.as_slice(),
            self.object_permissions_any,
            true,
        )?;

        Ok(queryset.intersection(&allowed))
    }

    /// Keeps the visible entities of `entities`, in order.
    pub fn visible(&self, ctx: &QueryContext<'_>, entities: Vec<Entity>) -> Result<Vec<Entity>, SchemaError> {
        let queryset = self.get_queryset(ctx)?;

        Ok(entities
            .into_iter()
            .filter(|entity| entity.pk().is_some_and(|pk| queryset.contains(pk)))
            .collect())
    }

    /// One visible entity. Missing and forbidden entities are both `None`.
    pub fn get_node(&self, ctx: &QueryContext<'_>, pk: EntityId) -> Result<Option<Entity>, SchemaError> {
        if !self.get_queryset(ctx)?.contains(pk) {
            return Ok(None);
        }

        let model = self.model(ctx.catalog());

        let Some(entity) = ctx.store.get(model.name(), pk)? else {
            return Ok(None);
        };

        if !self.check_object_permissions(ctx, &entity)? {
            return Ok(None);
        }

        Ok(Some(entity))
    }
}

/// The object types of a catalog and their reflected schemas.
pub struct TypeRegistry {
    catalog: Arc<Catalog>,
    types: Vec<ModelType>,
    type_names: TypeNames,
    object_schemas: SchemaRegistry,
}

impl TypeRegistry {
    pub fn builder(catalog: Arc<Catalog>) -> TypeRegistryBuilder {
        TypeRegistryBuilder {
            catalog,
            definitions: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = &ModelType> + '_ {
        self.types.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ModelType> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn type_for_model(&self, model: &str) -> Option<&ModelType> {
        let name = self.type_names.get(model)?;
        self.get(name)
    }

    pub fn type_names(&self) -> &TypeNames {
        &self.type_names
    }

    /// `{ objectType, fields }` per registered type.
    pub fn object_schemas(&self) -> &SchemaRegistry {
        &self.object_schemas
    }
}

pub struct TypeRegistryBuilder {
    catalog: Arc<Catalog>,
    definitions: Vec<ModelTypeDefinition>,
}

impl TypeRegistryBuilder {
    #[must_use]
    pub fn register(mut self, definition: ModelTypeDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn build(self) -> Result<TypeRegistry, SchemaError> {
        let Self { catalog, definitions } = self;

        let mut names: HashMap<String, String> = HashMap::new();

        for definition in &definitions {
            let model = catalog
                .find_model(&definition.model)
                .ok_or_else(|| SchemaError::UnknownModel(definition.model.clone()))?;

            let name = type_name(definition, model);

            if names.values().any(|existing| existing == &name) {
                return Err(SchemaError::DuplicateType(name));
            }

            if let Some(existing) = names.get(model.name()) {
                return Err(SchemaError::DuplicateModelType {
                    model: model.name().to_string(),
                    existing: existing.clone(),
                });
            }

            names.insert(model.name().to_string(), name);
        }

        let type_names = TypeNames(names);
        let mut types = Vec::with_capacity(definitions.len());
        let mut object_schemas = SchemaRegistry::default();

        for definition in definitions {
            let model = catalog
                .find_model(&definition.model)
                .ok_or_else(|| SchemaError::UnknownModel(definition.model.clone()))?;

            let mut fields = Vec::new();
            let mut descriptors = Vec::new();

            for field in model.fields() {
                let name = field.name();

                if field.definition().is_hidden()
                    || (!definition.only_fields.is_empty() && !definition.only_fields.iter().any(|f| f == name))
                    || definition.exclude_fields.iter().any(|f| f == name)
                {
                    continue;
                }

                let Some(shape) = output_shape(field, &type_names)? else {
                    continue;
                };

                let field_definition = field.definition();
                let nullable = !field.is_primary_key()
                    && !matches!(shape, TypeShape::Connection(_))
                    && (field_definition.null || field.field_type().is_reverse());

                fields.push(OutputField {
                    field: name.to_string(),
                    name: name.to_lower_camel_case(),
                    shape,
                    nullable,
                    description: Some(field_definition.help_text.clone()).filter(|text| !text.is_empty()),
                });

                descriptors.push(describe_field(field, &type_names)?);
            }

            let name = type_name(&definition, model);

            object_schemas.insert(name.clone(), descriptors)?;

            types.push(ModelType {
                list_field: definition
                    .list_field
                    .unwrap_or_else(|| model.verbose_name_plural().to_lower_camel_case()),
                node_field: definition
                    .node_field
                    .unwrap_or_else(|| model.name().to_lower_camel_case()),
                name,
                model: model.id(),
                description: definition.description,
                fields,
                allow_unauthenticated: definition.allow_unauthenticated,
                permissions: definition.permissions,
                permissions_any: definition.permissions_any,
                object_permissions: definition.object_permissions,
                object_permissions_any: definition.object_permissions_any,
            });
        }

        tracing::info!("registered {} object types", types.len());

        Ok(TypeRegistry {
            catalog,
            types,
            type_names,
            object_schemas,
        })
    }
}

fn type_name(definition: &ModelTypeDefinition, model: ModelWalker<'_>) -> String {
    definition
        .name
        .clone()
        .unwrap_or_else(|| format!("{}Type", model.name()))
}
