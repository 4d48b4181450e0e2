use std::sync::Arc;

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use indexmap::IndexMap;
use model_catalog::{Catalog, FieldType, FieldWalker, ModelId, ModelWalker};
use model_schema::{describe_field, input_shape, is_required, ChoiceEnum, FieldDescriptor, SchemaRegistry, TypeRegistry, TypeShape};
use serde_json::Value;

use crate::{ConfigurationError, MutationHooks, NoHooks, Settings};

/// Fields managed by the datastore, never accepted as input.
const AUDIT_FIELDS: [&str; 3] = ["created_at", "updated_at", "archived_at"];

/// What a mutation does with the entity it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum MutationKind {
    /// Creates an entity. The input has no `id`.
    Create,
    /// Updates the entity with the required `id`.
    Update,
    /// Deletes the entity with the required `id`, the only input field.
    Delete,
    /// Updates the entity when an `id` is given and creates one otherwise.
    #[strum(serialize = "Save")]
    Model,
}

/// Options of a mutation over one model.
#[derive(Clone)]
pub struct MutationDefinition {
    kind: MutationKind,
    model: String,
    name: Option<String>,
    description: Option<String>,
    only_fields: Vec<String>,
    exclude_fields: Vec<String>,
    required_fields: Option<Vec<String>>,
    permissions: Vec<String>,
    permissions_any: bool,
    allow_unauthenticated: bool,
    object_permissions: Vec<String>,
    object_permissions_any: bool,
    return_field_name: Option<String>,
    input_schema: IndexMap<String, Value>,
    rollback_on_deferred_denial: bool,
    hooks: Arc<dyn MutationHooks>,
}

impl MutationDefinition {
    pub fn new(kind: MutationKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            name: None,
            description: None,
            only_fields: Vec::new(),
            exclude_fields: Vec::new(),
            required_fields: None,
            permissions: Vec::new(),
            permissions_any: true,
            allow_unauthenticated: false,
            object_permissions: Vec::new(),
            object_permissions_any: true,
            return_field_name: None,
            input_schema: IndexMap::new(),
            rollback_on_deferred_denial: false,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn create(model: impl Into<String>) -> Self {
        Self::new(MutationKind::Create, model)
    }

    pub fn update(model: impl Into<String>) -> Self {
        Self::new(MutationKind::Update, model)
    }

    pub fn delete(model: impl Into<String>) -> Self {
        Self::new(MutationKind::Delete, model)
    }

    /// A create-or-update mutation, named `<model>Save`.
    pub fn model(model: impl Into<String>) -> Self {
        Self::new(MutationKind::Model, model)
    }

    /// The mutation field name, `<model><Kind>` by default.
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

    /// Decides which input fields are required, instead of the field definitions.
    #[must_use]
    pub fn required_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.required_fields = Some(fields.into_iter().map(Into::into).collect());
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
    pub fn allow_unauthenticated(mut self) -> Self {
        self.allow_unauthenticated = true;
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

    /// The payload field holding the mutated entity, the camel-cased model name by default.
    #[must_use]
    pub fn return_field_name(mut self, name: impl Into<String>) -> Self {
        self.return_field_name = Some(name.into());
        self
    }

    /// Overrides parts of the reflected descriptor of an input field.
    #[must_use]
    pub fn input_schema(mut self, field: impl Into<String>, overrides: Value) -> Self {
        self.input_schema.insert(field.into(), overrides);
        self
    }

    /// Rolls a creation back when the user turns out to lack the object permissions on
    /// the created entity. By default the entity stays and only the response withholds it.
    #[must_use]
    pub fn rollback_on_deferred_denial(mut self) -> Self {
        self.rollback_on_deferred_denial = true;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: impl MutationHooks) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    fn apply_presets(&mut self) {
        let id = String::from("id");

        match self.kind {
            MutationKind::Create => {
                if !self.exclude_fields.contains(&id) {
                    self.exclude_fields.push(id);
                }
            }
            MutationKind::Update => {
                if !self.only_fields.is_empty() && !self.only_fields.contains(&id) {
                    self.only_fields.insert(0, id.clone());
                }

                let required = self.required_fields.get_or_insert_with(Vec::new);
                if !required.contains(&id) {
                    required.insert(0, id);
                }
            }
            MutationKind::Delete => {
                self.only_fields = vec![id.clone()];
                self.required_fields = Some(vec![id]);
            }
            MutationKind::Model => {}
        }
    }

    fn build(mut self, types: &TypeRegistry, settings: &Settings) -> Result<Mutation, ConfigurationError> {
        self.apply_presets();

        let catalog = types.catalog();
        let model = catalog
            .find_model(&self.model)
            .ok_or_else(|| ConfigurationError::UnknownModel(self.model.clone()))?;

        let model_type = types
            .type_for_model(model.name())
            .ok_or_else(|| ConfigurationError::MissingType(model.name().to_string()))?;

        for name in self
            .only_fields
            .iter()
            .chain(&self.exclude_fields)
            .chain(self.required_fields.iter().flatten())
        {
            if model.field(name).is_none() {
                return Err(ConfigurationError::UnknownField {
                    model: model.name().to_string(),
                    field: name.clone(),
                });
            }
        }

        let field_name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{}{}", model.name().to_lower_camel_case(), self.kind));
        let type_prefix = field_name.to_upper_camel_case();
        let input_name = format!("{type_prefix}MutationInput");

        let mut input_fields = Vec::new();
        let mut input_schema = Vec::new();

        for field in model.fields() {
            if !self.accepts(field, settings) {
                continue;
            }

            let required = match &self.required_fields {
                Some(required) => required.iter().any(|name| name == field.name()),
                None => is_required(field),
            };

            let mut descriptor = describe_field(field, types.type_names())?;
            descriptor.validation.required = required;

            if let Some(overrides) = self.input_schema.get(field.name()) {
                descriptor = descriptor.merged(overrides)?;
            }

            input_fields.push(InputField {
                name: field.name().to_string(),
                graphql_name: field.name().to_lower_camel_case(),
                shape: input_shape(field)?,
                required,
                description: input_description(field),
                choices: ChoiceEnum::for_field(field),
            });

            input_schema.push(descriptor);
        }

        if let Some(unknown) = self
            .input_schema
            .keys()
            .find(|name| !input_fields.iter().any(|field| &field.name == *name))
        {
            return Err(ConfigurationError::UnknownOverride {
                input: input_name,
                field: unknown.clone(),
            });
        }

        Ok(Mutation {
            kind: self.kind,
            model: model.id(),
            type_name: model_type.name().to_string(),
            payload_name: format!("{type_prefix}MutationPayload"),
            input_name,
            field_name,
            return_field_name: self
                .return_field_name
                .unwrap_or_else(|| model.name().to_lower_camel_case()),
            description: self.description,
            input_fields,
            input_schema,
            exclude_fields: self.exclude_fields,
            permissions: self.permissions,
            permissions_any: self.permissions_any,
            allow_unauthenticated: self.allow_unauthenticated,
            object_permissions: self.object_permissions,
            object_permissions_any: self.object_permissions_any,
            rollback_on_deferred_denial: self.rollback_on_deferred_denial,
            hooks: self.hooks,
        })
    }

    fn accepts(&self, field: FieldWalker<'_>, settings: &Settings) -> bool {
        let name = field.name();

        if (!self.only_fields.is_empty() && !self.only_fields.iter().any(|f| f == name))
            || self.exclude_fields.iter().any(|f| f == name)
            || field.definition().is_hidden()
            || AUDIT_FIELDS.contains(&name)
        {
            return false;
        }

        match field.field_type() {
            FieldType::ManyToOneRel { .. } => settings.include_reverse_relations || !self.only_fields.is_empty(),
            FieldType::OneToOneRel { .. } => false,
            _ => true,
        }
    }
}

fn input_description(field: FieldWalker<'_>) -> Option<String> {
    if field.is_primary_key() {
        return Some(String::from("The ID of the object."));
    }

    if field.field_type().is_reverse() {
        let related = field.related_model()?;
        return Some(format!("Set list of {}", related.verbose_name_plural()));
    }

    Some(field.definition().help_text.clone()).filter(|text| !text.is_empty())
}

/// A field of a mutation input object.
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    /// The model field name.
    pub name: String,
    pub graphql_name: String,
    pub shape: TypeShape,
    pub required: bool,
    pub description: Option<String>,
    pub choices: Option<ChoiceEnum>,
}

/// A mutation ready to execute.
pub struct Mutation {
    pub(crate) kind: MutationKind,
    pub(crate) model: ModelId,
    pub(crate) type_name: String,
    pub(crate) field_name: String,
    pub(crate) input_name: String,
    pub(crate) payload_name: String,
    pub(crate) return_field_name: String,
    pub(crate) description: Option<String>,
    pub(crate) input_fields: Vec<InputField>,
    pub(crate) input_schema: Vec<FieldDescriptor>,
    pub(crate) exclude_fields: Vec<String>,
    pub(crate) permissions: Vec<String>,
    pub(crate) permissions_any: bool,
    pub(crate) allow_unauthenticated: bool,
    pub(crate) object_permissions: Vec<String>,
    pub(crate) object_permissions_any: bool,
    pub(crate) rollback_on_deferred_denial: bool,
    pub(crate) hooks: Arc<dyn MutationHooks>,
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn model<'a>(&self, catalog: &'a Catalog) -> ModelWalker<'a> {
        catalog.walk(self.model)
    }

    /// The object type of the mutated entity.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn payload_name(&self) -> &str {
        &self.payload_name
    }

    pub fn return_field_name(&self) -> &str {
        &self.return_field_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn input_fields(&self) -> &[InputField] {
        &self.input_fields
    }

    pub fn input_field(&self, name: &str) -> Option<&InputField> {
        self.input_fields.iter().find(|field| field.name == name)
    }

    /// The reflected descriptors of the input fields.
    pub fn input_schema(&self) -> &[FieldDescriptor] {
        &self.input_schema
    }
}

/// Every mutation of a schema, with the reflected input schemas.
pub struct MutationRegistry {
    mutations: Vec<Mutation>,
    input_schemas: SchemaRegistry,
}

impl MutationRegistry {
    pub fn build(
        types: &TypeRegistry,
        settings: &Settings,
        definitions: impl IntoIterator<Item = MutationDefinition>,
    ) -> Result<Self, ConfigurationError> {
        let mut mutations: Vec<Mutation> = Vec::new();
        let mut input_schemas = SchemaRegistry::default();

        for definition in definitions {
            let mutation = definition.build(types, settings)?;

            if mutations.iter().any(|existing| existing.field_name == mutation.field_name) {
                return Err(ConfigurationError::DuplicateMutation(mutation.field_name));
            }

            input_schemas.insert(mutation.input_name.clone(), mutation.input_schema.clone())?;
            mutations.push(mutation);
        }

        tracing::info!("registered {} mutations", mutations.len());

        Ok(Self {
            mutations,
            input_schemas,
        })
    }

    pub fn get(&self, field_name: &str) -> Option<&Mutation> {
        self.mutations.iter().find(|mutation| mutation.field_name == field_name)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Mutation> + '_ {
        self.mutations.iter()
    }

    /// `{ inputObject, fields }` per mutation input.
    pub fn input_schemas(&self) -> &SchemaRegistry {
        &self.input_schemas
    }
}
