use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use model_catalog::{FieldType, ModelWalker};
use model_permissions::{check_authenticated, check_perms};
use model_store::{atomic, Entity, EntityId, FormValue};
use serde::Serialize;
use serde_json::Value;

use crate::{
    full_clean, get_node, get_nodes, CleanedInput, CleanedValue, Mutation, MutationContext, MutationError,
    MutationKind, ValidationError, PERMISSION_DENIED_MESSAGE,
};

/// An error reported in a mutation payload. `field` is camel-cased, and `None` for errors
/// about the entity as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadError {
    pub field: Option<String>,
    pub message: String,
}

/// The outcome of a mutation: the entity on success, the errors otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationPayload {
    pub entity: Option<Entity>,
    pub errors: Vec<PayloadError>,
    pub client_mutation_id: Option<String>,
}

impl MutationPayload {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Mutation {
    /// Runs the mutation for the user of `ctx`.
    ///
    /// `input` holds the raw input values by model field name: global ids for relations,
    /// upload tokens for files and enum item names for choice fields. Validation errors and,
    /// unless disabled in the settings, permission denials are returned in the payload.
    pub fn execute(
        &self,
        ctx: &MutationContext<'_>,
        input: &IndexMap<String, Value>,
        client_mutation_id: Option<String>,
    ) -> Result<MutationPayload, MutationError> {
        let span = tracing::info_span!("mutation", name = %self.field_name);
        let _guard = span.enter();

        let result = if self.check_permissions(ctx) {
            self.perform(ctx, input)
        } else {
            Err(MutationError::denied())
        };

        let (entity, errors) = match result {
            Ok(entity) => (Some(entity), Vec::new()),
            Err(MutationError::Validation(error)) => {
                tracing::debug!("validation failed: {error}");

                let errors = error
                    .errors()
                    .map(|(field, message)| PayloadError {
                        field: field.map(|field| field.to_lower_camel_case()),
                        message: message.to_string(),
                    })
                    .collect();

                (None, errors)
            }
            Err(MutationError::PermissionDenied(denied)) if ctx.settings.swallow_permission_denied => {
                tracing::warn!("{:?} was denied: {}", ctx.query.user.username, denied.message);

                let message = if denied.message.is_empty() {
                    PERMISSION_DENIED_MESSAGE.to_string()
                } else {
                    denied.message
                };

                (None, vec![PayloadError { field: None, message }])
            }
            Err(error) => return Err(error),
        };

        Ok(MutationPayload {
            entity,
            errors,
            client_mutation_id,
        })
    }

    /// Whether the user of `ctx` may run this mutation at all.
    pub fn check_permissions(&self, ctx: &MutationContext<'_>) -> bool {
        let user = ctx.query.user;

        if !self.allow_unauthenticated && !check_authenticated(user) {
            return false;
        }

        if self.permissions.is_empty() {
            return true;
        }

        check_perms(user, self.permissions.as_slice(), self.permissions_any, true)
    }

    /// Whether the user of `ctx` holds the object permissions of this mutation on `entity`.
    pub fn check_object_permissions(&self, ctx: &MutationContext<'_>, entity: &Entity) -> Result<bool, MutationError> {
        let model = self.model(ctx.query.catalog());

        if self.object_permissions.is_empty() || !model.is_guarded() {
            return Ok(true);
        }

        let granted = ctx.query.permissions.has_perm(
            ctx.query.store,
            ctx.query.user,
            model,
            entity,
            self.object_permissions.as_slice(),
            self.object_permissions_any,
        )?;

        Ok(granted)
    }

    /// The entity behind the global id `id`, if the user may see it and holds the object
    /// permissions on it.
    pub fn get_instance(&self, ctx: &MutationContext<'_>, id: &str) -> Result<Entity, MutationError> {
        let only_type = ctx.query.types.get(&self.type_name);

        let Some(entity) = get_node(&ctx.query, id, "id", only_type)? else {
            return Err(ValidationError::field("id", format!("Couldn't resolve to a node: {id}")).into());
        };

        if !self.check_object_permissions(ctx, &entity)? {
            return Err(MutationError::denied());
        }

        Ok(entity)
    }

    fn perform(&self, ctx: &MutationContext<'_>, input: &IndexMap<String, Value>) -> Result<Entity, MutationError> {
        match self.kind {
            MutationKind::Delete => self.perform_delete(ctx, input),
            MutationKind::Create | MutationKind::Update | MutationKind::Model => self.perform_save(ctx, input),
        }
    }

    fn perform_save(&self, ctx: &MutationContext<'_>, input: &IndexMap<String, Value>) -> Result<Entity, MutationError> {
        let model = self.model(ctx.query.catalog());
        let id = input.get("id").and_then(Value::as_str).filter(|id| !id.is_empty());

        // New entities can only be checked against object permissions once saved.
        let checked = id.is_some();
        let check_in_transaction = !checked && self.rollback_on_deferred_denial;

        let entity = atomic(ctx.query.store, || {
            let mut entity = match id {
                Some(id) => self.get_instance(ctx, id)?,
                None => Entity::new(model),
            };

            let cleaned = self.clean_input(ctx, input)?;
            tracing::debug!("cleaned {} input fields", cleaned.len());

            self.create_instance(model, &mut entity, &cleaned);
            self.clean_instance(ctx, model, &mut entity, &cleaned)?;
            self.save(ctx, &mut entity, &cleaned)?;
            self.set_relations(ctx, model, &entity, &cleaned)?;

            if check_in_transaction && !self.check_object_permissions(ctx, &entity)? {
                return Err(MutationError::denied());
            }

            Ok::<_, MutationError>(entity)
        })?;

        if !checked && !check_in_transaction && !self.check_object_permissions(ctx, &entity)? {
            tracing::warn!("{} was created but its creator cannot access it", self.type_name);
            return Err(MutationError::denied());
        }

        Ok(entity)
    }

    fn perform_delete(&self, ctx: &MutationContext<'_>, input: &IndexMap<String, Value>) -> Result<Entity, MutationError> {
        let id = input.get("id").and_then(Value::as_str).unwrap_or_default();

        atomic(ctx.query.store, || {
            let mut entity = self.get_instance(ctx, id)?;
            let pk = entity.pk();

            self.hooks.before_delete(ctx, &entity)?;
            ctx.query.store.delete(&entity)?;
            self.hooks.after_delete(ctx, &entity)?;

            tracing::debug!("deleted {} {:?}", entity.model(), pk);

            // The payload still identifies the deleted entity.
            entity.set_pk(pk);

            Ok(entity)
        })
    }

    /// Resolves global ids, upload tokens and enum item names of the input fields present in
    /// `input`.
    pub fn clean_input(
        &self,
        ctx: &MutationContext<'_>,
        input: &IndexMap<String, Value>,
    ) -> Result<CleanedInput, MutationError> {
        let catalog = ctx.query.catalog();
        let model = self.model(catalog);
        let mut cleaned = CleanedInput::default();

        for field in &self.input_fields {
            let Some(value) = input.get(&field.name) else {
                continue;
            };

            let Some(model_field) = model.field(&field.name) else {
                continue;
            };

            if model_field.is_primary_key() {
                continue;
            }

            let related_type = model_field
                .related_model()
                .and_then(|related| ctx.query.types.type_for_model(related.name()));

            let value = if value.is_null() {
                CleanedValue::Null
            } else if field.shape.is_id_list() {
                let ids = id_list(&field.name, value)?;

                if ids.is_empty() {
                    CleanedValue::Entities(Vec::new())
                } else {
                    CleanedValue::Entities(get_nodes(&ctx.query, &ids, &field.name, related_type)?)
                }
            } else if field.shape.is_id() {
                let id = value
                    .as_str()
                    .ok_or_else(|| ValidationError::field(&field.name, "Expected an ID."))?;

                match get_node(&ctx.query, id, &field.name, related_type)? {
                    Some(entity) => CleanedValue::Entity(entity),
                    None => CleanedValue::Null,
                }
            } else if field.shape.is_upload() {
                let file = value.as_str().and_then(|token| ctx.uploads.get(token)).cloned();
                CleanedValue::File(file)
            } else if let Some(choices) = &field.choices {
                let chosen = value.as_str().and_then(|item| choices.value_of(item));
                CleanedValue::Value(chosen.cloned().unwrap_or_else(|| value.clone()))
            } else {
                CleanedValue::Value(value.clone())
            };

            cleaned.insert(field.name.clone(), value);
        }

        Ok(cleaned)
    }

    /// Writes the cleaned values of the editable concrete fields into `entity`.
    pub fn create_instance(&self, model: ModelWalker<'_>, entity: &mut Entity, cleaned: &CleanedInput) {
        for field in model.concrete_fields() {
            let definition = field.definition();

            if !definition.editable || field.field_type().is_auto() {
                continue;
            }

            let Some(value) = cleaned.get(field.name()) else {
                continue;
            };

            let form_value = match value {
                value if value.is_null() => {
                    if field.field_type().is_file() {
                        FormValue::ClearFile
                    } else if definition.null {
                        FormValue::Null
                    } else {
                        FormValue::from(definition.get_default())
                    }
                }
                CleanedValue::Entity(related) => match related.pk() {
                    Some(pk) => FormValue::Value(pk.into()),
                    None => FormValue::Null,
                },
                CleanedValue::File(Some(file)) => FormValue::File(file.clone()),
                CleanedValue::Value(value) => FormValue::from(value.clone()),
                CleanedValue::Null | CleanedValue::File(None) | CleanedValue::Entities(_) => continue,
            };

            entity.save_form_data(field, form_value);
        }
    }

    fn clean_instance(
        &self,
        ctx: &MutationContext<'_>,
        model: ModelWalker<'_>,
        entity: &mut Entity,
        cleaned: &CleanedInput,
    ) -> Result<(), MutationError> {
        let mut errors = match full_clean(ctx.query.store, model, entity, &self.exclude_fields) {
            Ok(()) => ValidationError::default(),
            Err(MutationError::Validation(errors)) => errors,
            Err(error) => return Err(error),
        };

        match self.hooks.clean_instance(ctx, entity, cleaned) {
            Ok(()) => {}
            Err(MutationError::Validation(more)) => errors.extend(more),
            Err(error) => return Err(error),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    fn save(&self, ctx: &MutationContext<'_>, entity: &mut Entity, cleaned: &CleanedInput) -> Result<(), MutationError> {
        self.hooks.before_save(ctx, entity, cleaned)?;
        ctx.query.store.save(entity)?;
        self.hooks.after_save(ctx, entity, cleaned)?;

        tracing::debug!("saved {} {:?}", entity.model(), entity.pk());

        Ok(())
    }

    /// Replaces the members of the many-to-many and reverse relations given in the input.
    fn set_relations(
        &self,
        ctx: &MutationContext<'_>,
        model: ModelWalker<'_>,
        entity: &Entity,
        cleaned: &CleanedInput,
    ) -> Result<(), MutationError> {
        let Some(pk) = entity.pk() else {
            return Ok(());
        };

        let relations = model.many_to_many_fields().chain(
            model
                .related_objects()
                .filter(|field| !matches!(field.field_type(), FieldType::OneToOneRel { .. })),
        );

        for field in relations {
            let Some(CleanedValue::Entities(related)) = cleaned.get(field.name()) else {
                continue;
            };

            let pks: Vec<EntityId> = related.iter().filter_map(Entity::pk).collect();
            tracing::debug!("setting {} {}", pks.len(), field.name());
            ctx.query.store.set_related(model.name(), pk, field.name(), &pks)?;
        }

        Ok(())
    }
}

fn id_list(field: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    let invalid = || ValidationError::field(field, "Expected a list of IDs.");

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|id| id.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}
