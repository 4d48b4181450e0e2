use std::collections::BTreeMap;

use async_graphql::{
    dynamic::{Field, FieldFuture, FieldValue, InputObject, InputValue, Object, TypeRef},
    Value,
};
use indexmap::IndexMap;
use model_mutations::{Mutation, MutationPayload, MutationRegistry, PayloadError};
use model_schema::ChoiceEnum;

use crate::{
    objects::type_ref,
    reflection::value_field,
    scalars::input_value,
    scope::Scope,
};

pub(crate) const MUTATION: &str = "Mutation";
const ERROR_TYPE: &str = "MutationErrorType";
const CLIENT_MUTATION_ID: &str = "clientMutationId";

/// The mutation root with the input and payload types of every mutation.
pub(crate) struct MutationTypes {
    /// `None` without mutations, as a root type needs fields.
    pub(crate) root: Option<Object>,
    pub(crate) objects: Vec<Object>,
    pub(crate) inputs: Vec<InputObject>,
    pub(crate) enums: BTreeMap<String, ChoiceEnum>,
}

impl MutationTypes {
    pub(crate) fn build(mutations: &MutationRegistry) -> Self {
        let mut objects = vec![error_type()];
        let mut inputs = Vec::with_capacity(mutations.iter().len());
        let mut enums = BTreeMap::new();
        let mut root = None;

        for mutation in mutations.iter() {
            for choices in mutation.input_fields().iter().filter_map(|field| field.choices.as_ref()) {
                enums.insert(choices.name.clone(), choices.clone());
            }

            inputs.push(input_object(mutation));
            objects.push(payload_object(mutation));

            root = Some(root.unwrap_or_else(|| Object::new(MUTATION)).field(mutation_field(mutation)));
        }

        Self {
            root,
            objects,
            inputs,
            enums,
        }
    }
}

fn error_type() -> Object {
    Object::new(ERROR_TYPE)
        .description("An error that happened in a mutation.")
        .field(value_field(
            "field",
            TypeRef::named(TypeRef::STRING),
            "The field that caused the error, or `null` if it isn't associated with any particular field.",
            |error: &PayloadError| error.field.clone().map_or(Value::Null, Value::String),
        ))
        .field(value_field(
            "message",
            TypeRef::named(TypeRef::STRING),
            "The error message.",
            |error: &PayloadError| Value::String(error.message.clone()),
        ))
}

fn input_object(mutation: &Mutation) -> InputObject {
    let input = mutation
        .input_fields()
        .iter()
        .fold(InputObject::new(mutation.input_name()), |input, field| {
            let value = InputValue::new(&field.graphql_name, type_ref(&field.shape, !field.required));

            input.field(match &field.description {
                Some(description) => value.description(description),
                None => value,
            })
        });

    input.field(InputValue::new(CLIENT_MUTATION_ID, TypeRef::named(TypeRef::STRING)))
}

fn payload_object(mutation: &Mutation) -> Object {
    Object::new(mutation.payload_name())
        .field(Field::new(
            mutation.return_field_name(),
            TypeRef::named(mutation.type_name()),
            |ctx| {
                FieldFuture::new(async move {
                    let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                    Ok(payload.entity.as_ref().map(|entity| FieldValue::borrowed_any(entity)))
                })
            },
        ))
        .field(Field::new(
            "errors",
            TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::named_nn(ERROR_TYPE))))),
            |ctx| {
                FieldFuture::new(async move {
                    let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;

                    Ok(Some(FieldValue::list(
                        payload.errors.iter().map(|error| FieldValue::borrowed_any(error)),
                    )))
                })
            },
        ))
        .field(Field::new(CLIENT_MUTATION_ID, TypeRef::named(TypeRef::STRING), |ctx| {
            FieldFuture::new(async move {
                let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                Ok(payload.client_mutation_id.clone().map(FieldValue::value))
            })
        }))
}

fn mutation_field(mutation: &Mutation) -> Field {
    let field_name = mutation.field_name().to_string();

    let field = Field::new(mutation.field_name(), TypeRef::named(mutation.payload_name()), move |ctx| {
        let field_name = field_name.clone();

        FieldFuture::new(async move {
            let scope = Scope::of(&ctx)?;

            let mutation = scope
                .state
                .mutations
                .get(&field_name)
                .ok_or_else(|| async_graphql::Error::new(format!("unknown mutation {field_name}")))?;

            let argument = ctx.args.try_get("input")?;
            let Value::Object(fields) = argument.as_value().clone() else {
                return Err(async_graphql::Error::new("the mutation input must be an object"));
            };

            let mut input = IndexMap::with_capacity(fields.len());
            let mut client_mutation_id = None;

            for (name, value) in fields {
                if name.as_str() == CLIENT_MUTATION_ID {
                    if let Value::String(id) = value {
                        client_mutation_id = Some(id);
                    }
                    continue;
                }

                if let Some(field) = mutation
                    .input_fields()
                    .iter()
                    .find(|field| field.graphql_name == name.as_str())
                {
                    input.insert(field.name.clone(), input_value(&field.shape, value));
                }
            }

            let payload = mutation.execute(&scope.mutation(), &input, client_mutation_id)?;

            Ok(Some(FieldValue::owned_any(payload)))
        })
    })
    .argument(InputValue::new("input", TypeRef::named_nn(mutation.input_name())));

    match mutation.description() {
        Some(description) => field.description(description),
        None => field,
    }
}
