//! Queries exposing the reflected object and input schemas.

use std::any::Any;

use async_graphql::{
    dynamic::{Enum, EnumItem, Field, FieldFuture, FieldValue, InputValue, Object, TypeRef},
    Name, Value,
};
use model_schema::{ChoiceDescriptor, FieldDescriptor, FieldKind, SchemaRegistry};
use strum::IntoEnumIterator;

use crate::scope::Scope;

const FIELD_KIND: &str = "FieldKind";
const CHOICE_TYPE: &str = "InputSchemaFieldChoiceType";
const FIELD_TYPE: &str = "InputSchemaFieldType";
const INPUT_SCHEMA_TYPE: &str = "InputSchemaType";
const OBJECT_SCHEMA_TYPE: &str = "ObjectSchemaType";

/// A named list of descriptors.
struct SchemaEntry {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaEntry {
    fn new(name: &str, fields: &[FieldDescriptor]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.to_vec(),
        }
    }
}

pub(crate) fn field_kind_enum() -> Enum {
    FieldKind::iter().fold(
        Enum::new(FIELD_KIND).description("The kind of a field, as a form control should render it."),
        |graphql_enum, kind| graphql_enum.item(EnumItem::new(kind.name()).description(kind.value())),
    )
}

pub(crate) fn objects() -> [Object; 4] {
    [
        choice_type(),
        field_type(),
        schema_type(INPUT_SCHEMA_TYPE, "inputObject", "The input schema.", "The name of the input object."),
        schema_type(
            OBJECT_SCHEMA_TYPE,
            "objectType",
            "The schema of an object type.",
            "The name of the object type.",
        ),
    ]
}

pub(crate) fn query_fields() -> [Field; 4] {
    [
        schema_field(
            "gqlObjectSchema",
            OBJECT_SCHEMA_TYPE,
            "objectType",
            "GraphQL object schema for forms.",
            |scope| scope.state.types.object_schemas(),
        ),
        schema_list_field(
            "gqlObjectSchemaAll",
            OBJECT_SCHEMA_TYPE,
            "GraphQL object schema for forms.",
            |scope| scope.state.types.object_schemas(),
        ),
        schema_field(
            "gqlInputSchema",
            INPUT_SCHEMA_TYPE,
            "inputObject",
            "GraphQL input schema for forms.",
            |scope| scope.state.mutations.input_schemas(),
        ),
        schema_list_field(
            "gqlInputSchemaAll",
            INPUT_SCHEMA_TYPE,
            "GraphQL input schema for forms.",
            |scope| scope.state.mutations.input_schemas(),
        ),
    ]
}

type Registry = for<'a> fn(&Scope<'a>) -> &'a SchemaRegistry;

fn schema_field(name: &str, type_name: &str, argument: &'static str, description: &str, registry: Registry) -> Field {
    Field::new(name, TypeRef::named(type_name), move |ctx| {
        FieldFuture::new(async move {
            let scope = Scope::of(&ctx)?;
            let value = ctx.args.try_get(argument)?;
            let name = value.string()?;

            Ok(registry(&scope)
                .get(name)
                .map(|fields| FieldValue::owned_any(SchemaEntry::new(name, fields))))
        })
    })
    .argument(InputValue::new(argument, TypeRef::named_nn(TypeRef::STRING)))
    .description(description)
}

fn schema_list_field(name: &str, type_name: &str, description: &str, registry: Registry) -> Field {
    let type_ref = TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::named_nn(type_name)))));

    Field::new(name, type_ref, move |ctx| {
        FieldFuture::new(async move {
            let scope = Scope::of(&ctx)?;

            let entries = registry(&scope)
                .iter()
                .map(|(name, fields)| FieldValue::owned_any(SchemaEntry::new(name, fields)));

            Ok(Some(FieldValue::list(entries)))
        })
    })
    .description(description)
}

fn schema_type(type_name: &str, name_field: &str, description: &str, name_description: &str) -> Object {
    Object::new(type_name)
        .description(description)
        .field(value_field(
            name_field,
            TypeRef::named_nn(TypeRef::STRING),
            name_description,
            |entry: &SchemaEntry| Value::String(entry.name.clone()),
        ))
        .field(
            Field::new(
                "fields",
                TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::named_nn(FIELD_TYPE))))),
                |ctx| {
                    FieldFuture::new(async move {
                        let entry = ctx.parent_value.try_downcast_ref::<SchemaEntry>()?;

                        Ok(Some(FieldValue::list(
                            entry.fields.iter().map(|field| FieldValue::borrowed_any(field)),
                        )))
                    })
                },
            )
            .description("The fields of the object."),
        )
}

fn choice_type() -> Object {
    Object::new(CHOICE_TYPE)
        .description("An input schema field choice.")
        .field(value_field(
            "label",
            TypeRef::named_nn(TypeRef::STRING),
            "The choice's label.",
            |choice: &ChoiceDescriptor| Value::String(choice.label.clone()),
        ))
        .field(value_field(
            "name",
            TypeRef::named_nn(TypeRef::STRING),
            "The choice's enum item name.",
            |choice: &ChoiceDescriptor| Value::String(choice.name.clone()),
        ))
        .field(value_field(
            "value",
            TypeRef::named_nn("JSONString"),
            "The choice's value as a JSON string.",
            |choice: &ChoiceDescriptor| Value::String(choice.value.clone()),
        ))
}

fn field_type() -> Object {
    let string = |value: &Option<String>| value.clone().map_or(Value::Null, Value::String);

    Object::new(FIELD_TYPE)
        .description("The input schema field.")
        .field(value_field(
            "field",
            TypeRef::named_nn(TypeRef::STRING),
            "The name of the field",
            |field: &FieldDescriptor| Value::String(field.field.clone()),
        ))
        .field(value_field(
            "kind",
            TypeRef::named_nn(FIELD_KIND),
            "The kind of this field.",
            |field: &FieldDescriptor| Value::Enum(Name::new(field.kind.name())),
        ))
        .field(value_field(
            "multiple",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            "If this field expects an array of values.",
            |field: &FieldDescriptor| Value::Boolean(field.multiple),
        ))
        .field(
            Field::new(
                "choices",
                TypeRef::List(Box::new(TypeRef::named_nn(CHOICE_TYPE))),
                |ctx| {
                    FieldFuture::new(async move {
                        let field = ctx.parent_value.try_downcast_ref::<FieldDescriptor>()?;

                        Ok(field.choices.as_ref().map(|choices| {
                            FieldValue::list(choices.iter().map(|choice| FieldValue::borrowed_any(choice)))
                        }))
                    })
                },
            )
            .description("Choices for this field."),
        )
        .field(value_field(
            "verboseName",
            TypeRef::named(TypeRef::STRING),
            "The field's humanized name.",
            move |field: &FieldDescriptor| string(&field.verbose_name),
        ))
        .field(value_field(
            "helpText",
            TypeRef::named(TypeRef::STRING),
            "A help text for the field.",
            move |field: &FieldDescriptor| string(&field.help_text),
        ))
        .field(value_field(
            "required",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            "If a value must be given for this field.",
            |field: &FieldDescriptor| Value::Boolean(field.validation.required),
        ))
        .field(value_field(
            "minLength",
            TypeRef::named(TypeRef::INT),
            "Min length for string kinds.",
            |field: &FieldDescriptor| int(field.validation.min_length),
        ))
        .field(value_field(
            "maxLength",
            TypeRef::named(TypeRef::INT),
            "Max length for string kinds.",
            |field: &FieldDescriptor| int(field.validation.max_length),
        ))
        .field(value_field(
            "minValue",
            TypeRef::named(TypeRef::INT),
            "Min value for numeric kinds.",
            |field: &FieldDescriptor| int(field.validation.min_value),
        ))
        .field(value_field(
            "maxValue",
            TypeRef::named(TypeRef::INT),
            "Max value for numeric kinds.",
            |field: &FieldDescriptor| int(field.validation.max_value),
        ))
        .field(value_field(
            "maxDigits",
            TypeRef::named(TypeRef::INT),
            "Max digits for decimal kinds (null otherwise).",
            |field: &FieldDescriptor| int(field.validation.max_digits),
        ))
        .field(value_field(
            "decimalPlaces",
            TypeRef::named(TypeRef::INT),
            "Max decimal places for decimal kinds (null otherwise).",
            |field: &FieldDescriptor| int(field.validation.decimal_places),
        ))
        .field(value_field(
            "ofType",
            TypeRef::named(TypeRef::STRING),
            "The name of the related type for ID kinds.",
            move |field: &FieldDescriptor| string(&field.of_type),
        ))
        .field(value_field(
            "defaultValue",
            TypeRef::named("JSONString"),
            "The default value of the field as a JSON string.",
            |field: &FieldDescriptor| {
                field
                    .default_value
                    .as_ref()
                    .map_or(Value::Null, |value| Value::String(value.to_string()))
            },
        ))
        .field(value_field(
            "hidden",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            "If the field should not be rendered.",
            |field: &FieldDescriptor| Value::Boolean(field.hidden),
        ))
}

fn int<N: Into<Value>>(value: Option<N>) -> Value {
    value.map_or(Value::Null, Into::into)
}

/// A field computed from the parent value, `null` when the computed value is.
pub(crate) fn value_field<T, F>(name: &str, type_ref: TypeRef, description: &str, resolve: F) -> Field
where
    T: Any + Send + Sync,
    F: Fn(&T) -> Value + Copy + Send + Sync + 'static,
{
    Field::new(name, type_ref, move |ctx| {
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<T>()?;
            let value = resolve(parent);

            Ok((value != Value::Null).then(|| FieldValue::value(value)))
        })
    })
    .description(description)
}
