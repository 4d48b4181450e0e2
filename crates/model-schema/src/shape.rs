use model_catalog::{FieldType, FieldWalker};

use crate::{choices::ChoiceEnum, SchemaError, TypeNames};

/// Built-in and custom scalars of the generated schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::IntoStaticStr)]
pub enum ScalarType {
    #[strum(serialize = "ID")]
    Id,
    String,
    Int,
    Float,
    Boolean,
    Decimal,
    Date,
    DateTime,
    Time,
    #[strum(serialize = "UUID")]
    Uuid,
    #[strum(serialize = "JSONString")]
    JsonString,
    Upload,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Scalars not built into GraphQL, which the schema has to declare.
    pub fn is_custom(self) -> bool {
        !matches!(
            self,
            ScalarType::Id | ScalarType::String | ScalarType::Int | ScalarType::Float | ScalarType::Boolean
        )
    }
}

/// The GraphQL shape of a field, before nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Scalar(ScalarType),
    Enum(String),
    /// A single related entity, by object type name.
    Object(String),
    /// A set of related entities exposed as a countable connection.
    Connection(String),
    List(Box<TypeShape>),
}

impl TypeShape {
    pub fn id_list() -> Self {
        TypeShape::List(Box::new(TypeShape::Scalar(ScalarType::Id)))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, TypeShape::Scalar(ScalarType::Id))
    }

    pub fn is_id_list(&self) -> bool {
        matches!(self, TypeShape::List(inner) if inner.is_id())
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, TypeShape::Scalar(ScalarType::Upload))
    }

    /// Every scalar referenced by the shape.
    pub fn scalars(&self) -> Vec<ScalarType> {
        match self {
            TypeShape::Scalar(scalar) => vec![*scalar],
            TypeShape::List(inner) => inner.scalars(),
            TypeShape::Enum(_) | TypeShape::Object(_) | TypeShape::Connection(_) => Vec::new(),
        }
    }
}

/// Scalar conversion shared by inputs and outputs, with choice fields becoming enums.
fn scalar_shape(field: FieldWalker<'_>, field_type: &FieldType) -> Result<TypeShape, SchemaError> {
    if let Some(choices) = ChoiceEnum::for_field(field) {
        return Ok(TypeShape::Enum(choices.name));
    }

    let scalar = match field_type {
        FieldType::Char
        | FieldType::Text
        | FieldType::Email
        | FieldType::Slug
        | FieldType::Url
        | FieldType::IpAddress
        | FieldType::FilePath
        | FieldType::File
        | FieldType::Image => ScalarType::String,
        FieldType::Uuid => ScalarType::Uuid,
        FieldType::Auto | FieldType::BigAuto => ScalarType::Id,
        FieldType::Integer
        | FieldType::SmallInteger
        | FieldType::BigInteger
        | FieldType::PositiveInteger
        | FieldType::PositiveSmallInteger => ScalarType::Int,
        FieldType::Decimal { .. } => ScalarType::Decimal,
        FieldType::Float | FieldType::Duration => ScalarType::Float,
        FieldType::Boolean | FieldType::NullBoolean => ScalarType::Boolean,
        FieldType::Date => ScalarType::Date,
        FieldType::DateTime => ScalarType::DateTime,
        FieldType::Time => ScalarType::Time,
        FieldType::Json | FieldType::HStore => ScalarType::JsonString,
        FieldType::ForeignKey { .. }
        | FieldType::OneToOne { .. }
        | FieldType::OneToOneRel { .. }
        | FieldType::ManyToMany { .. }
        | FieldType::ManyToManyRel { .. }
        | FieldType::ManyToOneRel { .. } => ScalarType::Id,
        FieldType::Array { base } | FieldType::Range { base } => {
            return Ok(TypeShape::List(Box::new(scalar_shape(field, base)?)))
        }
        FieldType::Custom { .. } => {
            return Err(SchemaError::UnsupportedField {
                field: field.name().to_string(),
                type_name: field_type.type_name().to_string(),
            })
        }
    };

    Ok(TypeShape::Scalar(scalar))
}

/// The mutation input shape of a field: relations are ids, files are uploads.
pub fn input_shape(field: FieldWalker<'_>) -> Result<TypeShape, SchemaError> {
    let field_type = field.field_type();

    if field.is_primary_key() || field_type.is_single_relation() {
        return Ok(TypeShape::Scalar(ScalarType::Id));
    }

    if field_type.is_file() {
        return Ok(TypeShape::Scalar(ScalarType::Upload));
    }

    if field_type.is_boolean() {
        return Ok(TypeShape::Scalar(ScalarType::Boolean));
    }

    if field_type.is_multiple_relation() {
        return Ok(TypeShape::id_list());
    }

    scalar_shape(field, field_type)
}

/// The output shape of a field of an object type. Relations to models without a
/// registered type are not exposed.
pub fn output_shape(field: FieldWalker<'_>, type_names: &TypeNames) -> Result<Option<TypeShape>, SchemaError> {
    let field_type = field.field_type();

    if field.is_primary_key() {
        return Ok(Some(TypeShape::Scalar(ScalarType::Id)));
    }

    let related_type = || {
        field
            .related_model()
            .and_then(|model| type_names.get(model.name()))
            .map(str::to_string)
    };

    if field_type.is_single_relation() || matches!(field_type, FieldType::OneToOneRel { .. }) {
        return Ok(related_type().map(TypeShape::Object));
    }

    if field_type.is_multiple_relation() {
        return Ok(related_type().map(TypeShape::Connection));
    }

    scalar_shape(field, field_type).map(Some)
}
