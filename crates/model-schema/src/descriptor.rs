use model_catalog::{FieldType, FieldWalker};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{choices::choice_item_name, FieldKind, SchemaError, TypeNames};

/// Reflected metadata of one field, consumed by clients to render forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field: String,
    pub kind: FieldKind,
    pub of_type: Option<String>,
    pub multiple: bool,
    pub choices: Option<Vec<ChoiceDescriptor>>,
    pub verbose_name: Option<String>,
    pub help_text: Option<String>,
    #[serde(flatten)]
    pub validation: Validation,
    pub default_value: Option<Value>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDescriptor {
    pub label: String,
    /// The enum item name.
    pub name: String,
    /// The value as a JSON literal.
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub required: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub max_digits: Option<u32>,
    pub decimal_places: Option<u32>,
}

struct KindInfo {
    kind: FieldKind,
    multiple: bool,
    max_digits: Option<u32>,
    decimal_places: Option<u32>,
}

impl KindInfo {
    fn single(kind: FieldKind) -> Self {
        Self {
            kind,
            multiple: false,
            max_digits: None,
            decimal_places: None,
        }
    }
}

fn kind_of(name: &str, field_type: &FieldType) -> Result<KindInfo, SchemaError> {
    let kind = match field_type {
        FieldType::Char => FieldKind::String,
        FieldType::Text => FieldKind::Text,
        FieldType::Email => FieldKind::Email,
        FieldType::Slug => FieldKind::Slug,
        FieldType::Uuid => FieldKind::Uuid,
        FieldType::Url => FieldKind::Url,
        FieldType::IpAddress => FieldKind::Ip,
        FieldType::File | FieldType::Image | FieldType::FilePath => FieldKind::File,
        FieldType::Auto
        | FieldType::BigAuto
        | FieldType::Integer
        | FieldType::SmallInteger
        | FieldType::BigInteger
        | FieldType::PositiveInteger
        | FieldType::PositiveSmallInteger => FieldKind::Integer,
        FieldType::Decimal {
            max_digits,
            decimal_places,
        } => {
            return Ok(KindInfo {
                max_digits: Some(*max_digits),
                decimal_places: Some(*decimal_places),
                ..KindInfo::single(FieldKind::Decimal)
            })
        }
        FieldType::Duration => FieldKind::Decimal,
        FieldType::Float => FieldKind::Float,
        FieldType::Boolean | FieldType::NullBoolean => FieldKind::Boolean,
        FieldType::Date => FieldKind::Date,
        FieldType::DateTime => FieldKind::Datetime,
        FieldType::Time => FieldKind::Time,
        FieldType::ForeignKey { .. } | FieldType::OneToOne { .. } | FieldType::OneToOneRel { .. } => FieldKind::Id,
        FieldType::ManyToMany { .. } | FieldType::ManyToManyRel { .. } | FieldType::ManyToOneRel { .. } => {
            return Ok(KindInfo {
                multiple: true,
                ..KindInfo::single(FieldKind::Id)
            })
        }
        FieldType::Array { base } | FieldType::Range { base } => {
            return Ok(KindInfo {
                multiple: true,
                ..kind_of(name, base)?
            })
        }
        FieldType::Json | FieldType::HStore => FieldKind::Json,
        FieldType::Custom { .. } => {
            return Err(SchemaError::UnsupportedField {
                field: name.to_string(),
                type_name: field_type.type_name().to_string(),
            })
        }
    };

    Ok(KindInfo::single(kind))
}

/// Whether a client must provide a value for the field.
///
/// Reverse relations are required when not nullable, other fields when they are not
/// nullable and have no default. Auto fields are assigned by the datastore.
pub fn is_required(field: FieldWalker<'_>) -> bool {
    let definition = field.definition();

    if field.field_type().is_reverse() {
        return !definition.null;
    }

    !field.field_type().is_auto() && !definition.null && !definition.has_default()
}

/// Builds the descriptor of a field. Related models resolve to their registered type
/// name, if any.
pub fn describe_field(field: FieldWalker<'_>, type_names: &TypeNames) -> Result<FieldDescriptor, SchemaError> {
    let definition = field.definition();
    let field_type = field.field_type();
    let info = kind_of(field.name(), field_type)?;

    let of_type = field
        .related_model()
        .and_then(|model| type_names.get(model.name()))
        .map(str::to_string);

    let choices = (!definition.choices.is_empty()).then(|| {
        definition
            .choices
            .iter()
            .map(|choice| ChoiceDescriptor {
                label: choice.label.clone(),
                name: choice_item_name(&choice.value),
                value: choice.value.to_string(),
            })
            .collect()
    });

    let (verbose_name, help_text) = if field_type.is_reverse() {
        (None, None)
    } else {
        (Some(definition.verbose_name.clone()), Some(definition.help_text.clone()))
    };

    let validation = Validation {
        required: is_required(field),
        min_length: definition.min_length,
        max_length: definition.max_length,
        min_value: definition.min_value,
        max_value: definition.max_value,
        max_digits: info.max_digits,
        decimal_places: info.decimal_places,
    };

    Ok(FieldDescriptor {
        field: field.name().to_string(),
        kind: info.kind,
        of_type,
        multiple: info.multiple,
        choices,
        verbose_name,
        help_text,
        validation,
        default_value: definition.default.clone(),
        hidden: !definition.editable && !field_type.is_reverse(),
    })
}

/// Merges `overrides` into `target`: objects merge key by key, anything else replaces.
pub fn merge_nested(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match target.get_mut(key) {
                    Some(existing) => merge_nested(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overrides) => *target = overrides.clone(),
    }
}

impl FieldDescriptor {
    /// Applies a partial override given in the descriptor's wire format.
    pub fn merged(&self, overrides: &Value) -> Result<Self, SchemaError> {
        let invalid = |error: serde_json::Error| SchemaError::InvalidOverride {
            name: self.field.clone(),
            message: error.to_string(),
        };

        let mut value = serde_json::to_value(self).map_err(invalid)?;
        merge_nested(&mut value, overrides);

        serde_json::from_value(value).map_err(invalid)
    }
}
