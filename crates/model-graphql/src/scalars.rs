use async_graphql::{
    dynamic::{Enum, EnumItem, Scalar},
    Name, Value,
};
use model_schema::{ChoiceEnum, ScalarType, TypeShape};

const CUSTOM_SCALARS: [(ScalarType, &str); 7] = [
    (ScalarType::Decimal, "A decimal number, serialized as a string."),
    (ScalarType::Date, "A date in ISO 8601 format, e.g. 2050-01-01."),
    (ScalarType::DateTime, "A date and time in ISO 8601 format."),
    (ScalarType::Time, "A time of day in ISO 8601 format."),
    (ScalarType::Uuid, "A UUID in its hyphenated form."),
    (ScalarType::JsonString, "A JSON value, serialized as a string."),
    (
        ScalarType::Upload,
        "The upload of a file.\n\nVariables of this type are replaced by the token of a file part of a multipart request.",
    ),
];

pub(crate) fn custom_scalars() -> impl Iterator<Item = Scalar> {
    CUSTOM_SCALARS
        .into_iter()
        .map(|(scalar, description)| Scalar::new(scalar.name()).description(description))
}

pub(crate) fn choice_enum(choices: &ChoiceEnum) -> Enum {
    choices.items.iter().fold(Enum::new(&choices.name), |graphql_enum, item| {
        graphql_enum.item(EnumItem::new(&item.name).description(&item.label))
    })
}

/// Converts a stored field value into its GraphQL value. Choice values become enum items,
/// JSON values are serialized into strings.
pub(crate) fn output_value(shape: &TypeShape, choices: Option<&ChoiceEnum>, value: &serde_json::Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match shape {
        TypeShape::Enum(_) => choices
            .and_then(|choices| choices.item_for(value))
            .map(|item| Value::Enum(Name::new(&item.name)))
            .unwrap_or(Value::Null),
        TypeShape::Scalar(ScalarType::JsonString) => Value::String(value.to_string()),
        TypeShape::List(inner) => match value {
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(|item| output_value(inner, choices, item))
                    .collect(),
            ),
            other => output_value(inner, choices, other),
        },
        TypeShape::Scalar(_) | TypeShape::Object(_) | TypeShape::Connection(_) => {
            Value::from_json(value.clone()).unwrap_or(Value::Null)
        }
    }
}

/// Converts a GraphQL input value into the raw JSON input of a mutation. JSON strings are
/// parsed, enum items stay item names.
pub(crate) fn input_value(shape: &TypeShape, value: Value) -> serde_json::Value {
    match (shape, value) {
        (TypeShape::Scalar(ScalarType::JsonString), Value::String(raw)) => {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        }
        (TypeShape::List(inner), Value::List(items)) => {
            serde_json::Value::Array(items.into_iter().map(|item| input_value(inner, item)).collect())
        }
        (_, value) => value.into_json().unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use model_schema::ChoiceItem;
    use serde_json::json;

    use super::*;

    fn kinds() -> ChoiceEnum {
        ChoiceEnum {
            name: String::from("IssueKind"),
            items: vec![
                ChoiceItem {
                    name: String::from("B"),
                    value: json!("b"),
                    label: String::from("Bug"),
                },
                ChoiceItem {
                    name: String::from("F"),
                    value: json!("f"),
                    label: String::from("Feature"),
                },
            ],
        }
    }

    #[test]
    fn choices_become_enum_items() {
        let shape = TypeShape::Enum(String::from("IssueKind"));

        assert_eq!(
            output_value(&shape, Some(&kinds()), &json!("f")),
            Value::Enum(Name::new("F"))
        );
        assert_eq!(output_value(&shape, Some(&kinds()), &json!("x")), Value::Null);

        let list = TypeShape::List(Box::new(shape));
        assert_eq!(
            output_value(&list, Some(&kinds()), &json!(["b", "f"])),
            Value::List(vec![Value::Enum(Name::new("B")), Value::Enum(Name::new("F"))])
        );
    }

    #[test]
    fn json_strings_round_trip() {
        let shape = TypeShape::Scalar(ScalarType::JsonString);

        assert_eq!(
            output_value(&shape, None, &json!({ "a": [1, 2] })),
            Value::String(String::from(r#"{"a":[1,2]}"#))
        );
        assert_eq!(
            input_value(&shape, Value::String(String::from(r#"{"a":[1,2]}"#))),
            json!({ "a": [1, 2] })
        );
        assert_eq!(input_value(&shape, Value::String(String::from("{oops"))), json!("{oops"));
    }

    #[test]
    fn enum_inputs_stay_item_names() {
        let shape = TypeShape::Enum(String::from("IssueKind"));

        assert_eq!(input_value(&shape, Value::Enum(Name::new("F"))), json!("F"));
    }
}
