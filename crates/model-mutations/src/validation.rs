//! Field validation of entities before they are saved.
//!
//! Each concrete field is first coerced to its storage representation, then checked
//! against its choices, nullability and blankness, and finally against its length, value
//! and digit constraints. Coerced values are written back into the entity.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use model_catalog::{FieldDefinition, FieldType, FieldWalker, ModelWalker};
use model_store::{Datastore, Entity};
use serde_json::{Number, Value};

use crate::{MutationError, ValidationError};

/// Validates every concrete field of `entity` not in `exclude`, then the uniqueness
/// constraints of the fields that passed.
pub fn full_clean(
    store: &dyn Datastore,
    model: ModelWalker<'_>,
    entity: &mut Entity,
    exclude: &[String],
) -> Result<(), MutationError> {
    let mut errors = ValidationError::default();

    for field in model.concrete_fields() {
        let name = field.name();

        if field.is_primary_key() || field.field_type().is_auto() || exclude.iter().any(|f| f == name) {
            continue;
        }

        let raw = entity.get(name).cloned().unwrap_or(Value::Null);

        if field.definition().blank && is_empty_value(&raw) {
            continue;
        }

        match clean_field(field, raw) {
            Ok(value) => entity.set(name, value),
            Err(messages) => {
                for message in messages {
                    errors.push(Some(name), message);
                }
            }
        }
    }

    for field in model.concrete_fields() {
        let name = field.name();

        if !field.definition().unique
            || field.is_primary_key()
            || exclude.iter().any(|f| f == name)
            || errors.has_field(name)
        {
            continue;
        }

        let Some(value) = entity.get(name).filter(|value| !value.is_null()) else {
            continue;
        };

        if store.exists_with(model.name(), name, value, entity.pk())? {
            errors.push(
                Some(name),
                format!(
                    "{} with this {} already exists.",
                    capfirst(model.verbose_name()),
                    capfirst(&field.definition().verbose_name)
                ),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

/// Coerces and validates a single value, returning the value to store.
pub fn clean_field(field: FieldWalker<'_>, raw: Value) -> Result<Value, Vec<String>> {
    let definition = field.definition();
    let value = coerce(field.field_type(), raw).map_err(|message| vec![message])?;

    validate(definition, &value).map_err(|message| vec![message])?;

    if is_empty_value(&value) {
        return Ok(value);
    }

    let messages = run_validators(definition, &value);

    if messages.is_empty() {
        Ok(value)
    } else {
        Err(messages)
    }
}

/// Values a blank field may hold.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn capfirst(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        Value::Bool(true) => String::from("True"),
        Value::Bool(false) => String::from("False"),
        Value::Null => String::from("None"),
        other => other.to_string(),
    }
}

fn coerce(field_type: &FieldType, value: Value) -> Result<Value, String> {
    if value.is_null() {
        return Ok(value);
    }

    match field_type {
        FieldType::Char
        | FieldType::Text
        | FieldType::Email
        | FieldType::Slug
        | FieldType::Url
        | FieldType::IpAddress
        | FieldType::FilePath
        | FieldType::File
        | FieldType::Image => Ok(match value {
            Value::String(_) => value,
            other => Value::String(display(&other)),
        }),
        FieldType::Integer
        | FieldType::SmallInteger
        | FieldType::BigInteger
        | FieldType::PositiveInteger
        | FieldType::PositiveSmallInteger
        | FieldType::ForeignKey { .. }
        | FieldType::OneToOne { .. } => to_integer(&value)
            .map(Value::from)
            .ok_or_else(|| format!("“{}” value must be an integer.", display(&value))),
        FieldType::Float => to_float(&value)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("“{}” value must be a float.", display(&value))),
        FieldType::Decimal { .. } => {
            let text = display(&value);
            if parse_decimal(&text).is_some() {
                Ok(Value::String(text))
            } else {
                Err(format!("“{text}” value must be a decimal number."))
            }
        }
        FieldType::Duration => to_float(&value).map(|_| value.clone()).ok_or_else(|| {
            format!(
                "“{}” value has an invalid format. It must be in [DD] [[HH:]MM:]ss[.uuuuuu] format.",
                display(&value)
            )
        }),
        FieldType::Boolean => {
            to_bool(&value).ok_or_else(|| format!("“{}” value must be either True or False.", display(&value)))
        }
        FieldType::NullBoolean => to_bool(&value)
            .ok_or_else(|| format!("“{}” value must be either True, False, or None.", display(&value))),
        FieldType::Date => {
            let text = display(&value);
            parse_date(&text)
                .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| format!("“{text}” value has an invalid date format. It must be in YYYY-MM-DD format."))
        }
        FieldType::DateTime => {
            let text = display(&value);
            parse_datetime(&text).ok_or_else(|| {
                format!("“{text}” value has an invalid format. It must be in YYYY-MM-DD HH:MM[:ss[.uuuuuu]][TZ] format.")
            })
        }
        FieldType::Time => {
            let text = display(&value);
            parse_time(&text)
                .map(|time| Value::String(time.to_string()))
                .ok_or_else(|| format!("“{text}” value has an invalid format. It must be in HH:MM[:ss[.uuuuuu]] format."))
        }
        FieldType::Uuid => {
            let text = display(&value);
            uuid::Uuid::parse_str(&text)
                .map(|uuid| Value::String(uuid.hyphenated().to_string()))
                .map_err(|_| format!("“{text}” is not a valid UUID."))
        }
        FieldType::Auto
        | FieldType::BigAuto
        | FieldType::ManyToMany { .. }
        | FieldType::ManyToOneRel { .. }
        | FieldType::ManyToManyRel { .. }
        | FieldType::OneToOneRel { .. }
        | FieldType::Array { .. }
        | FieldType::Range { .. }
        | FieldType::Json
        | FieldType::HStore
        | FieldType::Custom { .. } => Ok(value),
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| is_integral(*f)).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Whether `f` is a whole number within the range of `i64`.
fn is_integral(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Some(Value::Bool(true)),
            Some(0) => Some(Value::Bool(false)),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "t" | "True" | "true" | "1" => Some(Value::Bool(true)),
            "f" | "False" | "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_datetime(text: &str) -> Option<Value> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::String(datetime.to_rfc3339()));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))
        .map(|datetime| Value::String(datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Digits in total and after the decimal point of a decimal literal.
fn parse_decimal(text: &str) -> Option<(usize, usize)> {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    if (whole.is_empty() && fraction.is_empty())
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let significant = format!("{whole}{fraction}");
    let significant = significant.trim_start_matches('0');

    Some((significant.len().max(fraction.len()), fraction.len()))
}

fn validate(definition: &FieldDefinition, value: &Value) -> Result<(), String> {
    if !definition.choices.is_empty()
        && !is_empty_value(value)
        && !definition.choices.iter().any(|choice| &choice.value == value)
    {
        return Err(format!("Value {} is not a valid choice.", repr(value)));
    }

    if value.is_null() && !definition.null {
        return Err(String::from("This field cannot be null."));
    }

    if !definition.blank && is_empty_value(value) {
        return Err(String::from("This field cannot be blank."));
    }

    Ok(())
}

fn run_validators(definition: &FieldDefinition, value: &Value) -> Vec<String> {
    let mut messages = Vec::new();

    if let Value::String(text) = value {
        let length = text.chars().count() as u64;

        if let Some(max) = definition.max_length.filter(|max| length > *max) {
            messages.push(format!(
                "Ensure this value has at most {max} characters (it has {length})."
            ));
        }

        if let Some(min) = definition.min_length.filter(|min| length < *min) {
            messages.push(format!(
                "Ensure this value has at least {min} characters (it has {length})."
            ));
        }

        match &definition.field_type {
            FieldType::Email if !is_email(text) => messages.push(String::from("Enter a valid email address.")),
            FieldType::Slug if !is_slug(text) => messages.push(String::from(
                "Enter a valid “slug” consisting of letters, numbers, underscores or hyphens.",
            )),
            FieldType::Url if !is_url(text) => messages.push(String::from("Enter a valid URL.")),
            FieldType::IpAddress if text.parse::<std::net::IpAddr>().is_err() => {
                messages.push(String::from("Enter a valid IPv4 or IPv6 address."))
            }
            _ => {}
        }
    }

    let number = match (&definition.field_type, value) {
        (FieldType::Decimal { .. }, Value::String(text)) => text.parse::<f64>().ok(),
        (_, Value::Number(number)) => number.as_f64(),
        _ => None,
    };

    if let Some(number) = number {
        let min_value = match definition.field_type {
            FieldType::PositiveInteger | FieldType::PositiveSmallInteger => {
                Some(definition.min_value.unwrap_or(0).max(0))
            }
            _ => definition.min_value,
        };

        if let Some(max) = definition.max_value.filter(|max| number > *max as f64) {
            messages.push(format!("Ensure this value is less than or equal to {max}."));
        }

        if let Some(min) = min_value.filter(|min| number < *min as f64) {
            messages.push(format!("Ensure this value is greater than or equal to {min}."));
        }
    }

    if let (
        FieldType::Decimal {
            max_digits,
            decimal_places,
        },
        Value::String(text),
    ) = (&definition.field_type, value)
    {
        if let Some(message) = parse_decimal(text).and_then(|(digits, decimals)| {
            decimal_message(digits, decimals, *max_digits as usize, *decimal_places as usize)
        }) {
            messages.push(message);
        }
    }

    messages
}

fn decimal_message(digits: usize, decimals: usize, max_digits: usize, decimal_places: usize) -> Option<String> {
    let whole_digits = digits - decimals;

    if digits > max_digits {
        Some(format!("Ensure that there are no more than {max_digits} digits in total."))
    } else if decimals > decimal_places {
        Some(format!("Ensure that there are no more than {decimal_places} decimal places."))
    } else if whole_digits > max_digits.saturating_sub(decimal_places) {
        Some(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_digits.saturating_sub(decimal_places)
        ))
    } else {
        None
    }
}

fn is_email(text: &str) -> bool {
    let Some((user, domain)) = text.rsplit_once('@') else {
        return false;
    };

    !user.is_empty()
        && !user.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-')
}

fn is_slug(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_url(text: &str) -> bool {
    ["http://", "https://", "ftp://", "ftps://"]
        .iter()
        .find_map(|scheme| text.strip_prefix(scheme))
        .and_then(|rest| rest.split(['/', '?', '#']).next())
        .is_some_and(|host| !host.is_empty() && !host.chars().any(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use model_catalog::{Catalog, ModelDefinition};
    use model_store::MemoryStore;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::builder()
                .model(
                    ModelDefinition::new("tests", "Issue")
                        .field(FieldDefinition::char("name", 10).unique())
                        .field(
                            FieldDefinition::char("kind", 1)
                                .choices([("b", "Bug"), ("f", "Feature")])
                                .default("b"),
                        )
                        .field(FieldDefinition::new("priority", FieldType::PositiveInteger).default(0).max_value(5))
                        .field(FieldDefinition::new("estimate", FieldType::Float).optional())
                        .field(
                            FieldDefinition::new(
                                "cost",
                                FieldType::Decimal {
                                    max_digits: 5,
                                    decimal_places: 2,
                                },
                            )
                            .optional(),
                        )
                        .field(FieldDefinition::new("due_date", FieldType::Date).optional())
                        .field(FieldDefinition::new("done_at", FieldType::DateTime).optional())
                        .field(FieldDefinition::new("reference", FieldType::Uuid).optional())
                        .field(FieldDefinition::new("reporter", FieldType::Email).blank())
                        .field(FieldDefinition::new("resolved", FieldType::Boolean).default(false)),
                )
                .build()
                .unwrap(),
        )
    }

    fn clean(field: &str, value: Value) -> Result<Value, Vec<String>> {
        let catalog = catalog();
        let field = catalog.find_model("Issue").unwrap().field(field).unwrap();

        clean_field(field, value)
    }

    #[rstest]
    #[case::integer_text("priority", json!("3"), json!(3))]
    #[case::float_text("estimate", json!("1.5"), json!(1.5))]
    #[case::decimal_number("cost", json!(12.5), json!("12.5"))]
    #[case::date("due_date", json!("2050-01-01"), json!("2050-01-01"))]
    #[case::naive_datetime("done_at", json!("2050-01-01 10:30"), json!("2050-01-01T10:30:00"))]
    #[case::uuid("reference", json!("A0EEBC99-9C0B-4EF8-BB6D-6BB9BD380A11"), json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"))]
    #[case::boolean_text("resolved", json!("true"), json!(true))]
    fn values_are_coerced(#[case] field: &str, #[case] raw: Value, #[case] expected: Value) {
        assert_eq!(clean(field, raw).unwrap(), expected);
    }

    #[rstest]
    #[case::integer("priority", json!("high"), "“high” value must be an integer.")]
    #[case::integer_out_of_range("priority", json!(10_000_000_000_000_000_000_u64), "“10000000000000000000” value must be an integer.")]
    #[case::float_out_of_range("priority", json!(1e30), "“1e30” value must be an integer.")]
    #[case::float("estimate", json!("fast"), "“fast” value must be a float.")]
    #[case::decimal("cost", json!("1,5"), "“1,5” value must be a decimal number.")]
    #[case::date("due_date", json!("01/01/2050"), "“01/01/2050” value has an invalid date format. It must be in YYYY-MM-DD format.")]
    #[case::uuid("reference", json!("nope"), "“nope” is not a valid UUID.")]
    #[case::boolean("resolved", json!("maybe"), "“maybe” value must be either True or False.")]
    #[case::choice("kind", json!("x"), "Value 'x' is not a valid choice.")]
    #[case::null("name", Value::Null, "This field cannot be null.")]
    #[case::blank("name", json!(""), "This field cannot be blank.")]
    #[case::max_length("name", json!("Issue number one"), "Ensure this value has at most 10 characters (it has 16).")]
    #[case::max_value("priority", json!(6), "Ensure this value is less than or equal to 5.")]
    #[case::positive("priority", json!(-1), "Ensure this value is greater than or equal to 0.")]
    #[case::max_digits("cost", json!("12345.6"), "Ensure that there are no more than 5 digits in total.")]
    #[case::decimal_places("cost", json!("1.234"), "Ensure that there are no more than 2 decimal places.")]
    #[case::email("reporter", json!("foo@bar"), "Enter a valid email address.")]
    fn invalid_values(#[case] field: &str, #[case] raw: Value, #[case] message: &str) {
        assert_eq!(clean(field, raw).unwrap_err(), [message]);
    }

    #[test]
    fn decimal_digits() {
        assert_eq!(parse_decimal("12.30"), Some((4, 2)));
        assert_eq!(parse_decimal("0.05"), Some((2, 2)));
        assert_eq!(parse_decimal("-100"), Some((3, 0)));
        assert_eq!(parse_decimal("."), None);
    }

    #[test]
    fn full_clean_collects_errors_and_checks_uniqueness() {
        let catalog = catalog();
        let model = catalog.find_model("Issue").unwrap();
        let store = MemoryStore::new(catalog.clone());

        let mut first = Entity::new(model);
        first.set("name", "Issue 1");
        full_clean(&store, model, &mut first, &[]).unwrap();
        store.save(&mut first).unwrap();

        let mut second = Entity::new(model);
        second.set("name", "Issue 1");
        second.set("priority", "high");
        second.set("reporter", "");

        let error = full_clean(&store, model, &mut second, &[]).unwrap_err();
        insta::assert_snapshot!(error, @"priority: “high” value must be an integer.; name: Issue with this Name already exists.");

        second.set("priority", "2");
        let error = full_clean(&store, model, &mut second, &[String::from("name")]);
        assert!(error.is_ok());
        assert_eq!(second.get("priority"), Some(&json!(2)));

        first.set("priority", 1);
        full_clean(&store, model, &mut first, &[]).unwrap();
    }
}
