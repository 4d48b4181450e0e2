use std::cmp::Ordering;

use model_catalog::ModelWalker;
use model_store::Entity;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("Cannot resolve keyword '{0}' into field.")]
    UnknownField(String),
}

/// Sorts `entities` by the `orderby` keys of a connection, each a field name optionally
/// prefixed with `-` for descending order. The sort is stable and ties keep the primary
/// key order.
pub fn order_entities(model: ModelWalker<'_>, entities: &mut [Entity], orderby: &[String]) -> Result<(), OrderingError> {
    let mut keys = Vec::with_capacity(orderby.len());

    for key in orderby.iter().filter(|key| !key.is_empty()) {
        let (name, descending) = match key.strip_prefix('-') {
            Some(name) => (name, true),
            None => (key.as_str(), false),
        };

        let field = model
            .field(name)
            .filter(|field| field.field_type().is_concrete())
            .ok_or_else(|| OrderingError::UnknownField(name.to_string()))?;

        keys.push((field.name(), field.is_primary_key(), descending));
    }

    entities.sort_by_key(Entity::pk);

    if keys.is_empty() {
        return Ok(());
    }

    entities.sort_by(|left, right| {
        keys.iter()
            .map(|(name, is_pk, descending)| {
                let ordering = if *is_pk {
                    left.pk().cmp(&right.pk())
                } else {
                    compare_values(left.get(name), right.get(name))
                };

                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    Ok(())
}

/// Nulls sort first. Values of different kinds compare by kind.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.unwrap_or(&Value::Null);
    let right = right.unwrap_or(&Value::Null);

    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            let left = left.as_f64().unwrap_or_default();
            let right = right.as_f64().unwrap_or_default();
            left.total_cmp(&right)
        }
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (left, right) => rank(left).cmp(&rank(right)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
