use indexmap::IndexMap;
use model_schema::QueryContext;
use model_store::{Entity, UploadedFile};
use serde_json::Value;

use crate::{Settings, Uploads};

/// Everything a mutation needs while it runs.
#[derive(Clone, Copy)]
pub struct MutationContext<'a> {
    pub query: QueryContext<'a>,
    pub uploads: &'a Uploads,
    pub settings: &'a Settings,
}

/// An input value after ids are resolved to entities and uploads to files.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanedValue {
    Null,
    Value(Value),
    Entity(Entity),
    Entities(Vec<Entity>),
    /// `None` when the request has no file for the given token.
    File(Option<UploadedFile>),
}

impl CleanedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CleanedValue::Null | CleanedValue::File(None))
    }
}

/// Cleaned input values by model field name, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedInput {
    values: IndexMap<String, CleanedValue>,
}

impl CleanedInput {
    pub fn get(&self, field: &str) -> Option<&CleanedValue> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: CleanedValue) {
        self.values.insert(field.into(), value);
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &CleanedValue)> + '_ {
        self.values.iter().map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
