use std::fmt;

use bytes::Bytes;
use indexmap::IndexMap;
use model_catalog::{FieldWalker, ModelWalker};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary key of a persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(EntityId)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        EntityId(value)
    }
}

impl EntityId {
    /// Reads a relation value as stored in an entity row.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_u64().map(EntityId),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Value::from(value.0)
    }
}

/// The payload of a file part of a multipart request.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            content: content.into(),
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A value written to a single field of an entity by a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Null,
    Value(Value),
    File(UploadedFile),
    /// Removes the file stored in a file field.
    ClearFile,
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            value => FormValue::Value(value),
        }
    }
}

/// A row of a model. Relations to a single entity are stored as the related primary key,
/// many-to-many and reverse relations live in the datastore.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    model: String,
    pk: Option<EntityId>,
    values: IndexMap<String, Value>,
    pending_uploads: IndexMap<String, UploadedFile>,
}

impl Entity {
    /// A new, unsaved entity with every concrete field set to its default.
    pub fn new(model: ModelWalker<'_>) -> Self {
        let values = model
            .concrete_fields()
            .filter(|field| !field.is_primary_key())
            .map(|field| (field.name().to_string(), field.definition().get_default()))
            .collect();

        Self {
            model: model.name().to_string(),
            pk: None,
            values,
            pending_uploads: IndexMap::new(),
        }
    }

    /// An entity as read back from a datastore.
    pub fn from_row(model: impl Into<String>, pk: EntityId, values: IndexMap<String, Value>) -> Self {
        Self {
            model: model.into(),
            pk: Some(pk),
            values,
            pending_uploads: IndexMap::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn pk(&self) -> Option<EntityId> {
        self.pk
    }

    pub fn set_pk(&mut self, pk: Option<EntityId>) {
        self.pk = pk;
    }

    pub fn is_saved(&self) -> bool {
        self.pk.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// The primary key stored in a foreign key or one-to-one field.
    pub fn related_pk(&self, field: &str) -> Option<EntityId> {
        self.values.get(field).and_then(EntityId::from_value)
    }

    pub fn pending_uploads(&self) -> &IndexMap<String, UploadedFile> {
        &self.pending_uploads
    }

    pub fn take_pending_uploads(&mut self) -> IndexMap<String, UploadedFile> {
        std::mem::take(&mut self.pending_uploads)
    }

    /// Writes a cleaned value into a concrete field.
    ///
    /// File fields ignore [`FormValue::Null`] and are emptied by [`FormValue::ClearFile`];
    /// uploads are kept aside until the entity is saved.
    pub fn save_form_data(&mut self, field: FieldWalker<'_>, value: FormValue) {
        let name = field.name().to_string();

        if field.field_type().is_file() {
            match value {
                FormValue::Null => {}
                FormValue::ClearFile => {
                    self.pending_uploads.shift_remove(&name);
                    self.values.insert(name, Value::String(String::new()));
                }
                FormValue::File(file) => {
                    self.values.insert(name.clone(), Value::String(file.filename.clone()));
                    self.pending_uploads.insert(name, file);
                }
                FormValue::Value(value) => {
                    self.values.insert(name, value);
                }
            }

            return;
        }

        let value = match value {
            FormValue::Null | FormValue::ClearFile => Value::Null,
            FormValue::Value(value) => value,
            FormValue::File(file) => Value::String(file.filename),
        };

        self.values.insert(name, value);
    }
}
