use std::collections::HashMap;

use indexmap::IndexMap;
use model_store::UploadedFile;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid multipart document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error("cannot place an upload at {0}")]
    InvalidPath(String),
}

/// Files of a multipart request, by the token naming their part.
#[derive(Debug, Clone, Default)]
pub struct Uploads {
    files: HashMap<String, UploadedFile>,
}

impl Uploads {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, token: impl Into<String>, file: UploadedFile) -> Self {
        self.insert(token, file);
        self
    }

    pub fn insert(&mut self, token: impl Into<String>, file: UploadedFile) {
        self.files.insert(token.into(), file);
    }

    pub fn get(&self, token: &str) -> Option<&UploadedFile> {
        self.files.get(token)
    }
}

/// Parses the `operations` and `map` parts of a multipart request, returning the operations
/// document with every mapped path set to the token of its file.
pub fn parse_multipart(operations: &str, map: &str) -> Result<Value, UploadError> {
    let mut operations: Value = serde_json::from_str(operations)?;
    let map: IndexMap<String, Vec<String>> = serde_json::from_str(map)?;

    place_files(&mut operations, &map)?;

    Ok(operations)
}

/// Writes each token of `map` at its dotted paths in `operations`, e.g. `variables.files.0`.
/// Missing containers along a path are created. An array index may address an existing item
/// or append one, never skip ahead.
pub fn place_files(operations: &mut Value, map: &IndexMap<String, Vec<String>>) -> Result<(), UploadError> {
    for (token, paths) in map {
        for path in paths {
            let segments: Vec<&str> = path.split('.').collect();

            set_path(operations, &segments, Value::String(token.clone()))
                .ok_or_else(|| UploadError::InvalidPath(path.clone()))?;
        }
    }

    Ok(())
}

fn set_path(target: &mut Value, segments: &[&str], value: Value) -> Option<()> {
    let Some((segment, rest)) = segments.split_first() else {
        *target = value;
        return Some(());
    };

    if target.is_null() {
        *target = empty_container(segment);
    }

    let slot = match (target, segment.parse::<usize>()) {
        (Value::Array(items), Ok(index)) => {
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)?
        }
        (Value::Object(fields), _) => fields.entry(segment.to_string()).or_insert(Value::Null),
        _ => return None,
    };

    if !rest.is_empty() && slot.is_null() {
        *slot = empty_container(rest[0]);
    }

    set_path(slot, rest, value)
}

fn empty_container(next: &str) -> Value {
    if next.parse::<usize>().is_ok() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Default::default())
    }
}
