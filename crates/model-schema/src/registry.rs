use std::collections::BTreeMap;

use crate::{FieldDescriptor, SchemaError};

/// Reflected field descriptors keyed by object or input type name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: BTreeMap<String, Vec<FieldDescriptor>>,
}

impl SchemaRegistry {
    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<(), SchemaError> {
        let name = name.into();

        if self.entries.contains_key(&name) {
            return Err(SchemaError::DuplicateType(name));
        }

        self.entries.insert(name, fields);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[FieldDescriptor]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &[FieldDescriptor])> + '_ {
        self.entries
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
