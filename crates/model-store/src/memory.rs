use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread::{self, ThreadId},
};

use indexmap::IndexMap;
use model_catalog::{Catalog, FieldType, FieldWalker, ModelWalker, OnDelete};
use serde_json::Value;

use crate::{Datastore, Entity, EntityId, StoreError, UploadedFile};

type Row = IndexMap<String, Value>;

/// An in-memory datastore. Transactions nest: every `begin` takes a snapshot that
/// `rollback` restores.
///
/// A transaction belongs to the thread that began it. Until its outermost transaction
/// ends, other threads wait before beginning their own or writing.
pub struct MemoryStore {
    catalog: Arc<Catalog>,
    state: Mutex<State>,
    released: Condvar,
}

#[derive(Default)]
struct State {
    data: Data,
    savepoints: Vec<Data>,
    owner: Option<ThreadId>,
}

impl State {
    fn owned_by_other(&self) -> bool {
        self.owner.is_some_and(|owner| owner != thread::current().id())
    }
}

#[derive(Debug, Clone, Default)]
struct Data {
    tables: HashMap<String, BTreeMap<EntityId, Row>>,
    // (model, many-to-many field) -> (source pk, target pk)
    links: HashMap<(String, String), BTreeSet<(EntityId, EntityId)>>,
    sequences: HashMap<String, u64>,
    files: BTreeMap<String, UploadedFile>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: Mutex::new(State::default()),
            released: Condvar::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Stored upload payloads, keyed by `<model>/<pk>/<field>`.
    pub fn file(&self, model: &str, pk: EntityId, field: &str) -> Result<Option<UploadedFile>, StoreError> {
        let state = self.lock()?;
        Ok(state.data.files.get(&file_key(model, pk, field)).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Locks the state once no other thread has a transaction open.
    fn lock_for_write(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.released
            .wait_while(self.lock()?, |state| state.owned_by_other())
            .map_err(|_| StoreError::Poisoned)
    }

    /// Locks the state of the transaction open on this thread.
    fn lock_transaction(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let state = self.lock()?;

        if state.owner != Some(thread::current().id()) {
            return Err(StoreError::NoTransaction);
        }

        Ok(state)
    }

    fn end_transaction(&self, state: &mut State) {
        if state.savepoints.is_empty() {
            state.owner = None;
            self.released.notify_all();
        }
    }

    fn model(&self, name: &str) -> Result<ModelWalker<'_>, StoreError> {
        self.catalog
            .find_model(name)
            .ok_or_else(|| StoreError::UnknownModel(name.to_string()))
    }

    fn field<'a>(&self, model: ModelWalker<'a>, name: &str) -> Result<FieldWalker<'a>, StoreError> {
        model.field(name).ok_or_else(|| StoreError::UnknownField {
            model: model.name().to_string(),
            field: name.to_string(),
        })
    }
}

impl Datastore for MemoryStore {
    fn get(&self, model: &str, pk: EntityId) -> Result<Option<Entity>, StoreError> {
        self.model(model)?;
        let state = self.lock()?;

        Ok(state
            .data
            .tables
            .get(model)
            .and_then(|table| table.get(&pk))
            .map(|row| Entity::from_row(model, pk, row.clone())))
    }

    fn get_many(&self, model: &str, pks: &[EntityId]) -> Result<Vec<Entity>, StoreError> {
        self.model(model)?;
        let state = self.lock()?;
        let wanted: BTreeSet<_> = pks.iter().copied().collect();

        Ok(state
            .data
            .tables
            .get(model)
            .into_iter()
            .flat_map(|table| table.iter())
            .filter(|(pk, _)| wanted.contains(pk))
            .map(|(pk, row)| Entity::from_row(model, *pk, row.clone()))
            .collect())
    }

    fn all(&self, model: &str) -> Result<Vec<Entity>, StoreError> {
        self.model(model)?;
        let state = self.lock()?;

        Ok(state
            .data
            .tables
            .get(model)
            .into_iter()
            .flat_map(|table| table.iter())
            .map(|(pk, row)| Entity::from_row(model, *pk, row.clone()))
            .collect())
    }

    fn save(&self, entity: &mut Entity) -> Result<(), StoreError> {
        let model = self.model(entity.model())?;
        let mut state = self.lock_for_write()?;

        let pk = match entity.pk() {
            Some(pk) => pk,
            None => {
                let sequence = state.data.sequences.entry(model.name().to_string()).or_default();
                *sequence += 1;
                EntityId(*sequence)
            }
        };

        let row: Row = model
            .concrete_fields()
            .filter(|field| !field.is_primary_key())
            .filter_map(|field| {
                let value = entity.get(field.name())?;
                Some((field.name().to_string(), value.clone()))
            })
            .collect();

        let data = &mut state.data;

        // Keeps explicit primary keys ahead of the sequence.
        let sequence = data.sequences.entry(model.name().to_string()).or_default();
        *sequence = (*sequence).max(pk.0);

        for field in model.concrete_fields().filter(|field| field.field_type().is_file()) {
            let cleared = row
                .get(field.name())
                .map_or(true, |value| value.is_null() || value.as_str() == Some(""));

            if cleared {
                data.files.remove(&file_key(model.name(), pk, field.name()));
            }
        }

        data.tables.entry(model.name().to_string()).or_default().insert(pk, row);

        for (field, file) in entity.take_pending_uploads() {
            data.files.insert(file_key(model.name(), pk, &field), file);
        }

        entity.set_pk(Some(pk));
        tracing::debug!("saved {} {pk}", model.name());

        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<(), StoreError> {
        let model = self.model(entity.model())?;
        let pk = entity.pk().ok_or_else(|| StoreError::Unsaved(model.name().to_string()))?;

        let mut state = self.lock_for_write()?;
        delete_cascading(&mut state.data, model, pk);

        Ok(())
    }

    fn related_pks(&self, model: &str, pk: EntityId, field: &str) -> Result<Vec<EntityId>, StoreError> {
        let model = self.model(model)?;
        let field = self.field(model, field)?;
        let state = self.lock()?;
        let data = &state.data;

        let pks: Vec<EntityId> = match field.field_type() {
            FieldType::ForeignKey { .. } | FieldType::OneToOne { .. } => data
                .tables
                .get(model.name())
                .and_then(|table| table.get(&pk))
                .and_then(|row| row.get(field.name()))
                .and_then(EntityId::from_value)
                .into_iter()
                .collect(),
            FieldType::ManyToMany { .. } => data
                .links
                .get(&link_key(model.name(), field.name()))
                .into_iter()
                .flatten()
                .filter(|(source, _)| *source == pk)
                .map(|(_, target)| *target)
                .collect(),
            FieldType::ManyToManyRel { from, field } => data
                .links
                .get(&link_key(from, field))
                .into_iter()
                .flatten()
                .filter(|(_, target)| *target == pk)
                .map(|(source, _)| *source)
                .collect(),
            FieldType::ManyToOneRel { from, field } | FieldType::OneToOneRel { from, field } => {
                referencing(data, from, field, pk)
            }
            _ => {
                return Err(StoreError::NotARelation {
                    model: model.name().to_string(),
                    field: field.name().to_string(),
                })
            }
        };

        Ok(pks)
    }

    fn set_related(&self, model: &str, pk: EntityId, field: &str, pks: &[EntityId]) -> Result<(), StoreError> {
        let model = self.model(model)?;
        let field = self.field(model, field)?;
        let mut state = self.lock_for_write()?;
        let data = &mut state.data;

        match field.field_type() {
            FieldType::ManyToMany { .. } => {
                let links = data.links.entry(link_key(model.name(), field.name())).or_default();
                links.retain(|(source, _)| *source != pk);
                links.extend(pks.iter().map(|target| (pk, *target)));
            }
            FieldType::ManyToManyRel { from, field } => {
                let links = data.links.entry(link_key(from, field)).or_default();
                links.retain(|(_, target)| *target != pk);
                links.extend(pks.iter().map(|source| (*source, pk)));
            }
            FieldType::ManyToOneRel { from, field: forward } | FieldType::OneToOneRel { from, field: forward } => {
                let nullable = field
                    .remote_field()
                    .map(|remote| remote.definition().null)
                    .unwrap_or_default();

                let table = data.tables.entry(from.clone()).or_default();

                for (row_pk, row) in table.iter_mut() {
                    let current = row.get(forward.as_str()).and_then(EntityId::from_value);
                    let wanted = pks.contains(row_pk);

                    if wanted {
                        row.insert(forward.clone(), pk.into());
                    } else if current == Some(pk) && nullable {
                        // Non-nullable foreign keys are only ever added to, never detached.
                        row.insert(forward.clone(), Value::Null);
                    }
                }
            }
            _ => {
                return Err(StoreError::NotARelation {
                    model: model.name().to_string(),
                    field: field.name().to_string(),
                })
            }
        }

        Ok(())
    }

    fn exists_with(
        &self,
        model: &str,
        field: &str,
        value: &Value,
        exclude: Option<EntityId>,
    ) -> Result<bool, StoreError> {
        self.model(model)?;
        let state = self.lock()?;

        Ok(state
            .data
            .tables
            .get(model)
            .into_iter()
            .flat_map(|table| table.iter())
            .any(|(pk, row)| Some(*pk) != exclude && row.get(field) == Some(value)))
    }

    fn begin(&self) -> Result<(), StoreError> {
        let mut state = self.lock_for_write()?;
        state.owner = Some(thread::current().id());

        let snapshot = state.data.clone();
        state.savepoints.push(snapshot);

        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut state = self.lock_transaction()?;
        state.savepoints.pop().ok_or(StoreError::NoTransaction)?;
        self.end_transaction(&mut state);

        Ok(())
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let mut state = self.lock_transaction()?;
        state.data = state.savepoints.pop().ok_or(StoreError::NoTransaction)?;
        tracing::debug!("rolled back, {} transactions still open", state.savepoints.len());
        self.end_transaction(&mut state);

        Ok(())
    }
}

fn delete_cascading(data: &mut Data, model: ModelWalker<'_>, pk: EntityId) {
    let removed = data.tables.get_mut(model.name()).and_then(|table| table.remove(&pk));

    if removed.is_none() {
        return;
    }

    let prefix = format!("{}/{pk}/", model.name());
    data.files.retain(|key, _| !key.starts_with(&prefix));

    for field in model.many_to_many_fields() {
        if let Some(links) = data.links.get_mut(&link_key(model.name(), field.name())) {
            links.retain(|(source, _)| *source != pk);
        }
    }

    for related in model.related_objects() {
        let Some(remote) = related.remote_field() else {
            continue;
        };

        let from = remote.model();

        if remote.field_type().is_many_to_many() {
            if let Some(links) = data.links.get_mut(&link_key(from.name(), remote.name())) {
                links.retain(|(_, target)| *target != pk);
            }
            continue;
        }

        let dependents = referencing(data, from.name(), remote.name(), pk);

        match remote.definition().on_delete {
            OnDelete::Cascade => {
                for dependent in dependents {
                    delete_cascading(data, from, dependent);
                }
            }
            OnDelete::SetNull => {
                if let Some(table) = data.tables.get_mut(from.name()) {
                    for dependent in dependents {
                        if let Some(row) = table.get_mut(&dependent) {
                            row.insert(remote.name().to_string(), Value::Null);
                        }
                    }
                }
            }
        }
    }
}

/// Entities of `model` whose `field` stores `pk`.
fn referencing(data: &Data, model: &str, field: &str, pk: EntityId) -> Vec<EntityId> {
    data.tables
        .get(model)
        .into_iter()
        .flat_map(|table| table.iter())
        .filter(|(_, row)| row.get(field).and_then(EntityId::from_value) == Some(pk))
        .map(|(pk, _)| *pk)
        .collect()
}

fn link_key(model: &str, field: &str) -> (String, String) {
    (model.to_string(), field.to_string())
}

fn file_key(model: &str, pk: EntityId, field: &str) -> String {
    format!("{model}/{pk}/{field}")
}
