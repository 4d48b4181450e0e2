//! Entities and the persistence seam the mutation pipeline writes through.
//!
//! [`Datastore`] stands in for the host ORM's database access. [`MemoryStore`] is a
//! complete in-process implementation with nested transactions, used by the test
//! suites and suitable for prototyping.

mod entity;
mod error;
mod memory;
mod queryset;

use serde_json::Value;

pub use entity::{Entity, EntityId, FormValue, UploadedFile};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use queryset::QuerySet;

pub trait Datastore: Send + Sync {
    fn get(&self, model: &str, pk: EntityId) -> Result<Option<Entity>, StoreError>;

    /// Entities of `model` whose primary key is in `pks`, ordered by primary key. Missing
    /// keys are skipped.
    fn get_many(&self, model: &str, pks: &[EntityId]) -> Result<Vec<Entity>, StoreError>;

    fn all(&self, model: &str) -> Result<Vec<Entity>, StoreError>;

    /// Inserts or updates the entity row. A primary key is assigned on insert and the
    /// pending uploads are persisted.
    fn save(&self, entity: &mut Entity) -> Result<(), StoreError>;

    /// Deletes the entity, applying the `on_delete` rule of every foreign key pointing at it
    /// and dropping its many-to-many links.
    fn delete(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Primary keys on the other side of a relation field of `model`, forward or reverse.
    fn related_pks(&self, model: &str, pk: EntityId, field: &str) -> Result<Vec<EntityId>, StoreError>;

    /// Replaces the membership of a many-to-many or reverse relation.
    fn set_related(&self, model: &str, pk: EntityId, field: &str, pks: &[EntityId]) -> Result<(), StoreError>;

    /// Whether another entity of `model` stores `value` in `field`.
    fn exists_with(&self, model: &str, field: &str, value: &Value, exclude: Option<EntityId>)
        -> Result<bool, StoreError>;

    fn begin(&self) -> Result<(), StoreError>;

    fn commit(&self) -> Result<(), StoreError>;

    fn rollback(&self) -> Result<(), StoreError>;
}

/// Runs `f` in a transaction, committed when it returns `Ok` and rolled back otherwise.
pub fn atomic<T, E>(store: &dyn Datastore, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
where
    E: From<StoreError>,
{
    store.begin()?;

    match f() {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = store.rollback() {
                tracing::error!("rolling back failed: {rollback_error}");
            }
            Err(error)
        }
    }
}
