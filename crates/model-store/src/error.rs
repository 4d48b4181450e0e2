use crate::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown model {0}")]
    UnknownModel(String),
    #[error("unknown field {model}.{field}")]
    UnknownField { model: String, field: String },
    #[error("{model}.{field} is not a relation")]
    NotARelation { model: String, field: String },
    #[error("{0} instance needs a primary key before this operation")]
    Unsaved(String),
    #[error("{model} matching pk {pk} does not exist")]
    DoesNotExist { model: String, pk: EntityId },
    #[error("no transaction is in progress")]
    NoTransaction,
    #[error("the datastore lock was poisoned")]
    Poisoned,
}
