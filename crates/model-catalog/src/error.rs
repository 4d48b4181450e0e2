#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("model {0} is declared twice")]
    DuplicateModel(String),
    #[error("field {field} is declared twice on model {model}")]
    DuplicateField { model: String, field: String },
    #[error("field {model}.{field} points to unknown model {target}")]
    UnknownRelatedModel {
        model: String,
        field: String,
        target: String,
    },
    #[error("reverse accessor {target}.{name} for field {model}.{field} clashes with an existing field")]
    ReverseAccessorClash {
        model: String,
        field: String,
        target: String,
        name: String,
    },
    #[error("model {model} is guarded by {attribute}, which is not a foreign key or one-to-one field")]
    InvalidGuardAttribute { model: String, attribute: String },
    #[error("model {model} delegates permissions to {target}, which is not a guarded model")]
    UnguardedGuardTarget { model: String, target: String },
}
