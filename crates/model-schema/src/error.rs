use model_permissions::PermissionError;
use model_store::StoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Don't know how to convert the field {field} ({type_name})")]
    UnsupportedField { field: String, type_name: String },
    #[error("unknown model {0}")]
    UnknownModel(String),
    #[error("model {model} has no field {field}")]
    UnknownField { model: String, field: String },
    #[error("type {0} is registered twice")]
    DuplicateType(String),
    #[error("model {model} already has the type {existing}")]
    DuplicateModelType { model: String, existing: String },
    #[error("invalid schema override for {name}: {message}")]
    InvalidOverride { name: String, message: String },
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A relay global id that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unable to parse global ID \"{0}\". Make sure it is a base64 encoded string in the format: \"TypeName:id\".")]
pub struct GlobalIdError(pub String);
