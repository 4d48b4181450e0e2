use model_permissions::{PermissionDenied, PermissionError};
use model_schema::SchemaError;
use model_store::StoreError;

/// Reported when a denial carries no message of its own.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission denied...";

/// Validation messages, attributed to a field or to the whole entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", format_errors(.errors))]
pub struct ValidationError {
    errors: Vec<(Option<String>, String)>,
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![(Some(field.into()), message.into())],
        }
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self {
            errors: vec![(None, message.into())],
        }
    }

    pub fn push(&mut self, field: Option<&str>, message: impl Into<String>) {
        self.errors.push((field.map(str::to_string), message.into()));
    }

    pub fn extend(&mut self, other: ValidationError) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|(name, _)| name.as_deref() == Some(field))
    }

    pub fn errors(&self) -> impl ExactSizeIterator<Item = (Option<&str>, &str)> + '_ {
        self.errors
            .iter()
            .map(|(field, message)| (field.as_deref(), message.as_str()))
    }
}

fn format_errors(errors: &[(Option<String>, String)]) -> String {
    errors
        .iter()
        .map(|(field, message)| match field {
            Some(field) => format!("{field}: {message}"),
            None => message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed mutation.
///
/// Validation errors and permission denials are reported in the payload, everything
/// else fails the request.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error("{0}")]
    Assertion(String),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MutationError {
    pub(crate) fn denied() -> Self {
        MutationError::PermissionDenied(PermissionDenied {
            message: PERMISSION_DENIED_MESSAGE.to_string(),
        })
    }
}

/// A mutation that cannot be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown model {0}")]
    UnknownModel(String),
    #[error("Unable to find type for model {0} in the type registry")]
    MissingType(String),
    #[error("model {model} has no field {field}")]
    UnknownField { model: String, field: String },
    #[error("input schema override of {input} names the unknown field {field}")]
    UnknownOverride { input: String, field: String },
    #[error("mutation {0} is registered twice")]
    DuplicateMutation(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
