use model_store::StoreError;

pub const DEFAULT_DENIED_MESSAGE: &str = "You don't have permissions to do this...";

/// A failed permission assertion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PermissionDenied {
    pub message: String,
}

impl PermissionDenied {
    pub fn new(message: Option<&str>) -> Self {
        Self {
            message: message.unwrap_or(DEFAULT_DENIED_MESSAGE).to_string(),
        }
    }
}

impl Default for PermissionDenied {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot grant permissions to an anonymous user")]
    AnonymousGrant,
    #[error("model {model} declares no permission {permission}")]
    UnknownPermission { model: String, permission: String },
    #[error("none of the permissions {permissions:?} applies to {model} or the model it delegates to")]
    NoApplicablePermissions { model: String, permissions: Vec<String> },
    #[error("the permission backend lock was poisoned")]
    Poisoned,
}
