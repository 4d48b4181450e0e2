use base64::{engine::general_purpose::STANDARD, Engine};
use model_store::EntityId;

use crate::GlobalIdError;

/// Encodes `<type_name>:<pk>` as a relay global id.
pub fn to_global_id(type_name: &str, pk: EntityId) -> String {
    STANDARD.encode(format!("{type_name}:{pk}"))
}

/// Decodes a relay global id into its type name and raw primary key.
pub fn from_global_id(global_id: &str) -> Result<(String, String), GlobalIdError> {
    let invalid = || GlobalIdError(global_id.to_string());

    let decoded = STANDARD.decode(global_id).map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;

    let (type_name, pk) = decoded.split_once(':').ok_or_else(invalid)?;

    if type_name.is_empty() {
        return Err(invalid());
    }

    Ok((type_name.to_string(), pk.to_string()))
}
