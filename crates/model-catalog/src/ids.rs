use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelId(pub(crate) u32);

impl From<ModelId> for usize {
    fn from(value: ModelId) -> Self {
        value.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId {
    pub(crate) model: ModelId,
    pub(crate) index: u32,
}

impl FieldId {
    pub fn model_id(self) -> ModelId {
        self.model
    }
}
