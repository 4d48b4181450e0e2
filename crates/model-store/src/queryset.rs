use std::collections::BTreeSet;

use crate::EntityId;

/// A set of entities of one model, identified by primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    model: String,
    pks: BTreeSet<EntityId>,
}

impl QuerySet {
    pub fn new(model: impl Into<String>, pks: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            model: model.into(),
            pks: pks.into_iter().collect(),
        }
    }

    pub fn none(model: impl Into<String>) -> Self {
        Self::new(model, [])
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn pks(&self) -> impl ExactSizeIterator<Item = EntityId> + '_ {
        self.pks.iter().copied()
    }

    pub fn contains(&self, pk: EntityId) -> bool {
        self.pks.contains(&pk)
    }

    pub fn len(&self) -> usize {
        self.pks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pks.is_empty()
    }

    #[must_use]
    pub fn union(&self, other: &QuerySet) -> QuerySet {
        debug_assert_eq!(self.model, other.model);

        QuerySet {
            model: self.model.clone(),
            pks: self.pks.union(&other.pks).copied().collect(),
        }
    }

    #[must_use]
    pub fn intersection(&self, other: &QuerySet) -> QuerySet {
        debug_assert_eq!(self.model, other.model);

        QuerySet {
            model: self.model.clone(),
            pks: self.pks.intersection(&other.pks).copied().collect(),
        }
    }
}
