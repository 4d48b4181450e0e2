use model_store::Entity;

use crate::{CleanedInput, MutationContext, MutationError};

/// Extension points around the persistence of a mutation. Every hook does nothing by
/// default.
///
/// Hooks run inside the mutation's transaction: an error rolls back everything the
/// mutation wrote so far.
pub trait MutationHooks: Send + Sync + 'static {
    /// Model-level validation, run after the field checks.
    fn clean_instance(
        &self,
        _ctx: &MutationContext<'_>,
        _entity: &Entity,
        _input: &CleanedInput,
    ) -> Result<(), MutationError> {
        Ok(())
    }

    fn before_save(
        &self,
        _ctx: &MutationContext<'_>,
        _entity: &mut Entity,
        _input: &CleanedInput,
    ) -> Result<(), MutationError> {
        Ok(())
    }

    fn after_save(&self, _ctx: &MutationContext<'_>, _entity: &Entity, _input: &CleanedInput) -> Result<(), MutationError> {
        Ok(())
    }

    fn before_delete(&self, _ctx: &MutationContext<'_>, _entity: &Entity) -> Result<(), MutationError> {
        Ok(())
    }

    fn after_delete(&self, _ctx: &MutationContext<'_>, _entity: &Entity) -> Result<(), MutationError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl MutationHooks for NoHooks {}
