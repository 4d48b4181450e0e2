//! Resolution of relay global ids given as mutation input.

use model_schema::{from_global_id, ModelType, QueryContext};
use model_store::{Entity, EntityId};

use crate::{MutationError, ValidationError};

/// Resolves one global id through the permission rules of its object type.
///
/// An empty id is `None`. Malformed ids, ids of another type than `only_type` and ids of
/// entities the user cannot see are validation errors of `field`.
pub fn get_node(
    ctx: &QueryContext<'_>,
    global_id: &str,
    field: &str,
    only_type: Option<&ModelType>,
) -> Result<Option<Entity>, MutationError> {
    if global_id.is_empty() {
        return Ok(None);
    }

    let (type_name, pk) = from_global_id(global_id).map_err(|error| ValidationError::field(field, error.to_string()))?;

    if let Some(only_type) = only_type {
        if only_type.name() != type_name {
            return Err(ValidationError::field(field, format!("Must receive a {} id.", only_type.name())).into());
        }
    }

    let Some(node_type) = ctx.types.get(&type_name) else {
        return Err(ValidationError::field(field, format!("Relay Node \"{type_name}\" not found in schema")).into());
    };

    let unresolved = || ValidationError::field(field, format!("Couldn't resolve to a node: {global_id}"));
    let pk: EntityId = pk.parse().map_err(|_| unresolved())?;

    match node_type.get_node(ctx, pk)? {
        Some(entity) => Ok(Some(entity)),
        None => Err(unresolved().into()),
    }
}

/// Resolves a list of global ids of a single type, in input order. Empty ids are skipped.
///
/// Unlike [`get_node`], the entities are not filtered by the permission rules of their
/// type. A list mixing types, or naming a missing entity, is an assertion failure.
pub fn get_nodes(
    ctx: &QueryContext<'_>,
    global_ids: &[String],
    field: &str,
    only_type: Option<&ModelType>,
) -> Result<Vec<Entity>, MutationError> {
    let mut used_type: Option<String> = only_type.map(|ty| ty.name().to_string());
    let mut pks = Vec::new();
    let mut invalid = Vec::new();

    for global_id in global_ids.iter().filter(|id| !id.is_empty()) {
        let Ok((type_name, pk)) = from_global_id(global_id) else {
            invalid.push(global_id.as_str());
            continue;
        };

        if let Some(used) = &used_type {
            if *used != type_name {
                return Err(MutationError::Assertion(format!("Must receive a {used} id.")));
            }
        }

        used_type = Some(type_name);
        pks.push(pk);
    }

    if !invalid.is_empty() {
        return Err(ValidationError::field(field, unresolved_list(&invalid)).into());
    }

    let Some(type_name) = used_type else {
        return Ok(Vec::new());
    };

    let node_type = ctx
        .types
        .get(&type_name)
        .ok_or_else(|| MutationError::Assertion(format!("Could not resolve the type {type_name}")))?;
    let model = node_type.model(ctx.catalog());

    let mut parsed = Vec::with_capacity(pks.len());
    for pk in &pks {
        match pk.parse::<EntityId>() {
            Ok(pk) => parsed.push(pk),
            Err(_) => return Err(missing_node(&type_name, pk)),
        }
    }

    let mut nodes = ctx.store.get_many(model.name(), &parsed)?;

    if nodes.is_empty() {
        let ids: Vec<&str> = global_ids.iter().map(String::as_str).collect();
        return Err(ValidationError::field(field, unresolved_list(&ids)).into());
    }

    for pk in &parsed {
        if !nodes.iter().any(|node| node.pk() == Some(*pk)) {
            return Err(missing_node(&type_name, &pk.to_string()));
        }
    }

    nodes.sort_by_key(|node| parsed.iter().position(|pk| node.pk() == Some(*pk)));

    Ok(nodes)
}

fn missing_node(type_name: &str, pk: &str) -> MutationError {
    MutationError::Assertion(format!("There is no node of type {type_name} with pk {pk}"))
}

fn unresolved_list(ids: &[&str]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| format!("'{id}'")).collect();
    format!("Could not resolve to a node with the id list of '[{}]'.", ids.join(", "))
}
