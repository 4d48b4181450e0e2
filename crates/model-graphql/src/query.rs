use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, TypeRef};
use model_schema::{from_global_id, ModelType, TypeRegistry};
use model_store::{Entity, EntityId};

use crate::{
    objects::{connection_name, orderby, orderby_argument, ConnectionValue, NODE},
    reflection,
    scope::Scope,
};

pub(crate) const QUERY: &str = "Query";

pub(crate) fn query_root(types: &TypeRegistry) -> Object {
    let root = Object::new(QUERY).field(node_field());

    let root = types.types().fold(root, |root, ty| {
        root.field(list_field(ty)).field(single_node_field(ty))
    });

    reflection::query_fields()
        .into_iter()
        .fold(root, |root, field| root.field(field))
}

fn id_argument() -> InputValue {
    InputValue::new("id", TypeRef::named_nn(TypeRef::ID)).description("The ID of the object")
}

/// Resolves a global id restricted to `only_type`, when given. Missing and hidden entities
/// are `None`.
fn resolve_node<'a>(
    ctx: &ResolverContext<'a>,
    only_type: Option<&str>,
) -> async_graphql::Result<Option<(&'a ModelType, Entity)>> {
    let scope = Scope::of(ctx)?;
    let id = ctx.args.try_get("id")?;
    let id = id.string()?;

    let (type_name, pk) = from_global_id(id)?;

    if let Some(only_type) = only_type {
        if only_type != type_name {
            return Err(async_graphql::Error::new(format!("Must receive a {only_type} id.")));
        }
    }

    let ty = scope.object_type(&type_name)?;

    let Ok(pk) = pk.parse::<EntityId>() else {
        return Ok(None);
    };

    let entity = ty.get_node(&scope.query(), pk)?;

    if entity.is_none() {
        tracing::debug!("{type_name} {pk} is not visible to {:?}", scope.user.username);
    }

    Ok(entity.map(|entity| (ty, entity)))
}

fn node_field() -> Field {
    Field::new("node", TypeRef::named(NODE), |ctx| {
        FieldFuture::new(async move {
            let node = resolve_node(&ctx, None)?;

            Ok(node.map(|(ty, entity)| FieldValue::owned_any(entity).with_type(ty.name().to_string())))
        })
    })
    .argument(id_argument())
    .description("The ID of the object")
}

fn single_node_field(ty: &ModelType) -> Field {
    let type_name = ty.name().to_string();

    Field::new(ty.node_field(), TypeRef::named(ty.name()), move |ctx| {
        let type_name = type_name.clone();

        FieldFuture::new(async move {
            let node = resolve_node(&ctx, Some(type_name.as_str()))?;
            Ok(node.map(|(_, entity)| FieldValue::owned_any(entity)))
        })
    })
    .argument(id_argument())
}

fn list_field(ty: &ModelType) -> Field {
    let type_name = ty.name().to_string();

    Field::new(ty.list_field(), TypeRef::named(connection_name(ty.name())), move |ctx| {
        let type_name = type_name.clone();

        FieldFuture::new(async move {
            let scope = Scope::of(&ctx)?;
            let ty = scope.object_type(&type_name)?;
            let model = ty.model(scope.state.types.catalog());

            let pks: Vec<EntityId> = ty.get_queryset(&scope.query())?.pks().collect();
            let entities = scope.state.store.get_many(model.name(), &pks)?;

            let connection = ConnectionValue::new(model, entities, &orderby(&ctx)?)?;

            Ok(Some(FieldValue::owned_any(connection)))
        })
    })
    .argument(orderby_argument())
}
