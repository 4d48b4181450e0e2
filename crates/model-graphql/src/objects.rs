use std::collections::BTreeMap;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, Interface, InterfaceField, Object, ResolverContext, TypeRef};
use base64::{engine::general_purpose::STANDARD, Engine};
use model_catalog::ModelWalker;
use model_schema::{to_global_id, ChoiceEnum, ModelType, OutputField, TypeRegistry, TypeShape};
use model_store::Entity;

use crate::{order_entities, scalars::output_value, scope::Scope};

pub(crate) const NODE: &str = "Node";

/// Entities of a connection, in their final order.
pub(crate) struct ConnectionValue {
    edges: Vec<Edge>,
}

struct Edge {
    cursor: String,
    node: Entity,
}

impl ConnectionValue {
    /// Orders `entities` by `orderby` and numbers the edges.
    pub(crate) fn new(model: ModelWalker<'_>, mut entities: Vec<Entity>, orderby: &[String]) -> async_graphql::Result<Self> {
        order_entities(model, &mut entities, orderby)?;

        let edges = entities
            .into_iter()
            .enumerate()
            .map(|(offset, node)| Edge {
                cursor: STANDARD.encode(format!("arrayconnection:{offset}")),
                node,
            })
            .collect();

        Ok(Self { edges })
    }
}

pub(crate) fn node_interface() -> Interface {
    Interface::new(NODE)
        .description("An object with an ID")
        .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)).description("The ID of the object"))
}

pub(crate) fn connection_name(type_name: &str) -> String {
    format!("{type_name}Connection")
}

/// The GraphQL type of a shape. Lists have nullable items.
pub(crate) fn type_ref(shape: &TypeShape, nullable: bool) -> TypeRef {
    let type_ref = match shape {
        TypeShape::Scalar(scalar) => TypeRef::named(scalar.name()),
        TypeShape::Enum(name) | TypeShape::Object(name) => TypeRef::named(name),
        TypeShape::Connection(name) => TypeRef::named(connection_name(name)),
        TypeShape::List(inner) => TypeRef::List(Box::new(type_ref(inner, true))),
    };

    if nullable {
        type_ref
    } else {
        TypeRef::NonNull(Box::new(type_ref))
    }
}

pub(crate) fn orderby_argument() -> InputValue {
    InputValue::new("orderby", TypeRef::List(Box::new(TypeRef::named(TypeRef::STRING))))
        .description("Fields to order by, prefixed with `-` for descending order.")
}

pub(crate) fn orderby(ctx: &ResolverContext<'_>) -> async_graphql::Result<Vec<String>> {
    let Some(value) = ctx.args.get("orderby") else {
        return Ok(Vec::new());
    };

    if value.is_null() {
        return Ok(Vec::new());
    }

    value
        .list()?
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| item.string().map(str::to_string))
        .collect()
}

/// Object types of the registry, with their connection and edge types, and the choice
/// enums their fields use.
pub(crate) struct ObjectTypes {
    pub(crate) objects: Vec<Object>,
    pub(crate) enums: BTreeMap<String, ChoiceEnum>,
}

impl ObjectTypes {
    pub(crate) fn build(types: &TypeRegistry) -> Self {
        let mut objects = Vec::with_capacity(types.types().len() * 3);
        let mut enums = BTreeMap::new();

        for ty in types.types() {
            let model = ty.model(types.catalog());

            let object = ty
                .fields()
                .iter()
                .fold(Object::new(ty.name()).implement(NODE), |object, output| {
                    object.field(model_field(ty, model, output, &mut enums))
                });

            let object = match ty.description() {
                Some(description) => object.description(description),
                None => object,
            };

            objects.push(object);
            objects.extend(connection_types(ty.name()));
        }

        Self { objects, enums }
    }
}

fn model_field(ty: &ModelType, model: ModelWalker<'_>, output: &OutputField, enums: &mut BTreeMap<String, ChoiceEnum>) -> Field {
    let type_ref = type_ref(&output.shape, output.nullable);
    let name = output.field.clone();

    let model_field = model.field(&output.field);
    let is_pk = model_field.is_some_and(|field| field.is_primary_key());

    let field = match &output.shape {
        _ if is_pk => {
            let type_name = ty.name().to_string();

            Field::new(&output.name, type_ref, move |ctx| {
                let type_name = type_name.clone();

                FieldFuture::new(async move {
                    let entity = ctx.parent_value.try_downcast_ref::<Entity>()?;
                    Ok(entity.pk().map(|pk| FieldValue::value(to_global_id(&type_name, pk))))
                })
            })
        }
        TypeShape::Object(related_type) => {
            let related_type = related_type.clone();
            let reverse = model_field.is_some_and(|field| field.field_type().is_reverse());

            Field::new(&output.name, type_ref, move |ctx| {
                let (name, related_type) = (name.clone(), related_type.clone());

                FieldFuture::new(async move {
                    let scope = Scope::of(&ctx)?;
                    let entity = ctx.parent_value.try_downcast_ref::<Entity>()?;
                    let related = scope.object_type(&related_type)?;

                    let pk = if reverse {
                        match entity.pk() {
                            Some(pk) => scope.state.store.related_pks(entity.model(), pk, &name)?.first().copied(),
                            None => None,
                        }
                    } else {
                        entity.related_pk(&name)
                    };

                    let Some(pk) = pk else {
                        return Ok(None);
                    };

                    Ok(related.get_node(&scope.query(), pk)?.map(FieldValue::owned_any))
                })
            })
        }
        TypeShape::Connection(related_type) => {
            let related_type = related_type.clone();

            Field::new(&output.name, type_ref, move |ctx| {
                let (name, related_type) = (name.clone(), related_type.clone());

                FieldFuture::new(async move {
                    let scope = Scope::of(&ctx)?;
                    let entity = ctx.parent_value.try_downcast_ref::<Entity>()?;
                    let related = scope.object_type(&related_type)?;
                    let related_model = related.model(scope.state.types.catalog());

                    let entities = match entity.pk() {
                        Some(pk) => {
                            let pks = scope.state.store.related_pks(entity.model(), pk, &name)?;
                            let entities = scope.state.store.get_many(related_model.name(), &pks)?;
                            related.visible(&scope.query(), entities)?
                        }
                        None => Vec::new(),
                    };

                    let connection = ConnectionValue::new(related_model, entities, &orderby(&ctx)?)?;

                    Ok(Some(FieldValue::owned_any(connection)))
                })
            })
            .argument(orderby_argument())
        }
        shape => {
            let shape = shape.clone();
            let choices = model_field.and_then(ChoiceEnum::for_field);

            if let Some(choices) = &choices {
                enums.insert(choices.name.clone(), choices.clone());
            }

            Field::new(&output.name, type_ref, move |ctx| {
                let (name, shape, choices) = (name.clone(), shape.clone(), choices.clone());

                FieldFuture::new(async move {
                    let entity = ctx.parent_value.try_downcast_ref::<Entity>()?;

                    let value = match entity.get(&name) {
                        Some(value) => output_value(&shape, choices.as_ref(), value),
                        None => async_graphql::Value::Null,
                    };

                    Ok(Some(value).filter(|value| *value != async_graphql::Value::Null).map(FieldValue::value))
                })
            })
        }
    };

    match &output.description {
        Some(description) => field.description(description),
        None => field,
    }
}

fn connection_types(type_name: &str) -> [Object; 2] {
    let edge_name = format!("{type_name}Edge");

    let connection = Object::new(connection_name(type_name))
        .field(Field::new(
            "edges",
            TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::named(&edge_name))))),
            |ctx| {
                FieldFuture::new(async move {
                    let connection = ctx.parent_value.try_downcast_ref::<ConnectionValue>()?;

                    Ok(Some(FieldValue::list(
                        connection.edges.iter().map(|edge| FieldValue::borrowed_any(edge)),
                    )))
                })
            },
        ))
        .field(
            Field::new("totalCount", TypeRef::named(TypeRef::INT), |ctx| {
                FieldFuture::new(async move {
                    let connection = ctx.parent_value.try_downcast_ref::<ConnectionValue>()?;
                    Ok(Some(FieldValue::value(connection.edges.len() as i64)))
                })
            })
            .description("The total count of objects in this query."),
        );

    let edge = Object::new(edge_name)
        .description(format!("A Relay edge containing a `{type_name}` and its cursor."))
        .field(
            Field::new("node", TypeRef::named(type_name), |ctx| {
                FieldFuture::new(async move {
                    let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                    Ok(Some(FieldValue::borrowed_any(&edge.node)))
                })
            })
            .description("The item at the end of the edge"),
        )
        .field(
            Field::new("cursor", TypeRef::named_nn(TypeRef::STRING), |ctx| {
                FieldFuture::new(async move {
                    let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                    Ok(Some(FieldValue::value(edge.cursor.clone())))
                })
            })
            .description("A cursor for use in pagination"),
        );

    [connection, edge]
}
