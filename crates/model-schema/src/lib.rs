//! Reflection of catalog models into the shapes a GraphQL layer exposes.
//!
//! Fields are described twice: as [`FieldDescriptor`]s for clients rendering forms and as
//! [`TypeShape`]s for the schema itself. Object types are registered in a
//! [`TypeRegistry`], whose [`ModelType`]s also apply the permission rules of queries.

mod choices;
mod descriptor;
mod error;
mod global_id;
mod kind;
mod registry;
mod shape;
mod types;

pub use choices::{choice_item_name, ChoiceEnum, ChoiceItem};
pub use descriptor::{describe_field, is_required, merge_nested, ChoiceDescriptor, FieldDescriptor, Validation};
pub use error::{GlobalIdError, SchemaError};
pub use global_id::{from_global_id, to_global_id};
pub use kind::FieldKind;
pub use registry::SchemaRegistry;
pub use shape::{input_shape, output_shape, ScalarType, TypeShape};
pub use types::{
    ModelType, ModelTypeDefinition, OutputField, QueryContext, TypeNames, TypeRegistry, TypeRegistryBuilder,
};
