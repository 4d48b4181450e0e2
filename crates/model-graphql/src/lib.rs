//! The GraphQL surface of a model catalog, built as an `async-graphql` dynamic schema.
//!
//! Every registered object type becomes a relay node with a countable connection, a list
//! query field and a node query field. Every registered mutation becomes a mutation field
//! taking a single `input` argument and returning a payload with the mutated entity and
//! its errors. The reflected object and input schemas are queryable for client-side forms.
//!
//! Requests carry the current [`User`](model_permissions::User) and the
//! [`Uploads`](model_mutations::Uploads) of a multipart request as request data. Without
//! them the request runs as an anonymous user without files.

mod builder;
mod error;
mod multipart;
mod mutation;
mod objects;
mod ordering;
mod query;
mod reflection;
mod scalars;
mod scope;

pub use builder::{ModelSchema, ModelSchemaBuilder};
pub use error::BuildError;
pub use multipart::multipart_request;
pub use ordering::{order_entities, OrderingError};
