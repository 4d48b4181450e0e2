//! Create, update and delete mutations over catalog models.
//!
//! A [`MutationDefinition`] names a model and the options of the mutation. Built into a
//! [`MutationRegistry`], each becomes a [`Mutation`] with a reflected input object. Executing
//! a mutation checks the role permissions of the user, resolves the global ids and uploads
//! of the input, validates and saves the entity, and checks the object permissions of the
//! user on it. Everything the mutation writes happens in one transaction.

mod definition;
mod error;
mod hooks;
mod input;
mod node;
mod pipeline;
mod settings;
mod upload;
mod validation;

pub use definition::{InputField, Mutation, MutationDefinition, MutationKind, MutationRegistry};
pub use error::{ConfigurationError, MutationError, ValidationError, PERMISSION_DENIED_MESSAGE};
pub use hooks::{MutationHooks, NoHooks};
pub use input::{CleanedInput, CleanedValue, MutationContext};
pub use node::{get_node, get_nodes};
pub use pipeline::{MutationPayload, PayloadError};
pub use settings::Settings;
pub use upload::{parse_multipart, place_files, UploadError, Uploads};
pub use validation::{clean_field, full_clean, is_empty_value};
