use model_mutations::ConfigurationError;

/// A schema that cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("invalid GraphQL schema: {0}")]
    Schema(#[from] async_graphql::dynamic::SchemaError),
}
