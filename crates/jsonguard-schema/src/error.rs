/// Errors that can occur while resolving a schema or validating a payload.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema content is not valid JSON.
    #[error("schema is not valid JSON: {0}")]
    InvalidSchema(#[source] serde_json::Error),

    /// The schema could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The validator failed unexpectedly.
    #[error("schema validation aborted: {0}")]
    Internal(String),

    /// Schema files could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema source is missing or incomplete.
    #[error("invalid schema source: {0}")]
    InvalidSource(String),

    /// The configured schema registry resource does not exist.
    #[error("unable to resolve schema registry resource: {0}")]
    ResourceNotFound(String),

    /// The schema mapping expression failed or produced no value.
    #[error("unable to resolve schema name: {0}")]
    NameUnresolved(String),

    /// The registry has no schema for the computed name.
    #[error("unable to resolve schema: {0}")]
    SchemaNotFound(String),

    /// The registry lookup itself failed.
    #[error("schema registry lookup failed: {0}")]
    Registry(String),
}

impl SchemaError {
    /// True when no schema could be determined for the event.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            Self::ResourceNotFound(_)
                | Self::NameUnresolved(_)
                | Self::SchemaNotFound(_)
                | Self::Registry(_)
        )
    }

    /// True when the failure stems from configuration rather than a payload.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidSource(_) | Self::LoadFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
