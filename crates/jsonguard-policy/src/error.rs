use jsonguard_schema::{SchemaError, TemplateError};

/// Errors that escape a policy phase.
///
/// Payload and resolution problems never show up here; they are turned into
/// phase outcomes. What remains is configuration, error-message evaluation
/// and cancellation.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy cannot run the requested phase with its configuration.
    #[error("invalid policy configuration: {0}")]
    Configuration(String),

    /// The configured schema source could not be turned into a resolver.
    #[error("invalid schema configuration: {0}")]
    Schema(#[source] SchemaError),

    /// The policy configuration document could not be parsed.
    #[error("policy configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured error message could not be evaluated.
    #[error("failed to evaluate error message: {0}")]
    ErrorMessage(#[from] TemplateError),

    /// The event was cancelled before the phase completed.
    #[error("phase cancelled")]
    Cancelled,
}

impl PolicyError {
    /// True for errors that make the policy refuse a phase outright.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Schema(_) | Self::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
