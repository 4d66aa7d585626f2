use serde::{Deserialize, Serialize};

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

/// Default message for a 400 failure.
pub const BAD_REQUEST: &str = "Bad Request";
/// Default message for any other failure status.
pub const INTERNAL_ERROR: &str = "Internal Error";

/// Default failure message for an HTTP status.
pub fn default_message(status_code: u16) -> &'static str {
    if status_code == 400 {
        BAD_REQUEST
    } else {
        INTERNAL_ERROR
    }
}

/// Why a payload was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The payload or schema could not be parsed, or no schema was found.
    Format,
    /// The payload is JSON but violates the schema.
    Payload,
}

/// Structured failure a host turns into an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    pub status_code: u16,
    pub key: String,
    pub message: String,
    pub content_type: String,
}

impl ExecutionFailure {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            key: String::new(),
            message: default_message(status_code).to_string(),
            content_type: APPLICATION_JSON.to_string(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// A refused payload: what went wrong and the text recorded in metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: FailureKind,
    pub detail: String,
    /// No schema could be resolved for the event. Always blocking.
    pub unresolved: bool,
}

impl Violation {
    pub fn format(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Format,
            detail: detail.into(),
            unresolved: false,
        }
    }

    pub fn payload(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Payload,
            detail: detail.into(),
            unresolved: false,
        }
    }

    /// Schema resolution failed; reported under the format key.
    pub fn unresolved(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Format,
            detail: detail.into(),
            unresolved: true,
        }
    }
}
