use jsonguard_schema::TemplateEngine;

use crate::error::Result;
use crate::failure::{default_message, ExecutionFailure, FailureKind, APPLICATION_JSON, TEXT_PLAIN};
use crate::phase::HttpPhase;

/// Builds the [`ExecutionFailure`] an HTTP phase interrupts with.
#[derive(Debug, Clone, Default)]
pub struct FailureBuilder {
    error_message: Option<String>,
}

impl FailureBuilder {
    /// `error_message` is a template expression; `None` selects the defaults.
    pub fn new(error_message: Option<String>) -> Self {
        Self { error_message }
    }

    /// Failure for the streaming phases. The body is always JSON.
    pub async fn build(
        &self,
        phase: HttpPhase,
        kind: FailureKind,
        templates: &dyn TemplateEngine,
    ) -> Result<ExecutionFailure> {
        let (message, _) = self.message(phase.status_code(), templates).await?;
        Ok(ExecutionFailure::new(phase.status_code())
            .key(phase.key(kind))
            .message(message)
            .content_type(APPLICATION_JSON))
    }

    /// Failure for the buffered content phases.
    ///
    /// An evaluated message is sent as JSON, the default one as plain text.
    pub async fn build_buffered(
        &self,
        phase: HttpPhase,
        kind: FailureKind,
        templates: &dyn TemplateEngine,
    ) -> Result<ExecutionFailure> {
        let (message, evaluated) = self.message(phase.status_code(), templates).await?;
        let content_type = if evaluated { APPLICATION_JSON } else { TEXT_PLAIN };
        Ok(ExecutionFailure::new(phase.status_code())
            .key(phase.key(kind))
            .message(message)
            .content_type(content_type))
    }

    async fn message(
        &self,
        status_code: u16,
        templates: &dyn TemplateEngine,
    ) -> Result<(String, bool)> {
        if let Some(expression) = &self.error_message {
            if let Some(message) = templates.eval(expression).await? {
                return Ok((message, true));
            }
        }
        Ok((default_message(status_code).to_string(), false))
    }
}
