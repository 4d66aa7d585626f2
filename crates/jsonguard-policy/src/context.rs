//! What a policy phase needs from its host.

use std::sync::{Mutex, PoisonError};

use jsonguard_schema::{AttributeTemplateEngine, ResourceManager, ResourceMap, TemplateEngine};
use tokio_util::sync::CancellationToken;

use crate::message::MessageNamespace;

/// Receives the diagnostic text of every refused payload.
pub trait MetricsSink: Send + Sync {
    fn set_error_message(&self, message: &str);
}

/// Per-event execution context supplied by the host.
pub trait ExecutionContext: Send + Sync {
    /// Named resources, schema registries included.
    fn resources(&self) -> &dyn ResourceManager;

    /// Template engine bound to the request.
    fn template_engine(&self) -> &dyn TemplateEngine;

    /// Template engine bound to one message on top of the request.
    fn message_template_engine(&self, namespace: &MessageNamespace)
        -> Box<dyn TemplateEngine + '_>;

    fn metrics(&self) -> &dyn MetricsSink;

    /// Cancelled when the event is abandoned.
    fn cancellation(&self) -> &CancellationToken;
}

/// Keeps the last error message it was given.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    error_message: Mutex<Option<String>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn set_error_message(&self, message: &str) {
        *self
            .error_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }
}

/// Self-contained context for tools and tests.
///
/// Templates are rendered by an [`AttributeTemplateEngine`]; message phases
/// layer the message namespace over the request attributes.
#[derive(Debug, Default)]
pub struct LocalContext {
    resources: ResourceMap,
    templates: AttributeTemplateEngine,
    metrics: RecordingMetrics,
    cancellation: CancellationToken,
}

impl LocalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, resources: ResourceMap) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_templates(mut self, templates: AttributeTemplateEngine) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Last error message recorded by a phase, if any.
    pub fn recorded_error_message(&self) -> Option<String> {
        self.metrics.error_message()
    }
}

impl ExecutionContext for LocalContext {
    fn resources(&self) -> &dyn ResourceManager {
        &self.resources
    }

    fn template_engine(&self) -> &dyn TemplateEngine {
        &self.templates
    }

    fn message_template_engine(
        &self,
        namespace: &MessageNamespace,
    ) -> Box<dyn TemplateEngine + '_> {
        Box::new(self.templates.extended(namespace.iter()))
    }

    fn metrics(&self) -> &dyn MetricsSink {
        &self.metrics
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::message::Message;

    #[test]
    fn recording_metrics_keeps_last_message() {
        let metrics = RecordingMetrics::new();
        assert!(metrics.error_message().is_none());
        metrics.set_error_message("first");
        metrics.set_error_message("second");
        assert_eq!(metrics.error_message().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn message_engine_layers_namespace() {
        let templates = AttributeTemplateEngine::new().with_attribute("request.id", "r-1");
        let ctx = LocalContext::new().with_templates(templates);
        let message = Message::new(Bytes::new()).with_id("m-1");
        let engine = ctx.message_template_engine(&MessageNamespace::for_message(&message));
        assert_eq!(
            engine.eval("{request.id}/{message.id}").await.unwrap().as_deref(),
            Some("r-1/m-1")
        );
        assert_eq!(
            ctx.template_engine().eval("{message.id}").await.unwrap(),
            None
        );
    }
}
