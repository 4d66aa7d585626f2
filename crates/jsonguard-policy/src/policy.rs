use std::future::Future;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use jsonguard_kafka::{FetchResponse, KafkaMessage, ProduceRequest, ProduceResponse};
use jsonguard_schema::{
    ResolutionScope, SchemaResolver, TemplateEngine, ValidationEngine,
};

use crate::config::{PolicyConfiguration, PolicyScope};
use crate::context::ExecutionContext;
use crate::error::{PolicyError, Result};
use crate::failure::{ExecutionFailure, FailureKind, Violation};
use crate::handler::{FailureBuilder, PublishHandler, SubscribeAction, SubscribeHandler};
use crate::message::{Message, MessageNamespace};
use crate::phase::HttpPhase;

/// Identifier the policy registers under.
pub const POLICY_ID: &str = "json-validation";

/// Result of a plain request or response phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    Continue,
    Interrupt(ExecutionFailure),
}

/// Result of validating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Forward(Message),
    Interrupt(ExecutionFailure),
}

/// Result of validating one produced record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Accept(KafkaMessage),
    /// The produce request is answered with `response`.
    Interrupt {
        response: ProduceResponse,
        kind: FailureKind,
    },
}

/// Result of validating one fetched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Deliver the record, possibly carrying a marker header.
    Accept(KafkaMessage),
    /// The fetch response was rewritten in place and is returned as is.
    Interrupt { kind: FailureKind },
}

pub(crate) enum Verdict {
    Valid,
    Invalid(Violation),
}

/// Validates JSON payloads against a schema in every gateway phase.
#[derive(Debug)]
pub struct JsonValidationPolicy {
    resolver: SchemaResolver,
    engine: ValidationEngine,
    failures: FailureBuilder,
    straight_respond: bool,
    scope: PolicyScope,
    publish_handler: Option<PublishHandler>,
    subscribe_handler: Option<SubscribeHandler>,
}

impl JsonValidationPolicy {
    /// Build the policy, rejecting configurations it could never run.
    pub fn new(config: PolicyConfiguration) -> Result<Self> {
        let source = config.effective_schema_source()?;
        let resolver = SchemaResolver::from_source(&source).map_err(PolicyError::Schema)?;
        let subscribe_handler = config
            .on_subscribe()
            .map(SubscribeHandler::from_config)
            .transpose()?;
        let publish_handler = config.on_publish().map(PublishHandler::from_config);

        tracing::debug!(
            source = source_kind(&resolver),
            unchecked = config.validate_unchecked,
            deep_check = config.deep_check,
            straight_respond = config.straight_respond_mode,
            "json validation policy configured"
        );

        Ok(Self {
            resolver,
            engine: ValidationEngine::new(config.validation_options()),
            failures: FailureBuilder::new(config.error_message_template().map(str::to_string)),
            straight_respond: config.straight_respond_mode,
            scope: config.scope,
            publish_handler,
            subscribe_handler,
        })
    }

    pub fn id(&self) -> &'static str {
        POLICY_ID
    }

    pub fn scope(&self) -> PolicyScope {
        self.scope
    }

    pub(crate) fn failures(&self) -> &FailureBuilder {
        &self.failures
    }

    pub(crate) fn straight_respond(&self, phase: HttpPhase) -> bool {
        self.straight_respond && phase.allows_straight_respond()
    }

    /// Validate a complete request body.
    pub async fn on_request(
        &self,
        ctx: &dyn ExecutionContext,
        body: &Bytes,
    ) -> Result<HttpOutcome> {
        self.guarded(ctx, self.check_plain(ctx, HttpPhase::Request, body))
            .await
    }

    /// Validate a complete response body.
    pub async fn on_response(
        &self,
        ctx: &dyn ExecutionContext,
        body: &Bytes,
    ) -> Result<HttpOutcome> {
        self.guarded(ctx, self.check_plain(ctx, HttpPhase::Response, body))
            .await
    }

    pub async fn on_message_request(
        &self,
        ctx: &dyn ExecutionContext,
        message: Message,
    ) -> Result<MessageOutcome> {
        let work = self.check_message(ctx, HttpPhase::MessageRequest, message);
        self.guarded(ctx, work).await
    }

    pub async fn on_message_response(
        &self,
        ctx: &dyn ExecutionContext,
        message: Message,
    ) -> Result<MessageOutcome> {
        let work = self.check_message(ctx, HttpPhase::MessageResponse, message);
        self.guarded(ctx, work).await
    }

    /// Validate every message of a request stream independently.
    pub fn on_message_request_stream<'a, S>(
        &'a self,
        ctx: &'a dyn ExecutionContext,
        messages: S,
    ) -> impl Stream<Item = Result<MessageOutcome>> + 'a
    where
        S: Stream<Item = Message> + 'a,
    {
        messages.then(move |message| self.on_message_request(ctx, message))
    }

    /// Validate every message of a response stream independently.
    pub fn on_message_response_stream<'a, S>(
        &'a self,
        ctx: &'a dyn ExecutionContext,
        messages: S,
    ) -> impl Stream<Item = Result<MessageOutcome>> + 'a
    where
        S: Stream<Item = Message> + 'a,
    {
        messages.then(move |message| self.on_message_response(ctx, message))
    }

    /// Validate one record of `request` on its way to the broker.
    pub async fn on_kafka_publish(
        &self,
        ctx: &dyn ExecutionContext,
        request: &ProduceRequest,
        message: KafkaMessage,
    ) -> Result<PublishOutcome> {
        let handler = self.publish_handler.as_ref().ok_or_else(|| {
            PolicyError::Configuration(
                "json validation for Kafka is not configured for onPublish phase".to_string(),
            )
        })?;

        self.guarded(ctx, async move {
            let verdict = self.check_kafka(ctx, &message).await;
            match verdict {
                Verdict::Valid => Ok(PublishOutcome::Accept(message)),
                Verdict::Invalid(violation) => {
                    let response = handler.on_error(request, &message.coordinates());
                    Ok(PublishOutcome::Interrupt {
                        response,
                        kind: violation.kind,
                    })
                }
            }
        })
        .await
    }

    /// Validate one record of `response` on its way to the consumer.
    pub async fn on_kafka_subscribe(
        &self,
        ctx: &dyn ExecutionContext,
        response: &mut FetchResponse,
        mut message: KafkaMessage,
    ) -> Result<SubscribeOutcome> {
        let handler = self.subscribe_handler.as_ref().ok_or_else(|| {
            PolicyError::Configuration(
                "json validation for Kafka is not configured for onSubscribe phase".to_string(),
            )
        })?;

        self.guarded(ctx, async move {
            let verdict = self.check_kafka(ctx, &message).await;
            match verdict {
                Verdict::Valid => Ok(SubscribeOutcome::Accept(message)),
                Verdict::Invalid(violation) => {
                    match handler.on_error(response, &mut message, &violation.detail) {
                        SubscribeAction::Interrupt => Ok(SubscribeOutcome::Interrupt {
                            kind: violation.kind,
                        }),
                        SubscribeAction::Continue => Ok(SubscribeOutcome::Accept(message)),
                    }
                }
            }
        })
        .await
    }

    async fn check_plain(
        &self,
        ctx: &dyn ExecutionContext,
        phase: HttpPhase,
        body: &[u8],
    ) -> Result<HttpOutcome> {
        let templates = ctx.template_engine();
        match self.check_http(ctx, phase, body, templates).await? {
            None => Ok(HttpOutcome::Continue),
            Some(failure) => Ok(HttpOutcome::Interrupt(failure)),
        }
    }

    async fn check_message(
        &self,
        ctx: &dyn ExecutionContext,
        phase: HttpPhase,
        message: Message,
    ) -> Result<MessageOutcome> {
        let namespace = MessageNamespace::for_message(&message);
        let templates = ctx.message_template_engine(&namespace);
        let failure = self
            .check_http(ctx, phase, message.content(), templates.as_ref())
            .await?;
        match failure {
            None => Ok(MessageOutcome::Forward(message)),
            Some(failure) => Ok(MessageOutcome::Interrupt(failure)),
        }
    }

    /// Resolve, validate and build the failure for an HTTP phase.
    ///
    /// `None` means the payload goes through, either because it is valid or
    /// because straight-respond mode lets it pass.
    async fn check_http(
        &self,
        ctx: &dyn ExecutionContext,
        phase: HttpPhase,
        payload: &[u8],
        templates: &dyn TemplateEngine,
    ) -> Result<Option<ExecutionFailure>> {
        let scope = ResolutionScope::new(ctx.resources(), templates);
        let Verdict::Invalid(violation) = self.evaluate(scope, payload).await else {
            return Ok(None);
        };

        ctx.metrics().set_error_message(&violation.detail);
        if self.straight_respond(phase) && !violation.unresolved {
            tracing::debug!(%phase, "straight respond mode, letting invalid payload through");
            return Ok(None);
        }

        let failure = self.failures.build(phase, violation.kind, templates).await?;
        Ok(Some(failure))
    }

    async fn check_kafka(&self, ctx: &dyn ExecutionContext, message: &KafkaMessage) -> Verdict {
        let namespace = MessageNamespace::for_kafka(message);
        let templates = ctx.message_template_engine(&namespace);
        let scope = ResolutionScope::new(ctx.resources(), templates.as_ref());
        let verdict = self.evaluate(scope, message.content()).await;
        if let Verdict::Invalid(violation) = &verdict {
            tracing::debug!(
                record = %message.coordinates(),
                kind = ?violation.kind,
                "invalid kafka record"
            );
            ctx.metrics().set_error_message(&violation.detail);
        }
        verdict
    }

    /// Resolve the schema and validate `payload` against it.
    ///
    /// Every failure ends up in the verdict; nothing is raised. A schema that
    /// cannot be resolved yields an unresolved violation.
    pub(crate) async fn evaluate(&self, scope: ResolutionScope<'_>, payload: &[u8]) -> Verdict {
        let schema = match self.resolver.resolve(scope).await {
            Ok(schema) => schema,
            Err(err) => return Verdict::Invalid(Violation::unresolved(err.to_string())),
        };

        match self.engine.validate(&schema, payload) {
            Ok(report) if report.is_success() => Verdict::Valid,
            Ok(report) => {
                tracing::debug!(%report, "invalid payload");
                Verdict::Invalid(Violation::payload(report.to_string()))
            }
            Err(err) => {
                tracing::debug!(
                    schema = schema.id(),
                    error = %err,
                    "payload could not be validated"
                );
                Verdict::Invalid(Violation::format(err.to_string()))
            }
        }
    }

    /// Run `work` unless the event is cancelled first.
    pub(crate) async fn guarded<T>(
        &self,
        ctx: &dyn ExecutionContext,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let cancellation = ctx.cancellation();
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(PolicyError::Cancelled),
            result = work => result,
        }
    }
}

fn source_kind(resolver: &SchemaResolver) -> &'static str {
    match resolver {
        SchemaResolver::Static(_) => "static",
        SchemaResolver::Registry(_) => "registry",
    }
}
