//! Buffered request and response content phases.
//!
//! The body arrives as a stream of chunks. It is accumulated, validated once
//! and then either written back or replaced by a failure.

use std::pin::pin;

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use jsonguard_schema::ResolutionScope;

use crate::config::PolicyScope;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::failure::ExecutionFailure;
use crate::phase::HttpPhase;
use crate::policy::{JsonValidationPolicy, Verdict};

/// Accumulates body chunks until the body is complete.
#[derive(Debug, Default)]
pub struct BufferedBody {
    buffer: BytesMut,
}

impl BufferedBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drain `chunks` into a new buffer.
    pub async fn collect<S>(chunks: S) -> Self
    where
        S: Stream<Item = Bytes>,
    {
        let mut chunks = pin!(chunks);
        let mut body = Self::new();
        while let Some(chunk) = chunks.next().await {
            body.push(&chunk);
        }
        body
    }

    /// The complete body. Consumes the buffer.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

/// Result of a buffered content phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOutcome {
    /// The phase is not active for the configured scope; the body was not read.
    Skipped,
    /// Write the body back unchanged.
    Forward(Bytes),
    /// Replace the body with a failure.
    Fail(ExecutionFailure),
}

impl JsonValidationPolicy {
    /// Buffer and validate a request body.
    ///
    /// Active unless the scope is [`PolicyScope::ResponseContent`].
    pub async fn on_request_content<S>(
        &self,
        ctx: &dyn ExecutionContext,
        chunks: S,
    ) -> Result<ContentOutcome>
    where
        S: Stream<Item = Bytes>,
    {
        if self.scope() != PolicyScope::RequestContent {
            return Ok(ContentOutcome::Skipped);
        }
        self.guarded(ctx, self.check_content(ctx, HttpPhase::Request, chunks))
            .await
    }

    /// Buffer and validate a response body.
    ///
    /// Only active with [`PolicyScope::ResponseContent`].
    pub async fn on_response_content<S>(
        &self,
        ctx: &dyn ExecutionContext,
        chunks: S,
    ) -> Result<ContentOutcome>
    where
        S: Stream<Item = Bytes>,
    {
        if self.scope() != PolicyScope::ResponseContent {
            return Ok(ContentOutcome::Skipped);
        }
        self.guarded(ctx, self.check_content(ctx, HttpPhase::Response, chunks))
            .await
    }

    async fn check_content<S>(
        &self,
        ctx: &dyn ExecutionContext,
        phase: HttpPhase,
        chunks: S,
    ) -> Result<ContentOutcome>
    where
        S: Stream<Item = Bytes>,
    {
        let body = BufferedBody::collect(chunks).await.into_bytes();
        let templates = ctx.template_engine();
        let scope = ResolutionScope::new(ctx.resources(), templates);

        let Verdict::Invalid(violation) = self.evaluate(scope, &body).await else {
            return Ok(ContentOutcome::Forward(body));
        };

        ctx.metrics().set_error_message(&violation.detail);
        if self.straight_respond(phase) && !violation.unresolved {
            tracing::debug!(%phase, "straight respond mode, writing invalid body back");
            return Ok(ContentOutcome::Forward(body));
        }

        let failure = self
            .failures()
            .build_buffered(phase, violation.kind, templates)
            .await?;
        Ok(ContentOutcome::Fail(failure))
    }
}
