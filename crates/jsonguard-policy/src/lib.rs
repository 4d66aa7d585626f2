//! JSON Schema validation policy for gateway phases.
//!
//! One [`JsonValidationPolicy`] serves every phase a gateway runs it in:
//! plain HTTP request and response bodies, buffered content, message streams
//! and Kafka produce/fetch records. Each phase resolves a schema, validates
//! the payload and reports refused payloads in the phase's own terms.

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod failure;
pub mod handler;
pub mod message;
pub mod phase;
pub mod policy;

pub use config::{
    NativeErrorHandling, PolicyConfiguration, PolicyScope, PublishErrorHandling, PublishStrategy,
    SubscribeErrorHandling, SubscribeStrategy,
};
pub use content::{BufferedBody, ContentOutcome};
pub use context::{ExecutionContext, LocalContext, MetricsSink, RecordingMetrics};
pub use error::{PolicyError, Result};
pub use failure::{
    default_message, ExecutionFailure, FailureKind, Violation, APPLICATION_JSON, BAD_REQUEST,
    INTERNAL_ERROR, TEXT_PLAIN,
};
pub use handler::{FailureBuilder, PublishHandler, SubscribeAction, SubscribeHandler};
pub use message::{Message, MessageNamespace};
pub use phase::HttpPhase;
pub use policy::{
    HttpOutcome, JsonValidationPolicy, MessageOutcome, PublishOutcome, SubscribeOutcome, POLICY_ID,
};
