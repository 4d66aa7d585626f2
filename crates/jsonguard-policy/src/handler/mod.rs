//! Turning a refused payload into what the host does next.

pub mod http;
pub mod kafka;

pub use http::FailureBuilder;
pub use kafka::{PublishHandler, SubscribeAction, SubscribeHandler};
