//! JSON Schema validation for gateway traffic.
//!
//! jsonguard validates HTTP bodies, streamed messages and Kafka records
//! against a JSON Schema and reports refused payloads in terms each
//! transport understands.
//!
//! # Crate Structure
//!
//! - [`schema`]: schema sources, registries, resolution and validation
//! - [`kafka`]: the produce/fetch model the broker phases rewrite
//! - [`policy`]: configuration, phases and the validation policy itself

/// Re-export schema types.
pub mod schema {
    pub use jsonguard_schema::*;
}

/// Re-export Kafka wire model types.
pub mod kafka {
    pub use jsonguard_kafka::*;
}

/// Re-export policy types.
pub mod policy {
    pub use jsonguard_policy::*;
}

pub use jsonguard_policy::{JsonValidationPolicy, PolicyConfiguration, PolicyError};
