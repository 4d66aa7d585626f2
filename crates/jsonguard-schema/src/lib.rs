//! Schema resolution and JSON Schema validation for the jsonguard policy.
//!
//! A [`SchemaResolver`] produces the schema for one event, either from inline
//! text or from a named registry resource. A [`ValidationEngine`] checks a
//! payload against it and returns a [`ValidationReport`].

pub mod config;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod validator;

pub use config::{RegistryConfig, SchemaSource};
pub use error::{Result, SchemaError};
pub use registry::{InMemorySchemaRegistry, ResourceManager, ResourceMap, SchemaRegistryResource};
pub use resolver::{RegistrySchemaResolver, ResolutionScope, SchemaResolver, StaticSchemaResolver};
pub use schema::{Schema, SchemaReference};
pub use template::{AttributeTemplateEngine, TemplateEngine, TemplateError};
pub use validator::{ValidationEngine, ValidationOptions, ValidationReport};
