use std::sync::Arc;

use crate::config::SchemaSource;
use crate::error::{Result, SchemaError};
use crate::registry::ResourceManager;
use crate::schema::Schema;
use crate::template::TemplateEngine;

/// Collaborators visible to schema resolution for one event.
///
/// `templates` is the namespace of the event being validated: the request
/// for plain HTTP, the message for message and broker phases.
#[derive(Clone, Copy)]
pub struct ResolutionScope<'a> {
    pub resources: &'a dyn ResourceManager,
    pub templates: &'a dyn TemplateEngine,
}

impl<'a> ResolutionScope<'a> {
    pub fn new(resources: &'a dyn ResourceManager, templates: &'a dyn TemplateEngine) -> Self {
        Self {
            resources,
            templates,
        }
    }
}

/// Produces the schema a payload is validated against.
#[derive(Debug, Clone)]
pub enum SchemaResolver {
    Static(StaticSchemaResolver),
    Registry(RegistrySchemaResolver),
}

impl SchemaResolver {
    /// Build the resolver described by a schema source.
    ///
    /// Inline schema text is parsed here and rejected if it is not JSON.
    pub fn from_source(source: &SchemaSource) -> Result<Self> {
        match source {
            SchemaSource::StaticSchema { static_schema } => {
                StaticSchemaResolver::new(static_schema.clone()).map(Self::Static)
            }
            SchemaSource::SchemaRegistryResource {
                resource_name,
                schema_mapping,
            } => RegistrySchemaResolver::new(resource_name.clone(), schema_mapping.clone())
                .map(Self::Registry),
        }
    }

    /// Resolve the schema for one event.
    pub async fn resolve(&self, scope: ResolutionScope<'_>) -> Result<Arc<Schema>> {
        match self {
            Self::Static(resolver) => Ok(resolver.resolve()),
            Self::Registry(resolver) => resolver.resolve(scope).await,
        }
    }
}

/// Serves one inline schema, parsed at construction.
#[derive(Debug, Clone)]
pub struct StaticSchemaResolver {
    schema: Arc<Schema>,
}

impl StaticSchemaResolver {
    pub fn new(content: impl Into<String>) -> Result<Self> {
        let schema = Schema::parse_static(content)?;
        Ok(Self {
            schema: Arc::new(schema),
        })
    }

    pub fn resolve(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }
}

/// Looks schemas up in a registry resource under a computed name.
#[derive(Debug, Clone)]
pub struct RegistrySchemaResolver {
    resource_name: String,
    schema_mapping: String,
}

impl RegistrySchemaResolver {
    pub fn new(
        resource_name: impl Into<String>,
        schema_mapping: impl Into<String>,
    ) -> Result<Self> {
        let resource_name = resource_name.into();
        let schema_mapping = schema_mapping.into();
        if resource_name.trim().is_empty() {
            return Err(SchemaError::InvalidSource(
                "registry resource name is empty".to_string(),
            ));
        }
        if schema_mapping.trim().is_empty() {
            return Err(SchemaError::InvalidSource(
                "schema mapping expression is empty".to_string(),
            ));
        }
        Ok(Self {
            resource_name,
            schema_mapping,
        })
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn schema_mapping(&self) -> &str {
        &self.schema_mapping
    }

    pub async fn resolve(&self, scope: ResolutionScope<'_>) -> Result<Arc<Schema>> {
        self.lookup(scope).await.inspect_err(|err| {
            tracing::error!(
                resource = %self.resource_name,
                mapping = %self.schema_mapping,
                error = %err,
                "unable to resolve schema"
            );
        })
    }

    async fn lookup(&self, scope: ResolutionScope<'_>) -> Result<Arc<Schema>> {
        let registry = scope
            .resources
            .schema_registry(&self.resource_name)
            .ok_or_else(|| SchemaError::ResourceNotFound(self.resource_name.clone()))?;

        let name = match scope.templates.eval(&self.schema_mapping).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                return Err(SchemaError::NameUnresolved(format!(
                    "'{}' produced no value",
                    self.schema_mapping
                )));
            }
            Err(err) => return Err(SchemaError::NameUnresolved(err.to_string())),
        };

        let schema = registry.get_schema(&name).await.map_err(|err| match err {
            err if err.is_unresolved() => err,
            other => SchemaError::Registry(other.to_string()),
        })?;

        schema.ok_or(SchemaError::SchemaNotFound(name))
    }
}
