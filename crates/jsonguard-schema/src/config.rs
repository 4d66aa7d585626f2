use serde::{Deserialize, Serialize};

/// Limits applied when loading registry schemas from a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas_from_directory: usize,
    /// Maximum bytes allowed per schema file loaded from a directory.
    pub max_schema_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_schemas_from_directory: 256,
            max_schema_file_size: 256 * 1024,
        }
    }
}

/// Where the schema for a validation comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sourceType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaSource {
    /// Inline schema text, parsed once.
    #[serde(rename_all = "camelCase")]
    StaticSchema { static_schema: String },

    /// Schema looked up in a registry resource by a computed name.
    #[serde(rename_all = "camelCase")]
    SchemaRegistryResource {
        resource_name: String,
        schema_mapping: String,
    },
}

impl SchemaSource {
    /// Inline schema source.
    pub fn inline(schema: impl Into<String>) -> Self {
        Self::StaticSchema {
            static_schema: schema.into(),
        }
    }

    /// Registry-backed schema source.
    pub fn registry(resource_name: impl Into<String>, schema_mapping: impl Into<String>) -> Self {
        Self::SchemaRegistryResource {
            resource_name: resource_name.into(),
            schema_mapping: schema_mapping.into(),
        }
    }
}
