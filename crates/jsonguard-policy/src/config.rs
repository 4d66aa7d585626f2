use jsonguard_schema::{SchemaSource, ValidationOptions};
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};

/// Which buffered content surface is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyScope {
    #[default]
    RequestContent,
    ResponseContent,
}

/// How a rejected produced record is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishStrategy {
    #[default]
    FailWithInvalidRecord,
}

/// How a rejected fetched record is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscribeStrategy {
    InvalidatePartition,
    AddRecordHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishErrorHandling {
    #[serde(default)]
    pub strategy: PublishStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeErrorHandling {
    pub strategy: SubscribeStrategy,
    /// Header added to a rejected record by [`SubscribeStrategy::AddRecordHeader`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
}

/// Kafka-native error handling, one entry per broker phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeErrorHandling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_publish: Option<PublishErrorHandling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_subscribe: Option<SubscribeErrorHandling>,
}

/// Policy configuration as supplied by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_source: Option<SchemaSource>,
    /// Inline schema used when `schema_source` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub validate_unchecked: bool,
    pub deep_check: bool,
    pub straight_respond_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_error_handling: Option<NativeErrorHandling>,
    pub scope: PolicyScope,
}

impl PolicyConfiguration {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Configuration with an inline schema and every option at its default.
    pub fn with_static_schema(schema: impl Into<String>) -> Self {
        Self {
            schema_source: Some(SchemaSource::inline(schema)),
            ..Self::default()
        }
    }

    /// The effective schema source, falling back to the legacy `schema` field.
    pub fn effective_schema_source(&self) -> Result<SchemaSource> {
        if let Some(source) = &self.schema_source {
            return Ok(source.clone());
        }
        match &self.schema {
            Some(schema) => Ok(SchemaSource::inline(schema.clone())),
            None => Err(PolicyError::Configuration(
                "no schema source configured".to_string(),
            )),
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            unchecked: self.validate_unchecked,
            deep_check: self.deep_check,
        }
    }

    /// The error-message expression, if one is set and not empty.
    pub fn error_message_template(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .filter(|message| !message.is_empty())
    }

    pub fn on_publish(&self) -> Option<&PublishErrorHandling> {
        self.native_error_handling
            .as_ref()
            .and_then(|handling| handling.on_publish.as_ref())
    }

    pub fn on_subscribe(&self) -> Option<&SubscribeErrorHandling> {
        self.native_error_handling
            .as_ref()
            .and_then(|handling| handling.on_subscribe.as_ref())
    }
}
