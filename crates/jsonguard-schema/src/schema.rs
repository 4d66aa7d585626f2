use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, SchemaError};

const STATIC_SCHEMA_ID: &str = "static";
const STATIC_SCHEMA_SUBJECT: &str = "static";
const STATIC_SCHEMA_VERSION: &str = "1";

/// Reference from one registry schema to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    pub name: String,
    pub subject: String,
    pub version: String,
}

/// A schema document together with its registry identity.
#[derive(Debug, Clone)]
pub struct Schema {
    id: String,
    subject: String,
    version: String,
    content: String,
    references: Vec<SchemaReference>,
    dependencies: BTreeMap<String, String>,
    document: Option<Value>,
}

impl Schema {
    /// A registry schema. Its content is parsed on every validation.
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        version: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            version: version.into(),
            content: content.into(),
            references: Vec::new(),
            dependencies: BTreeMap::new(),
            document: None,
        }
    }

    /// An inline schema. The content is parsed here, once.
    pub fn parse_static(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        let document: Value = serde_json::from_str(&content).map_err(SchemaError::InvalidSchema)?;
        let mut schema = Self::new(
            STATIC_SCHEMA_ID,
            STATIC_SCHEMA_SUBJECT,
            STATIC_SCHEMA_VERSION,
            content,
        );
        schema.document = Some(document);
        Ok(schema)
    }

    /// Attach references to other schemas.
    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }

    /// Attach named dependencies.
    pub fn with_dependencies(mut self, dependencies: BTreeMap<String, String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Raw schema text.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn references(&self) -> &[SchemaReference] {
        &self.references
    }

    pub fn dependencies(&self) -> &BTreeMap<String, String> {
        &self.dependencies
    }

    /// True for schemas parsed at construction time.
    pub fn is_static(&self) -> bool {
        self.document.is_some()
    }

    /// The parsed schema document.
    ///
    /// Static schemas return the document parsed at construction; registry
    /// schemas are parsed on each call and fail with
    /// [`SchemaError::InvalidSchema`] when the content is not JSON.
    pub fn document(&self) -> Result<Cow<'_, Value>> {
        match &self.document {
            Some(document) => Ok(Cow::Borrowed(document)),
            None => serde_json::from_str(&self.content)
                .map(Cow::Owned)
                .map_err(SchemaError::InvalidSchema),
        }
    }
}
