//! Template evaluation seam.
//!
//! Hosts evaluate schema-mapping and error-message expressions against the
//! attributes of the current request or message. [`AttributeTemplateEngine`]
//! is a small placeholder interpolator for tools and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Errors raised by a template engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The expression could not be parsed.
    #[error("invalid expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// Evaluation failed inside the host engine.
    #[error("expression evaluation failed: {0}")]
    Evaluation(String),
}

/// Evaluates an expression against an event's attribute namespace.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Returns `Ok(None)` when the expression yields no value.
    async fn eval(&self, expression: &str) -> Result<Option<String>, TemplateError>;
}

/// Interpolates `{name}` placeholders from a fixed attribute map.
///
/// Unknown attributes render as empty text. An expression that renders to
/// an empty string yields `None`.
#[derive(Debug, Clone, Default)]
pub struct AttributeTemplateEngine {
    attributes: BTreeMap<String, String>,
}

impl AttributeTemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Copy of this engine with extra attributes layered on top.
    pub fn extended<'a>(&self, extra: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut attributes = self.attributes.clone();
        for (name, value) in extra {
            attributes.insert(name.to_string(), value.to_string());
        }
        Self { attributes }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Render an expression synchronously.
    pub fn render(&self, expression: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(expression.len());
        let mut rest = expression;
        let mut base = 0;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after
                .find('}')
                .ok_or_else(|| TemplateError::InvalidExpression {
                    expression: expression.to_string(),
                    reason: format!("unterminated placeholder at byte {}", base + start),
                })?;
            let name = after[..end].trim();
            if name.is_empty() {
                return Err(TemplateError::InvalidExpression {
                    expression: expression.to_string(),
                    reason: "empty placeholder".to_string(),
                });
            }
            if let Some(value) = self.attributes.get(name) {
                out.push_str(value);
            }
            let consumed = start + end + 2;
            base += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

#[async_trait]
impl TemplateEngine for AttributeTemplateEngine {
    async fn eval(&self, expression: &str) -> Result<Option<String>, TemplateError> {
        let rendered = self.render(expression)?;
        Ok((!rendered.is_empty()).then_some(rendered))
    }
}
