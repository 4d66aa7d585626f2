use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::schema::Schema;

/// Controls how strictly a payload is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report a schema that fails to compile instead of raising an error,
    /// and collect every violation.
    pub unchecked: bool,
    /// Collect every violation, nested sub-schema failures included.
    pub deep_check: bool,
}

/// Outcome of validating one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    success: bool,
    schema_id: String,
    diagnostics: Vec<String>,
}

impl ValidationReport {
    fn passed(schema: &Schema) -> Self {
        Self {
            success: true,
            schema_id: schema.id().to_string(),
            diagnostics: Vec::new(),
        }
    }

    fn failed(schema: &Schema, diagnostics: Vec<String>) -> Self {
        Self {
            success: false,
            schema_id: schema.id().to_string(),
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Id of the schema the payload was checked against.
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return write!(f, "payload matches schema '{}'", self.schema_id);
        }
        write!(
            f,
            "payload violates schema '{}': {}",
            self.schema_id,
            self.diagnostics.join("; ")
        )
    }
}

/// Runs payloads against resolved schemas.
///
/// The compiled validator of a static schema is kept after its first
/// successful compilation; registry schemas are compiled per call.
#[derive(Default)]
pub struct ValidationEngine {
    options: ValidationOptions,
    static_validator: OnceLock<(String, Validator)>,
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("options", &self.options)
            .field("static_validator", &self.static_validator.get().is_some())
            .finish()
    }
}

impl ValidationEngine {
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            static_validator: OnceLock::new(),
        }
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Validate `payload` against `schema`.
    ///
    /// Returns an error only when either document is not JSON, when the
    /// schema does not compile in strict mode, or when the validator panics.
    /// Schema violations are reported, not raised.
    pub fn validate(&self, schema: &Schema, payload: &[u8]) -> Result<ValidationReport> {
        match std::panic::catch_unwind(AssertUnwindSafe(|| self.validate_inner(schema, payload))) {
            Ok(result) => result,
            Err(panic) => Err(SchemaError::Internal(panic_message(panic.as_ref()))),
        }
    }

    fn validate_inner(&self, schema: &Schema, payload: &[u8]) -> Result<ValidationReport> {
        let document = schema.document()?;
        let instance: Value = serde_json::from_slice(payload)?;

        if schema.is_static() {
            if let Some((content, validator)) = self.static_validator.get() {
                if content == schema.content() {
                    return Ok(self.check(schema, validator, &instance));
                }
            }
        }

        let validator = match jsonschema::validator_for(&document) {
            Ok(validator) => validator,
            Err(err) if self.options.unchecked => {
                tracing::debug!(schema = schema.id(), error = %err, "schema does not compile");
                return Ok(ValidationReport::failed(
                    schema,
                    vec![format!("invalid schema: {err}")],
                ));
            }
            Err(err) => return Err(SchemaError::CompileFailed(err.to_string())),
        };

        let report = self.check(schema, &validator, &instance);
        if schema.is_static() {
            let _ = self
                .static_validator
                .set((schema.content().to_string(), validator));
        }
        Ok(report)
    }

    fn check(&self, schema: &Schema, validator: &Validator, instance: &Value) -> ValidationReport {
        let mut errors = validator.iter_errors(instance);
        let Some(first) = errors.next() else {
            return ValidationReport::passed(schema);
        };

        let mut diagnostics = vec![first.to_string()];
        if self.options.unchecked || self.options.deep_check {
            diagnostics.extend(errors.map(|err| err.to_string()));
        } else {
            let omitted = errors.count();
            if omitted > 0 {
                diagnostics.push(format!("{omitted} more violation(s) not reported"));
            }
        }

        ValidationReport::failed(schema, diagnostics)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return message.clone();
    }
    "validator panicked".to_string()
}
