use std::fmt;
use std::io;

use jsonguard_policy::PolicyError;
use jsonguard_schema::SchemaError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
/// The payload was refused by a blocking phase.
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const CONFIG: i32 = 78;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn policy_error(context: &str, err: PolicyError) -> CliError {
    let code = match &err {
        err if err.is_configuration() => CONFIG,
        PolicyError::ErrorMessage(_) => CONFIG,
        PolicyError::Cancelled => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    let code = match &err {
        SchemaError::LoadFailed(_) | SchemaError::InvalidSource(_) => CONFIG,
        SchemaError::InvalidSchema(_) | SchemaError::CompileFailed(_) => CONFIG,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}
