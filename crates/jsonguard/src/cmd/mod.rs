use clap::{Args, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use jsonguard_policy::PolicyConfiguration;

use crate::exit::{io_error, policy_error, CliResult};
use crate::output::OutputFormat;

pub mod check;
pub mod lint;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one payload through a policy phase.
    Check(CheckArgs),
    /// Validate a policy configuration file.
    Lint(LintArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Check(args) => check::run(args, format),
        Command::Lint(args) => lint::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Gateway phase a payload is checked in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    Request,
    Response,
    MessageRequest,
    MessageResponse,
    RequestContent,
    ResponseContent,
    Publish,
    Subscribe,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Request => "request",
            Phase::Response => "response",
            Phase::MessageRequest => "message-request",
            Phase::MessageResponse => "message-response",
            Phase::RequestContent => "request-content",
            Phase::ResponseContent => "response-content",
            Phase::Publish => "publish",
            Phase::Subscribe => "subscribe",
        }
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Policy configuration (JSON).
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,
    /// Phase to run the payload through.
    #[arg(long, value_enum)]
    pub phase: Phase,
    /// JSON payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Directory of `<subject>.schema.json` files served as a schema registry.
    #[arg(long, value_name = "DIR")]
    pub registry_dir: Option<PathBuf>,
    /// Resource name the registry directory is registered under.
    #[arg(long, default_value = "registry")]
    pub registry_name: String,
    /// Context attribute (`name=value`), repeatable.
    #[arg(long = "attr", value_name = "NAME=VALUE")]
    pub attributes: Vec<String>,
    /// Topic of the record for broker phases.
    #[arg(long, default_value = "topic")]
    pub topic: String,
    /// Partition of the record for broker phases.
    #[arg(long, default_value = "0")]
    pub partition: i32,
    /// Offset of the record for broker phases.
    #[arg(long, default_value = "0")]
    pub offset: i64,
}

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Policy configuration (JSON).
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Include build details.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_config(path: &Path) -> CliResult<PolicyConfiguration> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed to read {}", path.display()), err))?;
    PolicyConfiguration::from_json(&raw).map_err(|err| policy_error("invalid configuration", err))
}
