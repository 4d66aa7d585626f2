mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "jsonguard",
    version,
    about = "Validate gateway payloads against a JSON validation policy"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_subcommand() {
        let cli = Cli::try_parse_from([
            "jsonguard",
            "check",
            "--config",
            "/tmp/policy.json",
            "--phase",
            "message-request",
            "--json",
            "{\"name\":\"x\"}",
            "--attr",
            "subject=orders",
        ])
        .expect("check args should parse");

        assert!(matches!(cli.command, Command::Check(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "jsonguard",
            "check",
            "--config",
            "/tmp/policy.json",
            "--phase",
            "request",
            "--json",
            "{\"x\":1}",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_lint_subcommand() {
        let cli = Cli::try_parse_from(["jsonguard", "lint", "--config", "/tmp/policy.json"])
            .expect("lint args should parse");
        assert!(matches!(cli.command, Command::Lint(_)));
    }
}
