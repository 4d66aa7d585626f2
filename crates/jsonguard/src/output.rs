use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use jsonguard_policy::{ExecutionFailure, FailureKind};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// How a checked payload fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    /// Refused; the phase interrupted.
    Fail,
    /// Refused but delivered with a marker.
    Flagged,
    /// The phase is inactive for the configured scope.
    Skipped,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Flagged => "flagged",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PartitionReport {
    pub topic: String,
    pub partition: i32,
    pub error_code: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub phase: &'static str,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
    /// Diagnostics recorded for a refused payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionReport>,
}

impl CheckReport {
    pub fn new(phase: &'static str, verdict: Verdict) -> Self {
        Self {
            phase,
            verdict,
            kind: None,
            failure: None,
            detail: None,
            partitions: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LintReport {
    pub valid: bool,
    pub source: &'static str,
    pub scope: &'static str,
    pub on_publish: bool,
    pub on_subscribe: bool,
}

pub fn print_check(report: &CheckReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PHASE", "VERDICT", "STATUS", "KEY", "MESSAGE"])
                .add_row(vec![
                    report.phase.to_string(),
                    report.verdict.as_str().to_string(),
                    report
                        .failure
                        .as_ref()
                        .map(|failure| failure.status_code.to_string())
                        .unwrap_or_default(),
                    report
                        .failure
                        .as_ref()
                        .map(|failure| failure.key.clone())
                        .unwrap_or_default(),
                    report
                        .failure
                        .as_ref()
                        .map(|failure| failure.message.clone())
                        .unwrap_or_default(),
                ]);
            println!("{table}");

            if !report.partitions.is_empty() {
                let mut partitions = Table::new();
                partitions
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["TOPIC", "PARTITION", "ERROR", "MESSAGE"]);
                for partition in &report.partitions {
                    partitions.add_row(vec![
                        partition.topic.clone(),
                        partition.partition.to_string(),
                        partition.error_code.to_string(),
                        partition.error_message.clone().unwrap_or_default(),
                    ]);
                }
                println!("{partitions}");
            }
            if let Some(detail) = &report.detail {
                println!("{detail}");
            }
        }
        OutputFormat::Pretty => {
            print!("phase={} verdict={}", report.phase, report.verdict.as_str());
            if let Some(failure) = &report.failure {
                print!(
                    " status={} key={} message={:?}",
                    failure.status_code, failure.key, failure.message
                );
            }
            println!();
            for partition in &report.partitions {
                println!(
                    "  {}-{} error={} {}",
                    partition.topic,
                    partition.partition,
                    partition.error_code,
                    partition.error_message.as_deref().unwrap_or("")
                );
            }
            if let Some(detail) = &report.detail {
                println!("  {detail}");
            }
        }
    }
}

pub fn print_lint(report: &LintReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "SCOPE", "ON_PUBLISH", "ON_SUBSCRIBE"])
                .add_row(vec![
                    report.source.to_string(),
                    report.scope.to_string(),
                    report.on_publish.to_string(),
                    report.on_subscribe.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "configuration ok: source={} scope={} on_publish={} on_subscribe={}",
                report.source, report.scope, report.on_publish, report.on_subscribe
            );
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
