use jsonguard_policy::{JsonValidationPolicy, PolicyScope};
use jsonguard_schema::SchemaSource;

use crate::cmd::{load_config, LintArgs};
use crate::exit::{policy_error, CliResult, SUCCESS};
use crate::output::{print_lint, LintReport, OutputFormat};

pub fn run(args: LintArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(&args.config)?;
    let source = config
        .effective_schema_source()
        .map_err(|err| policy_error("invalid configuration", err))?;

    let report = LintReport {
        valid: true,
        source: match source {
            SchemaSource::StaticSchema { .. } => "static",
            SchemaSource::SchemaRegistryResource { .. } => "registry",
        },
        scope: match config.scope {
            PolicyScope::RequestContent => "REQUEST_CONTENT",
            PolicyScope::ResponseContent => "RESPONSE_CONTENT",
        },
        on_publish: config.on_publish().is_some(),
        on_subscribe: config.on_subscribe().is_some(),
    };

    JsonValidationPolicy::new(config).map_err(|err| policy_error("invalid configuration", err))?;
    tracing::debug!(source = report.source, "configuration accepted");

    print_lint(&report, format);
    Ok(SUCCESS)
}
