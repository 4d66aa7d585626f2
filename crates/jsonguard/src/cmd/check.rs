use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream;
use jsonguard_kafka::{
    FetchResponse, FetchableTopicResponse, KafkaMessage, MemoryRecords, PartitionData,
    PartitionProduceData, ProduceRequest, Record, TopicProduceData,
};
use jsonguard_policy::{
    ContentOutcome, ExecutionFailure, HttpOutcome, JsonValidationPolicy, LocalContext, Message,
    MessageOutcome, PublishOutcome, SubscribeOutcome,
};
use jsonguard_schema::{AttributeTemplateEngine, InMemorySchemaRegistry, ResourceMap};

use crate::cmd::{load_config, CheckArgs, Phase};
use crate::exit::{
    io_error, policy_error, schema_error, CliError, CliResult, DATA_INVALID, INTERNAL, SUCCESS,
    USAGE,
};
use crate::output::{print_check, CheckReport, OutputFormat, PartitionReport, Verdict};

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(&args.config)?;
    let policy =
        JsonValidationPolicy::new(config).map_err(|err| policy_error("invalid policy", err))?;
    let payload = Bytes::from(resolve_payload(&args)?);
    let attributes = parse_attributes(&args.attributes)?;
    let ctx = build_context(&args, &attributes)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;
    let mut report = runtime.block_on(dispatch(&policy, &ctx, &args, &attributes, payload))?;

    if report.verdict == Verdict::Pass && ctx.recorded_error_message().is_some() {
        report.verdict = Verdict::Flagged;
    }
    if report.verdict != Verdict::Pass {
        report.detail = ctx.recorded_error_message();
    }
    tracing::debug!(
        phase = report.phase,
        verdict = report.verdict.as_str(),
        "check complete"
    );

    print_check(&report, format);
    Ok(match report.verdict {
        Verdict::Fail => DATA_INVALID,
        _ => SUCCESS,
    })
}

async fn dispatch(
    policy: &JsonValidationPolicy,
    ctx: &LocalContext,
    args: &CheckArgs,
    attributes: &[(String, String)],
    payload: Bytes,
) -> CliResult<CheckReport> {
    let phase = args.phase.as_str();
    let failed = |err| policy_error(&format!("{phase} phase failed"), err);

    let report = match args.phase {
        Phase::Request | Phase::Response => {
            let outcome = if args.phase == Phase::Request {
                policy.on_request(ctx, &payload).await
            } else {
                policy.on_response(ctx, &payload).await
            }
            .map_err(failed)?;
            match outcome {
                HttpOutcome::Continue => CheckReport::new(phase, Verdict::Pass),
                HttpOutcome::Interrupt(failure) => failed_report(phase, failure),
            }
        }
        Phase::MessageRequest | Phase::MessageResponse => {
            let message = attributes
                .iter()
                .fold(Message::new(payload), |message, (name, value)| {
                    message.with_attribute(name.as_str(), value.as_str())
                });
            let outcome = if args.phase == Phase::MessageRequest {
                policy.on_message_request(ctx, message).await
            } else {
                policy.on_message_response(ctx, message).await
            }
            .map_err(failed)?;
            match outcome {
                MessageOutcome::Forward(_) => CheckReport::new(phase, Verdict::Pass),
                MessageOutcome::Interrupt(failure) => failed_report(phase, failure),
            }
        }
        Phase::RequestContent | Phase::ResponseContent => {
            let chunks = stream::iter(vec![payload]);
            let outcome = if args.phase == Phase::RequestContent {
                policy.on_request_content(ctx, chunks).await
            } else {
                policy.on_response_content(ctx, chunks).await
            }
            .map_err(failed)?;
            match outcome {
                ContentOutcome::Skipped => CheckReport::new(phase, Verdict::Skipped),
                ContentOutcome::Forward(_) => CheckReport::new(phase, Verdict::Pass),
                ContentOutcome::Fail(failure) => failed_report(phase, failure),
            }
        }
        Phase::Publish => {
            let request = ProduceRequest::new(vec![TopicProduceData {
                name: args.topic.clone(),
                partition_data: vec![PartitionProduceData {
                    index: args.partition,
                    records: single_record(args, payload)?,
                }],
            }]);
            let message = first_message(request.messages())?;
            match policy
                .on_kafka_publish(ctx, &request, message)
                .await
                .map_err(failed)?
            {
                PublishOutcome::Accept(_) => CheckReport::new(phase, Verdict::Pass),
                PublishOutcome::Interrupt { response, kind } => {
                    let mut report = CheckReport::new(phase, Verdict::Fail);
                    report.kind = Some(kind);
                    report.partitions = response
                        .responses
                        .iter()
                        .flat_map(|topic| {
                            topic
                                .partition_responses
                                .iter()
                                .map(move |partition| PartitionReport {
                                    topic: topic.name.clone(),
                                    partition: partition.index,
                                    error_code: partition.error_code.code(),
                                    error_message: partition.error_message.clone(),
                                })
                        })
                        .collect();
                    report
                }
            }
        }
        Phase::Subscribe => {
            let mut response = FetchResponse::new(vec![FetchableTopicResponse {
                topic: args.topic.clone(),
                partitions: vec![PartitionData::new(
                    args.partition,
                    single_record(args, payload)?,
                )],
            }]);
            let message = first_message(response.messages())?;
            match policy
                .on_kafka_subscribe(ctx, &mut response, message)
                .await
                .map_err(failed)?
            {
                SubscribeOutcome::Accept(_) => CheckReport::new(phase, Verdict::Pass),
                SubscribeOutcome::Interrupt { kind } => {
                    let mut report = CheckReport::new(phase, Verdict::Fail);
                    report.kind = Some(kind);
                    report.partitions = response
                        .responses
                        .iter()
                        .flat_map(|topic| {
                            topic.partitions.iter().map(move |partition| PartitionReport {
                                topic: topic.topic.clone(),
                                partition: partition.partition_index,
                                error_code: partition.error_code.code(),
                                error_message: None,
                            })
                        })
                        .collect();
                    report
                }
            }
        }
    };
    Ok(report)
}

fn failed_report(phase: &'static str, failure: ExecutionFailure) -> CheckReport {
    let mut report = CheckReport::new(phase, Verdict::Fail);
    report.failure = Some(failure);
    report
}

fn resolve_payload(args: &CheckArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::new(
        USAGE,
        "a payload is required: pass --json, --data or --file",
    ))
}

fn parse_attributes(raw: &[String]) -> CliResult<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(CliError::new(
                USAGE,
                format!("invalid attribute {entry:?}: expected NAME=VALUE"),
            )),
        })
        .collect()
}

fn build_context(args: &CheckArgs, attributes: &[(String, String)]) -> CliResult<LocalContext> {
    let templates = attributes
        .iter()
        .fold(AttributeTemplateEngine::new(), |engine, (name, value)| {
            engine.with_attribute(name.as_str(), value.as_str())
        });
    let mut ctx = LocalContext::new().with_templates(templates);

    if let Some(dir) = &args.registry_dir {
        let registry = InMemorySchemaRegistry::from_directory(dir)
            .map_err(|err| schema_error("failed to load registry", err))?;
        tracing::debug!(
            registry = %args.registry_name,
            subjects = registry.subjects().len(),
            "registry loaded"
        );
        ctx = ctx.with_resources(
            ResourceMap::new().with_registry(args.registry_name.clone(), Arc::new(registry)),
        );
    }
    Ok(ctx)
}

fn single_record(args: &CheckArgs, payload: Bytes) -> CliResult<MemoryRecords> {
    let record = Record::new(args.offset, payload);
    MemoryRecords::from_records([&record])
        .map_err(|err| CliError::new(USAGE, format!("payload cannot be framed as a record: {err}")))
}

fn first_message(
    messages: jsonguard_kafka::Result<Vec<KafkaMessage>>,
) -> CliResult<KafkaMessage> {
    messages
        .map_err(|err| CliError::new(INTERNAL, format!("failed to read records: {err}")))?
        .into_iter()
        .next()
        .ok_or_else(|| CliError::new(INTERNAL, "record batch is empty"))
}
