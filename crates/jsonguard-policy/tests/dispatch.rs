use std::sync::Arc;

use bytes::Bytes;
use jsonguard_kafka::{
    ErrorCode, FetchResponse, FetchableTopicResponse, KafkaMessage, MemoryRecords, PartitionData,
    PartitionProduceData, ProduceRequest, Record, TopicProduceData,
};
use jsonguard_policy::{
    ExecutionFailure, FailureKind, HttpOutcome, JsonValidationPolicy, LocalContext, Message,
    MessageOutcome, NativeErrorHandling, PolicyConfiguration, PolicyError, PublishErrorHandling,
    PublishOutcome, SubscribeErrorHandling, SubscribeOutcome, SubscribeStrategy,
};
use jsonguard_schema::{AttributeTemplateEngine, InMemorySchemaRegistry, ResourceMap, SchemaSource};

const PERSON_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["name"],
    "properties": { "name": { "type": "string" } }
}"#;

fn static_policy() -> JsonValidationPolicy {
    let config = PolicyConfiguration::with_static_schema(PERSON_SCHEMA);
    JsonValidationPolicy::new(config).unwrap()
}

fn registry_context() -> LocalContext {
    let mut registry = InMemorySchemaRegistry::new();
    registry.register_content("orders-value", PERSON_SCHEMA);
    registry.register_content("broken-value", "{not a schema");
    let resources = ResourceMap::new().with_registry("registry", Arc::new(registry));
    LocalContext::new().with_resources(resources)
}

/// Policy resolving `<subject attribute>-value` from the registry.
fn subject_policy(straight_respond_mode: bool) -> JsonValidationPolicy {
    let mapping = "{message.attribute.subject}-value";
    JsonValidationPolicy::new(PolicyConfiguration {
        schema_source: Some(SchemaSource::registry("registry", mapping)),
        straight_respond_mode,
        ..PolicyConfiguration::default()
    })
    .unwrap()
}

fn subject_message(payload: &[u8], subject: &str) -> Message {
    Message::new(Bytes::copy_from_slice(payload)).with_attribute("subject", subject)
}

fn registry_config(native: Option<NativeErrorHandling>) -> PolicyConfiguration {
    PolicyConfiguration {
        schema_source: Some(SchemaSource::registry("registry", "{message.topic}-value")),
        native_error_handling: native,
        ..PolicyConfiguration::default()
    }
}

fn interrupt(outcome: HttpOutcome) -> ExecutionFailure {
    match outcome {
        HttpOutcome::Interrupt(failure) => failure,
        HttpOutcome::Continue => panic!("expected interrupt"),
    }
}

fn records(offsets: &[i64]) -> MemoryRecords {
    let records: Vec<Record> = offsets
        .iter()
        .map(|offset| Record::new(*offset, Bytes::from_static(br#"{"name":"ok"}"#)))
        .collect();
    MemoryRecords::from_records(&records).unwrap()
}

#[tokio::test]
async fn request_scenario() {
    let policy = static_policy();
    let ctx = LocalContext::new();

    let outcome = policy
        .on_request(&ctx, &Bytes::from_static(br#"{"name":"foo"}"#))
        .await
        .unwrap();
    assert_eq!(outcome, HttpOutcome::Continue);

    let failure = interrupt(
        policy
            .on_request(&ctx, &Bytes::from_static(br#"{"name":1}"#))
            .await
            .unwrap(),
    );
    assert_eq!(failure.status_code, 400);
    assert_eq!(failure.key, "JSON_INVALID_PAYLOAD");
    assert_eq!(failure.message, "Bad Request");
    assert_eq!(failure.content_type, "application/json");

    let failure = interrupt(
        policy
            .on_request(&ctx, &Bytes::from_static(b"not json"))
            .await
            .unwrap(),
    );
    assert_eq!(failure.key, "JSON_INVALID_FORMAT");
}

#[tokio::test]
async fn response_scenario() {
    let policy = static_policy();
    let ctx = LocalContext::new();

    let failure = interrupt(
        policy
            .on_response(&ctx, &Bytes::from_static(br#"{"name":1}"#))
            .await
            .unwrap(),
    );
    assert_eq!(failure.status_code, 500);
    assert_eq!(failure.key, "JSON_INVALID_RESPONSE_PAYLOAD");
    assert_eq!(failure.message, "Internal Error");

    let failure = interrupt(
        policy
            .on_response(&ctx, &Bytes::from_static(b"not json"))
            .await
            .unwrap(),
    );
    assert_eq!(failure.key, "JSON_INVALID_RESPONSE_FORMAT");
}

#[tokio::test]
async fn error_message_is_rendered_from_request_attributes() {
    let mut config = PolicyConfiguration::with_static_schema(PERSON_SCHEMA);
    config.error_message = Some("invalid payload for {request.path}".to_string());
    let policy = JsonValidationPolicy::new(config).unwrap();
    let templates = AttributeTemplateEngine::new().with_attribute("request.path", "/people");
    let ctx = LocalContext::new().with_templates(templates);

    let failure = interrupt(
        policy
            .on_request(&ctx, &Bytes::from_static(b"{}"))
            .await
            .unwrap(),
    );
    assert_eq!(failure.message, "invalid payload for /people");
}

#[tokio::test]
async fn malformed_registry_schema_fails_with_format_key() {
    let policy = subject_policy(false);
    let ctx = registry_context();

    for payload in [&br#"{"name":"foo"}"#[..], &b"not json"[..]] {
        let message = subject_message(payload, "broken");
        let outcome = policy.on_message_response(&ctx, message).await.unwrap();
        let MessageOutcome::Interrupt(failure) = outcome else {
            panic!("expected interrupt");
        };
        assert_eq!(failure.key, "JSON_INVALID_MESSAGE_RESPONSE_FORMAT");
        assert_eq!(failure.status_code, 400);
    }
}

#[tokio::test]
async fn unresolved_registry_schema_fails_with_format_key() {
    let policy = subject_policy(false);
    let ctx = registry_context();

    let message = subject_message(br#"{"name":"foo"}"#, "orders");
    let outcome = policy
        .on_message_request(&ctx, message.clone())
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Forward(message));

    let message = subject_message(br#"{"name":"foo"}"#, "unknown");
    let outcome = policy.on_message_request(&ctx, message).await.unwrap();
    let MessageOutcome::Interrupt(failure) = outcome else {
        panic!("expected interrupt");
    };
    assert_eq!(failure.key, "JSON_INVALID_MESSAGE_REQUEST_FORMAT");
    assert!(ctx
        .recorded_error_message()
        .unwrap()
        .contains("unknown-value"));
}

#[tokio::test]
async fn straight_respond_lets_message_responses_through() {
    let mut config = PolicyConfiguration::with_static_schema(PERSON_SCHEMA);
    config.straight_respond_mode = true;
    let policy = JsonValidationPolicy::new(config).unwrap();
    let ctx = LocalContext::new();

    let message = Message::new(Bytes::from_static(br#"{"name":1}"#));
    let outcome = policy
        .on_message_response(&ctx, message.clone())
        .await
        .unwrap();
    assert_eq!(outcome, MessageOutcome::Forward(message));
}

#[tokio::test]
async fn straight_respond_still_blocks_unresolved_schemas() {
    let policy = JsonValidationPolicy::new(PolicyConfiguration {
        schema_source: Some(SchemaSource::registry("missing-registry", "{topic}")),
        straight_respond_mode: true,
        ..PolicyConfiguration::default()
    })
    .unwrap();
    let ctx = LocalContext::new();

    let failure = interrupt(
        policy
            .on_response(&ctx, &Bytes::from_static(br#"{"name":"foo"}"#))
            .await
            .unwrap(),
    );
    assert_eq!(failure.status_code, 500);
    assert_eq!(failure.key, "JSON_INVALID_RESPONSE_FORMAT");
    assert!(ctx
        .recorded_error_message()
        .unwrap()
        .contains("missing-registry"));

    let policy = subject_policy(true);
    let ctx = registry_context();
    let message = subject_message(br#"{"name":"foo"}"#, "unknown");
    let outcome = policy.on_message_response(&ctx, message).await.unwrap();
    let MessageOutcome::Interrupt(failure) = outcome else {
        panic!("expected interrupt");
    };
    assert_eq!(failure.key, "JSON_INVALID_MESSAGE_RESPONSE_FORMAT");
}

#[tokio::test]
async fn straight_respond_forwards_unparseable_responses() {
    let mut config = PolicyConfiguration::with_static_schema(PERSON_SCHEMA);
    config.straight_respond_mode = true;
    let policy = JsonValidationPolicy::new(config).unwrap();
    let ctx = LocalContext::new();

    let outcome = policy
        .on_response(&ctx, &Bytes::from_static(b"not json"))
        .await
        .unwrap();
    assert_eq!(outcome, HttpOutcome::Continue);
    assert!(ctx.recorded_error_message().is_some());
}

#[tokio::test]
async fn unchecked_validation_reports_every_violation() {
    let schema = r#"{
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": { "type": "string" },
            "age": { "type": "integer" }
        }
    }"#;
    let payload = Bytes::from_static(br#"{"name":1,"age":"x"}"#);

    let config = PolicyConfiguration::with_static_schema(schema);
    let strict = JsonValidationPolicy::new(config).unwrap();
    let ctx = LocalContext::new();
    interrupt(strict.on_request(&ctx, &payload).await.unwrap());
    let detail = ctx.recorded_error_message().unwrap();
    assert!(detail.contains("1 more violation(s) not reported"));

    let mut config = PolicyConfiguration::with_static_schema(schema);
    config.validate_unchecked = true;
    let unchecked = JsonValidationPolicy::new(config).unwrap();
    let ctx = LocalContext::new();
    let failure = interrupt(unchecked.on_request(&ctx, &payload).await.unwrap());
    assert_eq!(failure.key, "JSON_INVALID_PAYLOAD");
    let detail = ctx.recorded_error_message().unwrap();
    assert!(!detail.contains("not reported"));
    assert!(detail.contains("\"x\""));
    assert!(detail.contains("1 is not of type"));
}

#[tokio::test]
async fn publish_failure_points_at_failing_partition() {
    let policy = JsonValidationPolicy::new(registry_config(Some(NativeErrorHandling {
        on_publish: Some(PublishErrorHandling::default()),
        on_subscribe: None,
    })))
    .unwrap();
    let ctx = registry_context();
    let request = ProduceRequest::new(vec![TopicProduceData {
        name: "orders".to_string(),
        partition_data: vec![
            PartitionProduceData {
                index: 0,
                records: records(&[0, 1]),
            },
            PartitionProduceData {
                index: 1,
                records: records(&[4]),
            },
        ],
    }]);

    let valid = KafkaMessage::new("orders", 0, 1, Bytes::from_static(br#"{"name":"ok"}"#));
    let outcome = policy
        .on_kafka_publish(&ctx, &request, valid.clone())
        .await
        .unwrap();
    assert_eq!(outcome, PublishOutcome::Accept(valid));

    let invalid = KafkaMessage::new("orders", 1, 4, Bytes::from_static(br#"{"name":false}"#));
    let outcome = policy
        .on_kafka_publish(&ctx, &request, invalid)
        .await
        .unwrap();
    let PublishOutcome::Interrupt { response, kind } = outcome else {
        panic!("expected interrupt");
    };
    assert_eq!(kind, FailureKind::Payload);

    let failing = response.partition("orders", 1).unwrap();
    assert_eq!(failing.error_code, ErrorCode::INVALID_RECORD);
    assert_eq!(
        failing.error_message.as_deref(),
        Some("Partition contains invalid record(s) at offset: 4")
    );
    let sibling = response.partition("orders", 0).unwrap();
    assert_eq!(sibling.error_code, ErrorCode::INVALID_RECORD);
    assert_eq!(
        sibling.error_message.as_deref(),
        Some("Another partition contains invalid record(s)")
    );
}

#[tokio::test]
async fn unparseable_record_reports_format_kind() {
    let policy = JsonValidationPolicy::new(registry_config(Some(NativeErrorHandling {
        on_publish: Some(PublishErrorHandling::default()),
        on_subscribe: None,
    })))
    .unwrap();
    let ctx = registry_context();
    let request = ProduceRequest::new(vec![TopicProduceData {
        name: "orders".to_string(),
        partition_data: vec![PartitionProduceData {
            index: 0,
            records: records(&[9]),
        }],
    }]);

    let message = KafkaMessage::new("orders", 0, 9, Bytes::from_static(b"\x00binary"));
    let outcome = policy
        .on_kafka_publish(&ctx, &request, message)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        PublishOutcome::Interrupt {
            kind: FailureKind::Format,
            ..
        }
    ));
}

#[tokio::test]
async fn subscribe_invalidates_only_the_failing_partition() {
    let policy = JsonValidationPolicy::new(registry_config(Some(NativeErrorHandling {
        on_publish: None,
        on_subscribe: Some(SubscribeErrorHandling {
            strategy: SubscribeStrategy::InvalidatePartition,
            header_name: None,
        }),
    })))
    .unwrap();
    let ctx = registry_context();
    let mut response = FetchResponse::new(vec![FetchableTopicResponse {
        topic: "orders".to_string(),
        partitions: vec![
            PartitionData::new(0, records(&[0])),
            PartitionData::new(1, records(&[0, 1])),
        ],
    }]);

    let message = KafkaMessage::new("orders", 0, 0, Bytes::from_static(br#"{"other":true}"#));
    let outcome = policy
        .on_kafka_subscribe(&ctx, &mut response, message)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubscribeOutcome::Interrupt {
            kind: FailureKind::Payload
        }
    );
    assert_eq!(response.error_code, ErrorCode::CORRUPT_MESSAGE);

    let failing = response.partition("orders", 0).unwrap();
    assert_eq!(failing.error_code, ErrorCode::CORRUPT_MESSAGE);
    assert!(failing.records.is_empty());

    let sibling = response.partition("orders", 1).unwrap();
    assert_eq!(sibling.error_code, ErrorCode::NONE);
    assert_eq!(sibling.records.records().unwrap().len(), 2);
}

#[tokio::test]
async fn subscribe_add_header_marks_only_that_record() {
    let policy = JsonValidationPolicy::new(registry_config(Some(NativeErrorHandling {
        on_publish: None,
        on_subscribe: Some(SubscribeErrorHandling {
            strategy: SubscribeStrategy::AddRecordHeader,
            header_name: Some("X-Json-Invalid".to_string()),
        }),
    })))
    .unwrap();
    let ctx = registry_context();
    let mut response = FetchResponse::new(vec![FetchableTopicResponse {
        topic: "orders".to_string(),
        partitions: vec![PartitionData::new(0, records(&[0, 1]))],
    }]);
    let untouched = response.clone();

    let valid = KafkaMessage::new("orders", 0, 0, Bytes::from_static(br#"{"name":"ok"}"#));
    let outcome = policy
        .on_kafka_subscribe(&ctx, &mut response, valid)
        .await
        .unwrap();
    let SubscribeOutcome::Accept(valid) = outcome else {
        panic!("expected accept");
    };
    assert!(valid.header("X-Json-Invalid").is_none());

    let invalid = KafkaMessage::new("orders", 0, 1, Bytes::from_static(b"[]"));
    let outcome = policy
        .on_kafka_subscribe(&ctx, &mut response, invalid)
        .await
        .unwrap();
    let SubscribeOutcome::Accept(invalid) = outcome else {
        panic!("expected accept");
    };
    assert!(invalid.header("X-Json-Invalid").is_some());
    assert_eq!(response, untouched);
}

#[test]
fn add_header_strategy_without_name_is_refused_at_construction() {
    let result = JsonValidationPolicy::new(registry_config(Some(NativeErrorHandling {
        on_publish: None,
        on_subscribe: Some(SubscribeErrorHandling {
            strategy: SubscribeStrategy::AddRecordHeader,
            header_name: None,
        }),
    })));
    assert!(matches!(result, Err(PolicyError::Configuration(_))));
}
