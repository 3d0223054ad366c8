//! Integration test harness that runs the configured pipeline end to end:
//! - Configuration file and schema files on disk
//! - Pipeline built from that configuration
//! - Tower layer in front of a `service_fn` handler
//!
//! This mirrors how a deployed function wires the two crates together.

use aws_lambda_events::sns::{SnsEvent, SnsMessage, SnsRecord};
use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use lambda_envelope::{ConfiguredSchema, Pipeline, PipelineConfig, PipelineError, Stage};
use lambda_envelope_tower::{EnvelopeValidationLayer, ValidatedEvent};
use lambda_runtime::{Context as LambdaContext, Error, LambdaEvent, service_fn};
use serde_json::{Value, json};
use serial_test::serial;
use std::convert::Infallible;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use tower::{Layer, ServiceExt};

const CONFIG_VARS: [&str; 5] = [
    "LAMBDA_ENVELOPE_ENVELOPE",
    "LAMBDA_ENVELOPE_INBOUND_SCHEMA",
    "LAMBDA_ENVELOPE_OUTBOUND_SCHEMA",
    "LAMBDA_ENVELOPE_LOG_EVENT",
    "POWERTOOLS_LOGGER_LOG_EVENT",
];

/// A deployment directory holding `envelope.toml` and the schema files it
/// points at.
struct Deployment {
    dir: TempDir,
}

impl Deployment {
    fn new(envelope: &str) -> Self {
        let dir = TempDir::new().unwrap();

        let inbound = dir.path().join("order.json");
        std::fs::write(
            &inbound,
            json!({
                "type": "object",
                "properties": {
                    "order_id": {"type": "string", "pattern": "^o-"},
                    "quantity": {"type": "integer", "minimum": 1}
                },
                "required": ["order_id", "quantity"]
            })
            .to_string(),
        )
        .unwrap();

        let outbound = dir.path().join("response.json");
        std::fs::write(
            &outbound,
            json!({
                "type": "object",
                "properties": {"processed": {"type": "integer"}},
                "required": ["processed"]
            })
            .to_string(),
        )
        .unwrap();

        let mut config = std::fs::File::create(dir.path().join("envelope.toml")).unwrap();
        writeln!(
            config,
            "envelope = \"{envelope}\"\ninbound_schema = {:?}\noutbound_schema = {:?}",
            inbound.display().to_string(),
            outbound.display().to_string(),
        )
        .unwrap();

        Self { dir }
    }

    fn pipeline(&self) -> Pipeline<ConfiguredSchema, ConfiguredSchema> {
        let config = temp_env::with_vars_unset(CONFIG_VARS, || {
            PipelineConfig::load_from_path(self.dir.path().join("envelope.toml"))
        })
        .unwrap();
        Pipeline::from_config(&config).unwrap()
    }
}

async fn count_successes(event: LambdaEvent<ValidatedEvent<Value>>) -> Result<Value, Error> {
    let processed = match &event.payload.parsed {
        lambda_envelope::Parsed::Batch(batch) => batch.successes().count(),
        parsed => parsed.len(),
    };
    Ok(json!({"processed": processed}))
}

fn sqs_event(bodies: &[Value]) -> Value {
    let mut event = SqsEvent::default();
    event.records = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            let mut message = SqsMessage::default();
            message.message_id = Some(format!("m-{i}"));
            message.body = Some(body.to_string());
            message
        })
        .collect();
    serde_json::to_value(event).unwrap()
}

#[tokio::test]
#[serial]
async fn test_configured_sqs_pipeline_end_to_end() {
    let deployment = Deployment::new("sqs");
    let layer = EnvelopeValidationLayer::new(deployment.pipeline());
    let service = layer.layer(service_fn(count_successes));

    let event = sqs_event(&[
        json!({"order_id": "o-1", "quantity": 2}),
        json!({"order_id": "x-2", "quantity": 1}),
        json!({"order_id": "o-3", "quantity": 0}),
        json!({"order_id": "o-4", "quantity": 5}),
    ]);

    let response = service
        .oneshot(LambdaEvent::new(event, LambdaContext::default()))
        .await
        .unwrap();

    assert_eq!(response, json!({"processed": 2}));
}

#[tokio::test]
#[serial]
async fn test_layer_and_direct_run_agree() {
    let deployment = Deployment::new("sqs");
    let pipeline = deployment.pipeline();
    let event = sqs_event(&[
        json!({"order_id": "o-1", "quantity": 1}),
        json!({"quantity": 1}),
    ]);

    let direct = pipeline
        .run(&event, |input| {
            Ok::<_, Infallible>(input.parsed.failed_identifiers())
        })
        .unwrap();

    let service = EnvelopeValidationLayer::new(pipeline).layer(service_fn(
        |event: LambdaEvent<ValidatedEvent<Value>>| async move {
            Ok::<_, Error>(json!({
                "processed": event.payload.parsed.len(),
                "failed": event.payload.parsed.failed_identifiers(),
            }))
        },
    ));
    let layered = service
        .oneshot(LambdaEvent::new(event, LambdaContext::default()))
        .await
        .unwrap();

    assert_eq!(direct, vec!["m-1".to_string()]);
    assert_eq!(layered["failed"], json!(direct));
}

#[tokio::test]
#[serial]
async fn test_configured_outbound_schema_rejects_response() {
    let deployment = Deployment::new("eventbridge");
    let service = EnvelopeValidationLayer::new(deployment.pipeline()).layer(service_fn(
        |_event: LambdaEvent<ValidatedEvent<Value>>| async move {
            Ok::<_, Error>(json!({"processed": "all of them"}))
        },
    ));

    let event = json!({"detail-type": "OrderPlaced", "detail": {"order_id": "o-9", "quantity": 1}});
    let err = service
        .oneshot(LambdaEvent::new(event, LambdaContext::default()))
        .await
        .unwrap_err();

    let err = err.downcast_ref::<PipelineError<Infallible>>().unwrap();
    assert_eq!(err.stage(), Stage::OutboundValidation);
    let paths: Vec<&str> = err.validation_failure().unwrap().paths().collect();
    assert_eq!(paths, vec!["/processed"]);
}

#[test]
#[serial]
fn test_sns_wrapped_in_sqs_is_unwrapped_twice() {
    let deployment = Deployment::new("sns_sqs");
    let pipeline = deployment.pipeline();

    let mut notification = SnsMessage::default();
    notification.message = json!({"order_id": "o-5", "quantity": 3}).to_string();
    let body = serde_json::to_value(&notification).unwrap();

    let event = sqs_event(&[body]);
    let parsed = pipeline.prepare(&event).unwrap();
    let batch = parsed.as_batch().unwrap();

    assert_eq!(
        batch.get(0).unwrap().value(),
        Some(&json!({"order_id": "o-5", "quantity": 3}))
    );
}

#[test]
#[serial]
fn test_sns_notification_is_validated_as_single_payload() {
    let deployment = Deployment::new("sns");
    let pipeline = deployment.pipeline();

    let sns_event = |order_id: &str| {
        let mut record = SnsRecord::default();
        record.sns.message_id = "sns-1".to_string();
        record.sns.message = json!({"order_id": order_id, "quantity": 1}).to_string();
        let mut event = SnsEvent::default();
        event.records = vec![record];
        serde_json::to_value(event).unwrap()
    };

    let parsed = pipeline.prepare(&sns_event("o-1")).unwrap();
    assert_eq!(
        parsed.as_single(),
        Some(&json!({"order_id": "o-1", "quantity": 1}))
    );

    let err = pipeline.prepare(&sns_event("nope")).unwrap_err();
    assert_eq!(err.stage(), Stage::InboundValidation);
    let paths: Vec<&str> = err.validation_failure().unwrap().paths().collect();
    assert_eq!(paths, vec!["/order_id"]);
}

#[test]
#[serial]
fn test_env_overrides_deployment_config() {
    let deployment = Deployment::new("sqs");
    let config = temp_env::with_vars(
        [
            ("LAMBDA_ENVELOPE_ENVELOPE", Some("eventbridge")),
            ("LAMBDA_ENVELOPE_INBOUND_SCHEMA", None),
            ("LAMBDA_ENVELOPE_OUTBOUND_SCHEMA", None),
            ("LAMBDA_ENVELOPE_LOG_EVENT", None),
            ("POWERTOOLS_LOGGER_LOG_EVENT", Some("true")),
        ],
        || PipelineConfig::load_from_path(deployment.dir.path().join("envelope.toml")),
    )
    .unwrap();

    let pipeline = Pipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.envelope().name(), "eventbridge");
    assert!(pipeline.log_event());
}

#[test]
fn test_unreadable_schema_fails_configuration() {
    let mut broken = NamedTempFile::new().unwrap();
    broken.write_all(b"{ not json").unwrap();

    let config = PipelineConfig::builder()
        .envelope("sqs")
        .inbound_schema(broken.path())
        .build();

    assert!(Pipeline::from_config(&config).is_err());
}
