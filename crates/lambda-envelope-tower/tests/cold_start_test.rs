//! Cold start flag handling. Kept in its own binary because the flag is
//! process-wide.

use lambda_envelope::{Passthrough, Pipeline};
use lambda_envelope_tower::{EnvelopeValidationLayer, check_cold_start};
use lambda_runtime::{Context as LambdaContext, LambdaEvent, service_fn};
use serde_json::{Value, json};
use tower::{Layer, ServiceExt};

#[tokio::test]
async fn test_disabled_detection_leaves_flag_untouched() {
    let layer = EnvelopeValidationLayer::builder(Pipeline::builder(Passthrough).build())
        .cold_start_detection(false)
        .build();
    let service = layer.layer(service_fn(
        |event: LambdaEvent<lambda_envelope_tower::ValidatedEvent<Value>>| async move {
            Ok::<_, lambda_runtime::Error>(event.payload.raw)
        },
    ));

    let response = service
        .oneshot(LambdaEvent::new(json!({"ping": 1}), LambdaContext::default()))
        .await
        .unwrap();
    assert_eq!(response, json!({"ping": 1}));

    let first = temp_env::with_var_unset("AWS_LAMBDA_INITIALIZATION_TYPE", check_cold_start);
    assert!(first);
    assert!(!check_cold_start());
}
