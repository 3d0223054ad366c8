//! SQS Lambda example with envelope validation.
//!
//! Each message body is parsed into `Data`. Messages that fail validation
//! are reported back to SQS as batch item failures so only they are retried.
//!
//! # Running
//!
//! ```bash
//! cargo build --example sqs_handler --release
//! ```

use aws_lambda_events::sqs::{BatchItemFailure, SqsBatchResponse};
use lambda_envelope::{EnvelopeKind, Model, Pipeline};
use lambda_envelope_tower::{EnvelopeValidationLayer, ValidatedEvent};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde::Deserialize;
use tower::ServiceBuilder;

#[derive(Debug, Deserialize)]
struct Data {
    id: String,
    text: String,
}

async fn function_handler(
    event: LambdaEvent<ValidatedEvent<Data>>,
) -> Result<SqsBatchResponse, Error> {
    let mut response = SqsBatchResponse::default();

    let Some(batch) = event.payload.parsed.as_batch() else {
        return Ok(response);
    };

    for item in batch {
        match &item.outcome {
            Ok(data) => tracing::info!(id = %data.id, text = %data.text, "Processing SQS message"),
            Err(failure) => {
                tracing::warn!(message_id = %item.identifier(), %failure, "Skipping invalid message");
                let mut failed = BatchItemFailure::default();
                failed.item_identifier = item.identifier();
                response.batch_item_failures.push(failed);
            }
        }
    }

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let pipeline = Pipeline::builder(Model::<Data>::new())
        .envelope(EnvelopeKind::Sqs)
        .build();

    let service = ServiceBuilder::new()
        .layer(EnvelopeValidationLayer::new(pipeline))
        .service(service_fn(function_handler));

    run(service).await
}
