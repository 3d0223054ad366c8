//! Tower middleware that unwraps and validates AWS Lambda events.
//!
//! This crate runs a [`lambda_envelope::Pipeline`] as a Tower layer in front
//! of a Lambda handler. The handler receives the raw event together with its
//! validated payload(s); events that cannot be unwrapped or validated are
//! rejected before the handler runs, and responses are checked against the
//! outbound schema.
//!
//! # Usage
//!
//! ```no_run
//! use lambda_envelope::{EnvelopeKind, JsonSchema, Pipeline};
//! use lambda_envelope_tower::{EnvelopeValidationLayer, ValidatedEvent};
//! use lambda_runtime::{Error, LambdaEvent, run, service_fn};
//! use serde_json::{Value, json};
//! use tower::ServiceBuilder;
//!
//! async fn handler(event: LambdaEvent<ValidatedEvent<Value>>) -> Result<Value, Error> {
//!     let failed = event.payload.parsed.failed_identifiers();
//!     tracing::info!(failed = failed.len(), "processed batch");
//!     Ok(json!({"batchItemFailures": failed
//!         .iter()
//!         .map(|id| json!({"itemIdentifier": id}))
//!         .collect::<Vec<_>>()}))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let schema = JsonSchema::new(&json!({"type": "object", "required": ["orderId"]}))?;
//!     let pipeline = Pipeline::builder(schema).envelope(EnvelopeKind::Sqs).build();
//!
//!     let service = ServiceBuilder::new()
//!         .layer(EnvelopeValidationLayer::new(pipeline))
//!         .service(service_fn(handler));
//!
//!     run(service).await
//! }
//! ```
//!
//! # Spans
//!
//! Each invocation runs inside an `envelope.invoke` span carrying
//! `envelope`, `faas.invocation_id`, `faas.coldstart` and `batch.size`, with
//! `otel.status_code` and `error.message` recorded on completion.

mod cold_start;
mod future;
mod layer;
mod service;

pub use cold_start::check_cold_start;
pub use future::EnvelopeValidationFuture;
pub use layer::{EnvelopeValidationLayer, EnvelopeValidationLayerBuilder};
pub use service::{EnvelopeValidationService, ValidatedEvent};
