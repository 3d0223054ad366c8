//! Envelope unwrapping and schema validation for AWS Lambda events.
//!
//! Lambda delivers application payloads wrapped in a transport envelope: an
//! SQS record body, an SNS message, an EventBridge `detail`, a DynamoDB
//! Streams image. This crate strips exactly one such layer, validates what
//! is left against a schema, calls the handler with both representations and
//! optionally validates the handler's return value.
//!
//! # Architecture
//!
//! - [`EnvelopeKind`] names a supported source; [`Envelope::resolve`] maps a
//!   name to a kind and rejects names it does not know
//! - [`EnvelopeStrategy`] implementations strip one layer each, reading the
//!   raw event through the path-tracking [`RawEvent`] view
//! - [`Schema`] implementations validate payloads: [`Passthrough`],
//!   [`JsonSchema`], serde [`Model`]s and [`Validated`] models
//! - [`Pipeline`] composes the stages and reports failures by [`Stage`]
//!
//! Batch sources produce one outcome per record, in record order, so a bad
//! record does not fail its neighbours.
//!
//! # Example
//!
//! ```
//! use lambda_envelope::{EnvelopeKind, JsonSchema, Pipeline};
//! use serde_json::json;
//!
//! let schema = JsonSchema::new(&json!({
//!     "type": "object",
//!     "properties": {"greeting": {"type": "string"}},
//!     "required": ["greeting"]
//! }))?;
//!
//! let pipeline = Pipeline::builder(schema)
//!     .envelope(EnvelopeKind::Sqs)
//!     .build();
//!
//! let event = json!({"Records": [{"messageId": "1", "body": "{\"greeting\": \"hi\"}"}]});
//! let greetings = pipeline.run(&event, |input| {
//!     let batch = input.parsed.as_batch().expect("sqs produces a batch");
//!     Ok::<_, std::convert::Infallible>(batch.successes().count())
//! })?;
//! assert_eq!(greetings, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attribute;
mod config;
mod envelope;
pub mod envelopes;
mod error;
mod event;
mod failure;
mod kind;
mod pipeline;
mod schema;

pub use attribute::{decode_attribute, decode_image};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use envelope::{
    BatchEntry, ChangeLogEntry, Envelope, EnvelopeStrategy, ImagePair, PassthroughEnvelope,
    Payload, Unwrapped, strategy_for,
};
pub use error::{
    ConfigError, ErrorKind, MalformedEnvelopeError, PipelineError, PrepareError, SchemaError,
    Stage, UnknownEnvelopeError,
};
pub use event::RawEvent;
pub use failure::{Issue, IssueKind, ValidationFailure};
pub use kind::EnvelopeKind;
pub use pipeline::{
    BatchItem, BatchResults, InvocationInput, OutboundValidator, Parsed, Pipeline,
    PipelineBuilder, parse, run, validate,
};
pub use schema::{ConfiguredSchema, JsonSchema, Model, Passthrough, Schema, Validated};
