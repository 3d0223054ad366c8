//! CloudWatch Logs subscription envelope.

use crate::envelope::{BatchEntry, EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::Read;

/// Extracts `logEvents[*].message` from a CloudWatch Logs subscription.
///
/// `awslogs.data` is base64-encoded gzip of a JSON document. Because the
/// log events only exist after decoding, a decode failure leaves nothing to
/// isolate and is reported as a malformed envelope.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloudWatchLogsEnvelope;

impl EnvelopeStrategy for CloudWatchLogsEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let data = event.object_field("awslogs")?.str_field("data")?;
        let document = decompress(data)?;
        let root = RawEvent::new(&document);

        let mut entries = Vec::new();
        for (index, log_event) in root.array_field("logEvents")?.iter().enumerate() {
            let message = log_event.str_field("message")?;
            entries.push(BatchEntry {
                index,
                id: log_event.opt_str_field("id").map(str::to_string),
                payload: Ok(Payload::Text(message.to_string())),
            });
        }

        tracing::debug!(records = entries.len(), "unwrapped CloudWatch Logs batch");
        Ok(Unwrapped::Batch(entries))
    }
}

fn decompress(data: &str) -> Result<Value, MalformedEnvelopeError> {
    const PATH: &str = "awslogs.data";

    let compressed = STANDARD
        .decode(data.trim())
        .map_err(|_| MalformedEnvelopeError::new(PATH, "base64-encoded data"))?;

    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|_| MalformedEnvelopeError::new(PATH, "gzip-compressed data"))?;

    serde_json::from_slice(&json)
        .map_err(|_| MalformedEnvelopeError::new(PATH, "a JSON log document"))
}
