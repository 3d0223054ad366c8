//! Kafka envelope for MSK and self-managed Kafka triggers.

use super::decode_base64_text;
use crate::envelope::{BatchEntry, EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;
use serde_json::Value;

/// Extracts and base64-decodes `records.{topic-partition}[*].value`.
///
/// Partitions are visited in key order and records in delivery order, so
/// batch positions are stable for a given event. Each record is identified
/// as `topic-partition@offset`.
#[derive(Clone, Copy, Debug, Default)]
pub struct KafkaEnvelope;

impl EnvelopeStrategy for KafkaEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let partitions = event.object_field("records")?;
        let mut keys: Vec<&str> = partitions.as_object()?.keys().map(String::as_str).collect();
        keys.sort_unstable();

        let mut entries = Vec::new();
        for key in keys {
            for record in partitions.array_field(key)? {
                let value = record.str_field("value")?;
                let offset = record.opt_field("offset").map(|o| render_offset(o.value()));
                entries.push(BatchEntry {
                    index: entries.len(),
                    id: offset.map(|offset| format!("{key}@{offset}")),
                    payload: decode_base64_text(value).map(Payload::Text),
                });
            }
        }

        tracing::debug!(records = entries.len(), "unwrapped Kafka batch");
        Ok(Unwrapped::Batch(entries))
    }
}

fn render_offset(offset: &Value) -> String {
    match offset {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
