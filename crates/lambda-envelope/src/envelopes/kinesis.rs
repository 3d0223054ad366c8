//! Kinesis Data Streams and Firehose envelopes.

use super::decode_base64_text;
use crate::envelope::{BatchEntry, EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;

/// Extracts and base64-decodes `Records[*].kinesis.data`.
///
/// A record whose data does not decode to UTF-8 text fails on its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct KinesisEnvelope;

impl EnvelopeStrategy for KinesisEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let records = event.records()?;

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let kinesis = record.object_field("kinesis")?;
            let data = kinesis.str_field("data")?;
            entries.push(BatchEntry {
                index,
                id: kinesis.opt_str_field("sequenceNumber").map(str::to_string),
                payload: decode_base64_text(data).map(Payload::Text),
            });
        }

        tracing::debug!(records = entries.len(), "unwrapped Kinesis batch");
        Ok(Unwrapped::Batch(entries))
    }
}

/// Extracts and base64-decodes `records[*].data` from a Firehose
/// transformation event.
#[derive(Clone, Copy, Debug, Default)]
pub struct KinesisFirehoseEnvelope;

impl EnvelopeStrategy for KinesisFirehoseEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let records = event.array_field("records")?;

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let data = record.str_field("data")?;
            entries.push(BatchEntry {
                index,
                id: record.opt_str_field("recordId").map(str::to_string),
                payload: decode_base64_text(data).map(Payload::Text),
            });
        }

        tracing::debug!(records = entries.len(), "unwrapped Firehose batch");
        Ok(Unwrapped::Batch(entries))
    }
}
