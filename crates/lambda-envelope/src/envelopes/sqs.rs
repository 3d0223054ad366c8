//! SQS envelope for message queue triggers.

use crate::envelope::{BatchEntry, EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;

/// Extracts `Records[*].body` from an SQS batch.
///
/// Bodies are handed on as text so that the validator decodes them
/// explicitly. Order follows `Records`; a record without a `body` string
/// makes the whole event malformed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqsEnvelope;

impl EnvelopeStrategy for SqsEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let records = event.records()?;

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let body = record.str_field("body")?;
            entries.push(BatchEntry {
                index,
                id: record.opt_str_field("messageId").map(str::to_string),
                payload: Ok(Payload::Text(body.to_string())),
            });
        }

        tracing::debug!(records = entries.len(), "unwrapped SQS batch");
        Ok(Unwrapped::Batch(entries))
    }
}
