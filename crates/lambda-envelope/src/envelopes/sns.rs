//! SNS envelopes for notification triggers.

use crate::envelope::{BatchEntry, EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;
use crate::failure::{Issue, IssueKind, ValidationFailure};
use serde_json::Value;

/// Extracts the `Message` of the first record of an SNS event.
///
/// SNS delivers one notification per invocation, so the result is a single
/// payload. Callers that receive multi-record events must iterate the
/// records themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnsEnvelope;

impl EnvelopeStrategy for SnsEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let records = event.records()?;
        let first = records
            .first()
            .ok_or_else(|| MalformedEnvelopeError::new("Records[0]", "at least one record"))?;

        let message = first.object_field("Sns")?.str_field("Message")?;

        if records.len() > 1 {
            tracing::debug!(
                records = records.len(),
                "SNS event carries more than one record, using the first"
            );
        }

        Ok(Unwrapped::Single(Payload::Text(message.to_string())))
    }
}

/// Extracts SNS messages that were fanned out to an SQS queue.
///
/// Each SQS `body` holds a JSON SNS notification whose `Message` is the
/// payload. The SQS layer must be well formed; a body that is not a
/// notification is a failure of that record only.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnsSqsEnvelope;

impl EnvelopeStrategy for SnsSqsEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let records = event.records()?;

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let body = record.str_field("body")?;
            entries.push(BatchEntry {
                index,
                id: record.opt_str_field("messageId").map(str::to_string),
                payload: notification_message(body).map(Payload::Text),
            });
        }

        Ok(Unwrapped::Batch(entries))
    }
}

fn notification_message(body: &str) -> Result<String, ValidationFailure> {
    let notification: Value =
        serde_json::from_str(body).map_err(|e| ValidationFailure::invalid_json(&e))?;

    notification
        .get("Message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ValidationFailure::new(Issue::new(
                IssueKind::MissingRequiredField,
                "/Message",
                "an SNS notification message",
                "absent",
            ))
        })
}
