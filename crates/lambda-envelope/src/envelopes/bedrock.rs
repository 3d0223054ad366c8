//! Bedrock Agents action group envelope.

use crate::envelope::{EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;

/// Extracts the user's `inputText` from a Bedrock Agents invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct BedrockAgentEnvelope;

impl EnvelopeStrategy for BedrockAgentEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let input = event.str_field("inputText")?;
        tracing::debug!(
            action_group = event.opt_str_field("actionGroup"),
            api_path = event.opt_str_field("apiPath"),
            "unwrapped Bedrock agent input"
        );
        Ok(Unwrapped::Single(Payload::Text(input.to_string())))
    }
}
