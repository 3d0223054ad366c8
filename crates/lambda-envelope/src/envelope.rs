//! Envelope strategies and the registry that resolves them.

use crate::envelopes::{
    ApiGatewayHttpEnvelope, ApiGatewayRestEnvelope, BedrockAgentEnvelope, CloudWatchLogsEnvelope,
    DynamoDbStreamEnvelope, EventBridgeEnvelope, FunctionUrlEnvelope, KafkaEnvelope,
    KinesisEnvelope, KinesisFirehoseEnvelope, SnsEnvelope, SnsSqsEnvelope, SqsEnvelope,
    VpcLatticeEnvelope, VpcLatticeV2Envelope,
};
use crate::error::{MalformedEnvelopeError, UnknownEnvelopeError};
use crate::event::RawEvent;
use crate::failure::ValidationFailure;
use crate::kind::EnvelopeKind;
use serde_json::Value;

/// The payload handed to schema validation.
///
/// The two variants are the two validator entry points: a mapping that is
/// already deserialized, and a string that must be decoded first.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// One record of a batch source, unwrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// Position of the record in the raw event.
    pub index: usize,
    /// Source identifier of the record (message id, sequence number, ...).
    pub id: Option<String>,
    /// The record's payload, or why it could not be extracted.
    pub payload: Result<Payload, ValidationFailure>,
}

/// Old and new snapshots of a changed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair<T> {
    pub old: Option<T>,
    pub new: Option<T>,
}

impl<T> ImagePair<T> {
    pub fn is_empty(&self) -> bool {
        self.old.is_none() && self.new.is_none()
    }
}

/// One record of a change-log source, with its images decoded to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLogEntry {
    pub index: usize,
    pub id: Option<String>,
    pub images: Result<ImagePair<Value>, ValidationFailure>,
}

/// Output of a strategy: exactly one transport layer removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Unwrapped {
    Single(Payload),
    Batch(Vec<BatchEntry>),
    ChangeLog(Vec<ChangeLogEntry>),
}

impl Unwrapped {
    /// Number of payloads (1 for single-message sources).
    pub fn len(&self) -> usize {
        match self {
            Unwrapped::Single(_) => 1,
            Unwrapped::Batch(entries) => entries.len(),
            Unwrapped::ChangeLog(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strips one transport layer from a raw event.
///
/// Implementations understand exactly one layer and never probe for
/// alternative nesting. Shape defects in the envelope itself are returned as
/// [`MalformedEnvelopeError`]; defects confined to one record of a batch are
/// reported on that record's entry instead.
pub trait EnvelopeStrategy: Send + Sync + 'static {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError>;
}

/// Hands the raw event through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughEnvelope;

impl EnvelopeStrategy for PassthroughEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        Ok(Unwrapped::Single(Payload::Json(event.value().clone())))
    }
}

/// Returns the strategy registered for a kind.
pub fn strategy_for(kind: EnvelopeKind) -> &'static dyn EnvelopeStrategy {
    match kind {
        EnvelopeKind::Sqs => &SqsEnvelope,
        EnvelopeKind::Sns => &SnsEnvelope,
        EnvelopeKind::SnsSqs => &SnsSqsEnvelope,
        EnvelopeKind::EventBridge => &EventBridgeEnvelope,
        EnvelopeKind::DynamoDbStream => &DynamoDbStreamEnvelope,
        EnvelopeKind::Kinesis => &KinesisEnvelope,
        EnvelopeKind::KinesisFirehose => &KinesisFirehoseEnvelope,
        EnvelopeKind::Kafka => &KafkaEnvelope,
        EnvelopeKind::CloudWatchLogs => &CloudWatchLogsEnvelope,
        EnvelopeKind::ApiGatewayRest => &ApiGatewayRestEnvelope,
        EnvelopeKind::ApiGatewayHttp => &ApiGatewayHttpEnvelope,
        EnvelopeKind::FunctionUrl => &FunctionUrlEnvelope,
        EnvelopeKind::VpcLattice => &VpcLatticeEnvelope,
        EnvelopeKind::VpcLatticeV2 => &VpcLatticeV2Envelope,
        EnvelopeKind::BedrockAgent => &BedrockAgentEnvelope,
    }
}

/// A resolved envelope selection: a registered kind, or no unwrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Envelope {
    #[default]
    Passthrough,
    Kind(EnvelopeKind),
}

impl Envelope {
    /// Resolves an optional envelope name.
    ///
    /// `None` selects pass-through. A name that matches no kind is an error;
    /// it never falls back to pass-through.
    pub fn resolve(name: Option<&str>) -> Result<Self, UnknownEnvelopeError> {
        match name {
            None => Ok(Envelope::Passthrough),
            Some(name) => name.parse().map(Envelope::Kind),
        }
    }

    pub fn kind(&self) -> Option<EnvelopeKind> {
        match self {
            Envelope::Passthrough => None,
            Envelope::Kind(kind) => Some(*kind),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Envelope::Passthrough => "passthrough",
            Envelope::Kind(kind) => kind.name(),
        }
    }

    /// Returns the strategy for this selection.
    pub fn strategy(&self) -> &'static dyn EnvelopeStrategy {
        match self {
            Envelope::Passthrough => &PassthroughEnvelope,
            Envelope::Kind(kind) => strategy_for(*kind),
        }
    }

    /// Applies the strategy to a raw event.
    pub fn unwrap(&self, event: &Value) -> Result<Unwrapped, MalformedEnvelopeError> {
        self.strategy().unwrap(RawEvent::new(event))
    }
}

impl From<EnvelopeKind> for Envelope {
    fn from(kind: EnvelopeKind) -> Self {
        Envelope::Kind(kind)
    }
}

impl From<Option<EnvelopeKind>> for Envelope {
    fn from(kind: Option<EnvelopeKind>) -> Self {
        kind.map_or(Envelope::Passthrough, Envelope::Kind)
    }
}
