//! Envelope strategies, one per event source family.
//!
//! - `sqs` - SQS batches
//! - `sns` - SNS notifications, and SNS delivered through SQS
//! - `eventbridge` - EventBridge events
//! - `dynamodb` - DynamoDB Streams change logs
//! - `kinesis` - Kinesis Data Streams and Firehose
//! - `kafka` - MSK and self-managed Kafka
//! - `cloudwatch` - CloudWatch Logs subscriptions
//! - `http` - API Gateway REST/HTTP APIs, function URLs and VPC Lattice
//! - `bedrock` - Bedrock Agents action groups

mod bedrock;
mod cloudwatch;
mod dynamodb;
mod eventbridge;
mod http;
mod kafka;
mod kinesis;
mod sns;
mod sqs;

pub use bedrock::BedrockAgentEnvelope;
pub use cloudwatch::CloudWatchLogsEnvelope;
pub use dynamodb::{DynamoDbStreamEnvelope, StreamViewType, UnknownStreamViewType};
pub use eventbridge::EventBridgeEnvelope;
pub use http::{
    ApiGatewayHttpEnvelope, ApiGatewayRestEnvelope, FunctionUrlEnvelope, VpcLatticeEnvelope,
    VpcLatticeV2Envelope,
};
pub use kafka::KafkaEnvelope;
pub use kinesis::{KinesisEnvelope, KinesisFirehoseEnvelope};
pub use sns::{SnsEnvelope, SnsSqsEnvelope};
pub use sqs::SqsEnvelope;

use crate::failure::{Issue, IssueKind, ValidationFailure};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes a base64 record payload into UTF-8 text.
///
/// Failures are record-level issues, not envelope defects.
pub(crate) fn decode_base64_text(encoded: &str) -> Result<String, ValidationFailure> {
    let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
        ValidationFailure::new(Issue::new(
            IssueKind::Constraint,
            "",
            "base64-encoded data",
            e.to_string(),
        ))
    })?;

    String::from_utf8(bytes).map_err(|e| {
        ValidationFailure::new(Issue::new(
            IssueKind::Constraint,
            "",
            "UTF-8 text",
            e.to_string(),
        ))
    })
}
