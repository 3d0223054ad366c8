//! The closed set of supported envelope kinds.

use crate::error::UnknownEnvelopeError;
use std::fmt;
use std::str::FromStr;

/// Selects which transport layer to strip from a raw event.
///
/// Names parse case-insensitively, with `-` and `_` treated alike. Each kind
/// also accepts the generic alias of its source family where one exists
/// (`queue`, `pubsub`, `eventbus`, `stream_change_log`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// SQS batch: `Records[*].body`.
    Sqs,
    /// SNS notification: `Records[0].Sns.Message`.
    Sns,
    /// SNS notifications delivered through SQS: `Records[*].body` → `Message`.
    SnsSqs,
    /// EventBridge event: `detail`.
    EventBridge,
    /// DynamoDB Streams batch: `Records[*].dynamodb.{OldImage,NewImage}`.
    DynamoDbStream,
    /// Kinesis Data Streams batch: `Records[*].kinesis.data` (base64).
    Kinesis,
    /// Kinesis Data Firehose batch: `records[*].data` (base64).
    KinesisFirehose,
    /// MSK or self-managed Kafka batch: `records.*[*].value` (base64).
    Kafka,
    /// CloudWatch Logs subscription: `awslogs.data` (base64 gzip) log events.
    CloudWatchLogs,
    /// API Gateway REST API (v1) proxy request: `body`.
    ApiGatewayRest,
    /// API Gateway HTTP API (v2) request: `body`.
    ApiGatewayHttp,
    /// Lambda function URL request: `body`.
    FunctionUrl,
    /// VPC Lattice (v1) request: `body`.
    VpcLattice,
    /// VPC Lattice (v2) request: `body`.
    VpcLatticeV2,
    /// Bedrock Agents action group invocation: `inputText`.
    BedrockAgent,
}

impl EnvelopeKind {
    /// Every kind, in declaration order.
    pub const ALL: [EnvelopeKind; 15] = [
        EnvelopeKind::Sqs,
        EnvelopeKind::Sns,
        EnvelopeKind::SnsSqs,
        EnvelopeKind::EventBridge,
        EnvelopeKind::DynamoDbStream,
        EnvelopeKind::Kinesis,
        EnvelopeKind::KinesisFirehose,
        EnvelopeKind::Kafka,
        EnvelopeKind::CloudWatchLogs,
        EnvelopeKind::ApiGatewayRest,
        EnvelopeKind::ApiGatewayHttp,
        EnvelopeKind::FunctionUrl,
        EnvelopeKind::VpcLattice,
        EnvelopeKind::VpcLatticeV2,
        EnvelopeKind::BedrockAgent,
    ];

    /// Canonical name, accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            EnvelopeKind::Sqs => "sqs",
            EnvelopeKind::Sns => "sns",
            EnvelopeKind::SnsSqs => "sns_sqs",
            EnvelopeKind::EventBridge => "eventbridge",
            EnvelopeKind::DynamoDbStream => "dynamodb_stream",
            EnvelopeKind::Kinesis => "kinesis",
            EnvelopeKind::KinesisFirehose => "kinesis_firehose",
            EnvelopeKind::Kafka => "kafka",
            EnvelopeKind::CloudWatchLogs => "cloudwatch_logs",
            EnvelopeKind::ApiGatewayRest => "api_gateway_rest",
            EnvelopeKind::ApiGatewayHttp => "api_gateway_http",
            EnvelopeKind::FunctionUrl => "function_url",
            EnvelopeKind::VpcLattice => "vpc_lattice",
            EnvelopeKind::VpcLatticeV2 => "vpc_lattice_v2",
            EnvelopeKind::BedrockAgent => "bedrock_agent",
        }
    }

    /// Whether the kind yields one payload per record.
    pub fn is_batch(&self) -> bool {
        !matches!(
            self,
            EnvelopeKind::Sns
                | EnvelopeKind::EventBridge
                | EnvelopeKind::ApiGatewayRest
                | EnvelopeKind::ApiGatewayHttp
                | EnvelopeKind::FunctionUrl
                | EnvelopeKind::VpcLattice
                | EnvelopeKind::VpcLatticeV2
                | EnvelopeKind::BedrockAgent
        )
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvelopeKind {
    type Err = UnknownEnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        let kind = match normalised.as_str() {
            "sqs" | "queue" => EnvelopeKind::Sqs,
            "sns" | "pubsub" => EnvelopeKind::Sns,
            "sns_sqs" | "snssqs" => EnvelopeKind::SnsSqs,
            "eventbridge" | "event_bridge" | "eventbus" | "event_bus" => EnvelopeKind::EventBridge,
            "dynamodb_stream" | "dynamodb" | "stream_change_log" => EnvelopeKind::DynamoDbStream,
            "kinesis" | "kinesis_data_stream" => EnvelopeKind::Kinesis,
            "kinesis_firehose" | "firehose" => EnvelopeKind::KinesisFirehose,
            "kafka" => EnvelopeKind::Kafka,
            "cloudwatch_logs" | "cloudwatch" => EnvelopeKind::CloudWatchLogs,
            "api_gateway_rest" | "apigw_rest" | "api_gateway" => EnvelopeKind::ApiGatewayRest,
            "api_gateway_http" | "apigw_http" | "api_gateway_v2" => EnvelopeKind::ApiGatewayHttp,
            "function_url" | "lambda_function_url" => EnvelopeKind::FunctionUrl,
            "vpc_lattice" | "vpclattice" => EnvelopeKind::VpcLattice,
            "vpc_lattice_v2" | "vpclattice_v2" | "vpclatticev2" => EnvelopeKind::VpcLatticeV2,
            "bedrock_agent" | "bedrock" => EnvelopeKind::BedrockAgent,
            _ => return Err(UnknownEnvelopeError::new(s)),
        };
        Ok(kind)
    }
}
