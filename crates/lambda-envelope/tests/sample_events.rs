//! Integration tests using real-world Lambda sample events.
//!
//! These tests verify that each envelope unwraps events in the shape AWS
//! Lambda delivers them, based on sample events from
//! https://github.com/tschoffelen/lambda-sample-events and on the typed
//! events of `aws_lambda_events`.

use aws_lambda_events::sns::{SnsEvent, SnsMessage, SnsRecord};
use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use lambda_envelope::{Envelope, EnvelopeKind, JsonSchema, Payload, Pipeline, Unwrapped};
use serde_json::{Value, json};

/// SQS sample event (from lambda-sample-events repo)
const SQS_EVENT: &str = r#"{
  "Records": [
    {
      "messageId": "19dd0b57-b21e-4ac1-bd88-01bbb068cb78",
      "receiptHandle": "MessageReceiptHandle",
      "body": "Hello from SQS!",
      "attributes": {
        "ApproximateReceiveCount": "1",
        "SentTimestamp": "1523232000000",
        "SenderId": "123456789012",
        "ApproximateFirstReceiveTimestamp": "1523232000001"
      },
      "messageAttributes": {},
      "md5OfBody": "098f6bcd4621d373cade4e832627b4f6",
      "eventSource": "aws:sqs",
      "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:MyQueue",
      "awsRegion": "us-east-1"
    }
  ]
}"#;

/// EventBridge scheduled event
const EVENTBRIDGE_EVENT: &str = r#"{
  "version": "0",
  "id": "6a7e8feb-b491-4cf7-a9f1-bf3703467718",
  "detail-type": "OrderPlaced",
  "source": "com.example.orders",
  "account": "123456789012",
  "time": "2017-12-22T18:43:48Z",
  "region": "us-west-1",
  "resources": [],
  "detail": {
    "orderId": "ord-1001",
    "amount": 42.5
  }
}"#;

/// DynamoDB Streams sample event (from lambda-sample-events repo)
const DYNAMODB_EVENT: &str = r#"{
  "Records": [
    {
      "eventID": "1",
      "eventVersion": "1.0",
      "dynamodb": {
        "Keys": {"Id": {"N": "101"}},
        "NewImage": {"Message": {"S": "New item!"}, "Id": {"N": "101"}},
        "StreamViewType": "NEW_AND_OLD_IMAGES",
        "SequenceNumber": "111",
        "SizeBytes": 26
      },
      "awsRegion": "us-west-2",
      "eventName": "INSERT",
      "eventSourceARN": "arn:aws:dynamodb:us-west-2:123456789012:table/Example/stream/2015-06-27T00:48:05.899",
      "eventSource": "aws:dynamodb"
    },
    {
      "eventID": "2",
      "eventVersion": "1.0",
      "dynamodb": {
        "OldImage": {"Message": {"S": "New item!"}, "Id": {"N": "101"}},
        "SequenceNumber": "222",
        "Keys": {"Id": {"N": "101"}},
        "SizeBytes": 59,
        "NewImage": {"Message": {"S": "This item has changed"}, "Id": {"N": "101"}},
        "StreamViewType": "NEW_AND_OLD_IMAGES"
      },
      "awsRegion": "us-west-2",
      "eventName": "MODIFY",
      "eventSourceARN": "arn:aws:dynamodb:us-west-2:123456789012:table/Example/stream/2015-06-27T00:48:05.899",
      "eventSource": "aws:dynamodb"
    },
    {
      "eventID": "3",
      "eventVersion": "1.0",
      "dynamodb": {
        "Keys": {"Id": {"N": "101"}},
        "SizeBytes": 38,
        "SequenceNumber": "333",
        "OldImage": {"Message": {"S": "This item has changed"}, "Id": {"N": "101"}},
        "StreamViewType": "NEW_AND_OLD_IMAGES"
      },
      "awsRegion": "us-west-2",
      "eventName": "REMOVE",
      "eventSourceARN": "arn:aws:dynamodb:us-west-2:123456789012:table/Example/stream/2015-06-27T00:48:05.899",
      "eventSource": "aws:dynamodb"
    }
  ]
}"#;

/// Kinesis Data Streams sample event (from lambda-sample-events repo)
const KINESIS_EVENT: &str = r#"{
  "Records": [
    {
      "kinesis": {
        "partitionKey": "partitionKey-03",
        "kinesisSchemaVersion": "1.0",
        "data": "SGVsbG8sIHRoaXMgaXMgYSB0ZXN0IDEyMy4=",
        "sequenceNumber": "49545115243490985018280067714973144582180062593244200961",
        "approximateArrivalTimestamp": 1428537600
      },
      "eventSource": "aws:kinesis",
      "eventID": "shardId-000000000000:49545115243490985018280067714973144582180062593244200961",
      "invokeIdentityArn": "arn:aws:iam::EXAMPLE",
      "eventVersion": "1.0",
      "eventName": "aws:kinesis:record",
      "eventSourceARN": "arn:aws:kinesis:EXAMPLE",
      "awsRegion": "us-east-1"
    }
  ]
}"#;

/// MSK sample event
const KAFKA_EVENT: &str = r#"{
  "eventSource": "aws:kafka",
  "eventSourceArn": "arn:aws:kafka:us-east-1:0123456789019:cluster/SalesCluster/abcd1234-abcd-cafe-abab-9876543210ab-4",
  "bootstrapServers": "b-2.demo-cluster-1.a1bcde.c1.kafka.us-east-1.amazonaws.com:9092",
  "records": {
    "mytopic-0": [
      {
        "topic": "mytopic",
        "partition": 0,
        "offset": 15,
        "timestamp": 1545084650987,
        "timestampType": "CREATE_TIME",
        "key": "cmVjb3JkS2V5",
        "value": "eyJrZXkiOiJ2YWx1ZSJ9",
        "headers": []
      }
    ]
  }
}"#;

/// API Gateway HTTP API v2 sample event (from lambda-sample-events repo)
const API_GATEWAY_HTTP_API_EVENT: &str = r#"{
  "version": "2.0",
  "routeKey": "$default",
  "rawPath": "/path/to/resource",
  "rawQueryString": "parameter1=value1&parameter1=value2&parameter2=value",
  "headers": {
    "Header1": "value1"
  },
  "requestContext": {
    "accountId": "123456789012",
    "apiId": "api-id",
    "http": {
      "method": "POST",
      "path": "/path/to/resource",
      "protocol": "HTTP/1.1",
      "sourceIp": "192.168.0.1",
      "userAgent": "agent"
    },
    "requestId": "id",
    "routeKey": "$default",
    "stage": "$default"
  },
  "body": "eyJ0ZXN0IjoiYm9keSJ9",
  "isBase64Encoded": true
}"#;

fn parse(event: &str) -> Value {
    serde_json::from_str(event).unwrap()
}

fn typed_sqs_event(bodies: &[&str]) -> Value {
    let records = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            let mut message = SqsMessage::default();
            message.message_id = Some(format!("msg-{i}"));
            message.receipt_handle = Some(format!("receipt-{i}"));
            message.body = Some((*body).to_string());
            message.event_source = Some("aws:sqs".to_string());
            message.event_source_arn =
                Some("arn:aws:sqs:us-east-1:123456789:my-queue".to_string());
            message.aws_region = Some("us-east-1".to_string());
            message
        })
        .collect();

    let mut event = SqsEvent::default();
    event.records = records;
    serde_json::to_value(event).unwrap()
}

fn typed_sns_event(message: &str) -> Value {
    let mut sns_msg = SnsMessage::default();
    sns_msg.sns_message_type = "Notification".to_string();
    sns_msg.message_id = "msg-123".to_string();
    sns_msg.topic_arn = "arn:aws:sns:us-east-1:123456789:my-topic".to_string();
    sns_msg.signature_version = "1".to_string();
    sns_msg.message = message.to_string();

    let mut record = SnsRecord::default();
    record.event_source = "aws:sns".to_string();
    record.event_version = "1.0".to_string();
    record.sns = sns_msg;

    let mut event = SnsEvent::default();
    event.records = vec![record];
    serde_json::to_value(event).unwrap()
}

fn batch(kind: EnvelopeKind, event: &Value) -> Vec<lambda_envelope::BatchEntry> {
    match Envelope::from(kind).unwrap(event).unwrap() {
        Unwrapped::Batch(entries) => entries,
        other => panic!("{kind} produced {other:?}"),
    }
}

#[test]
fn test_sqs_sample_event() {
    let entries = batch(EnvelopeKind::Sqs, &parse(SQS_EVENT));
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].id.as_deref(),
        Some("19dd0b57-b21e-4ac1-bd88-01bbb068cb78")
    );
    assert_eq!(
        entries[0].payload,
        Ok(Payload::Text("Hello from SQS!".into()))
    );
}

#[test]
fn test_typed_sqs_event() {
    let event = typed_sqs_event(&[r#"{"orderId": 1}"#, r#"{"orderId": 2}"#]);
    let entries = batch(EnvelopeKind::Sqs, &event);

    let ids: Vec<_> = entries.iter().map(|e| e.id.clone().unwrap()).collect();
    assert_eq!(ids, ["msg-0", "msg-1"]);
    assert_eq!(
        entries[1].payload,
        Ok(Payload::Text(r#"{"orderId": 2}"#.into()))
    );
}

#[test]
fn test_typed_sns_event() {
    let event = typed_sns_event(r#"{"test": "data"}"#);
    let unwrapped = Envelope::from(EnvelopeKind::Sns).unwrap(&event).unwrap();
    assert_eq!(
        unwrapped,
        Unwrapped::Single(Payload::Text(r#"{"test": "data"}"#.into()))
    );
}

#[test]
fn test_eventbridge_sample_event() {
    let unwrapped = Envelope::from(EnvelopeKind::EventBridge)
        .unwrap(&parse(EVENTBRIDGE_EVENT))
        .unwrap();
    assert_eq!(
        unwrapped,
        Unwrapped::Single(Payload::Json(json!({"orderId": "ord-1001", "amount": 42.5})))
    );
}

#[test]
fn test_dynamodb_sample_event() {
    let event = parse(DYNAMODB_EVENT);
    let pipeline = Pipeline::builder(
        JsonSchema::new(&json!({
            "type": "object",
            "properties": {"Message": {"type": "string"}, "Id": {"type": "integer"}},
            "required": ["Message", "Id"]
        }))
        .unwrap(),
    )
    .envelope(EnvelopeKind::DynamoDbStream)
    .build();

    let parsed = pipeline.prepare(&event).unwrap();
    let results = parsed.as_change_log().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.failures().next().is_none());

    let insert = results.get(0).unwrap().value().unwrap();
    assert!(insert.old.is_none());
    assert_eq!(insert.new, Some(json!({"Message": "New item!", "Id": 101})));

    let remove = results.get(2).unwrap().value().unwrap();
    assert!(remove.new.is_none());
    assert_eq!(results.get(2).unwrap().id.as_deref(), Some("3"));
}

#[test]
fn test_kinesis_sample_event() {
    let entries = batch(EnvelopeKind::Kinesis, &parse(KINESIS_EVENT));
    assert_eq!(
        entries[0].payload,
        Ok(Payload::Text("Hello, this is a test 123.".into()))
    );
}

#[test]
fn test_kafka_sample_event() {
    let entries = batch(EnvelopeKind::Kafka, &parse(KAFKA_EVENT));
    assert_eq!(entries[0].id.as_deref(), Some("mytopic-0@15"));
    assert_eq!(
        entries[0].payload,
        Ok(Payload::Text(r#"{"key":"value"}"#.into()))
    );
}

#[test]
fn test_api_gateway_http_sample_event() {
    let unwrapped = Envelope::from(EnvelopeKind::ApiGatewayHttp)
        .unwrap(&parse(API_GATEWAY_HTTP_API_EVENT))
        .unwrap();
    assert_eq!(
        unwrapped,
        Unwrapped::Single(Payload::Text(r#"{"test":"body"}"#.into()))
    );
}
