//! Benchmarks for unwrapping and validating batch events.

use criterion::{Criterion, criterion_group, criterion_main};
use lambda_envelope::{Envelope, EnvelopeKind, JsonSchema, Pipeline};
use serde_json::{Value, json};
use std::hint::black_box;

fn make_sqs_event(records: usize) -> Value {
    let records: Vec<Value> = (0..records)
        .map(|i| {
            json!({
                "messageId": format!("msg-{i}"),
                "receiptHandle": format!("handle-{i}"),
                "body": json!({"orderId": i, "item": "book", "quantity": 2}).to_string(),
                "eventSource": "aws:sqs",
                "awsRegion": "us-east-1"
            })
        })
        .collect();
    json!({"Records": records})
}

fn make_dynamodb_event(records: usize) -> Value {
    let records: Vec<Value> = (0..records)
        .map(|i| {
            json!({
                "eventID": i.to_string(),
                "eventName": "MODIFY",
                "dynamodb": {
                    "Keys": {"Id": {"N": i.to_string()}},
                    "OldImage": {"Id": {"N": i.to_string()}, "Status": {"S": "pending"}},
                    "NewImage": {"Id": {"N": i.to_string()}, "Status": {"S": "shipped"}},
                    "StreamViewType": "NEW_AND_OLD_IMAGES"
                }
            })
        })
        .collect();
    json!({"Records": records})
}

fn order_schema() -> JsonSchema {
    JsonSchema::new(&json!({
        "type": "object",
        "properties": {
            "orderId": {"type": "integer"},
            "item": {"type": "string"},
            "quantity": {"type": "integer", "minimum": 1}
        },
        "required": ["orderId", "item"]
    }))
    .unwrap()
}

fn bench_unwrap_sqs(c: &mut Criterion) {
    let event = make_sqs_event(100);
    let envelope = Envelope::from(EnvelopeKind::Sqs);

    c.bench_function("SqsEnvelope::unwrap/100", |b| {
        b.iter(|| envelope.unwrap(black_box(&event)))
    });
}

fn bench_prepare_sqs(c: &mut Criterion) {
    let event = make_sqs_event(100);
    let pipeline = Pipeline::builder(order_schema())
        .envelope(EnvelopeKind::Sqs)
        .build();

    c.bench_function("Pipeline::prepare/sqs/100", |b| {
        b.iter(|| pipeline.prepare(black_box(&event)))
    });
}

fn bench_unwrap_dynamodb(c: &mut Criterion) {
    let event = make_dynamodb_event(100);
    let envelope = Envelope::from(EnvelopeKind::DynamoDbStream);

    c.bench_function("DynamoDbStreamEnvelope::unwrap/100", |b| {
        b.iter(|| envelope.unwrap(black_box(&event)))
    });
}

criterion_group!(
    benches,
    bench_unwrap_sqs,
    bench_prepare_sqs,
    bench_unwrap_dynamodb
);
criterion_main!(benches);
