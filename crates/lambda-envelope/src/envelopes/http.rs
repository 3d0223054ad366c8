//! Request envelopes for API Gateway, Lambda function URLs and VPC Lattice.
//!
//! A request without a body (`null` or absent, as for most `GET` requests)
//! unwraps to a JSON `null` payload. Only a body of another type is
//! malformed.

use crate::envelope::{EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

const BASE64_FLAG: &str = "isBase64Encoded";

/// API Gateway REST API (payload format 1.0) request body.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiGatewayRestEnvelope;

/// API Gateway HTTP API (payload format 2.0) request body.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiGatewayHttpEnvelope;

/// Lambda function URL request body.
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionUrlEnvelope;

/// VPC Lattice (payload version 1) request body.
///
/// Version 1 spells the encoding flag `is_base64_encoded`.
#[derive(Clone, Copy, Debug, Default)]
pub struct VpcLatticeEnvelope;

/// VPC Lattice (payload version 2) request body.
#[derive(Clone, Copy, Debug, Default)]
pub struct VpcLatticeV2Envelope;

impl EnvelopeStrategy for ApiGatewayRestEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        request_body(&event, BASE64_FLAG)
    }
}

impl EnvelopeStrategy for ApiGatewayHttpEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        request_body(&event, BASE64_FLAG)
    }
}

impl EnvelopeStrategy for FunctionUrlEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        request_body(&event, BASE64_FLAG)
    }
}

impl EnvelopeStrategy for VpcLatticeEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        request_body(&event, "is_base64_encoded")
    }
}

impl EnvelopeStrategy for VpcLatticeV2Envelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        request_body(&event, BASE64_FLAG)
    }
}

fn request_body(event: &RawEvent<'_>, flag: &str) -> Result<Unwrapped, MalformedEnvelopeError> {
    let Some(body) = event.opt_field("body") else {
        return Ok(Unwrapped::Single(Payload::Json(Value::Null)));
    };
    let body = body
        .value()
        .as_str()
        .ok_or_else(|| MalformedEnvelopeError::new("body", "a string or null"))?;

    let encoded = event
        .opt_field(flag)
        .and_then(|flag| flag.value().as_bool())
        .unwrap_or(false);

    if !encoded {
        return Ok(Unwrapped::Single(Payload::Text(body.to_string())));
    }

    let bytes = STANDARD
        .decode(body.trim())
        .map_err(|_| MalformedEnvelopeError::new("body", "base64-encoded data"))?;
    let text =
        String::from_utf8(bytes).map_err(|_| MalformedEnvelopeError::new("body", "UTF-8 text"))?;

    Ok(Unwrapped::Single(Payload::Text(text)))
}
