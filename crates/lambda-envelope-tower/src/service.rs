//! Tower Service implementation for envelope validation.

use crate::cold_start::check_cold_start;
use crate::future::EnvelopeValidationFuture;
use lambda_envelope::{Parsed, Pipeline, Schema};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use std::task::{Context, Poll};
use tower::Service;
use tracing::field::Empty;

/// The event handed to the wrapped service.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent<T> {
    /// The event as delivered by Lambda.
    pub raw: Value,
    /// The unwrapped and validated payload(s).
    pub parsed: Parsed<T>,
}

/// Tower service that runs a [`Pipeline`] around a Lambda handler.
///
/// 1. Unwraps and validates the raw event inside an `envelope.invoke` span
/// 2. Invokes the inner service with a [`ValidatedEvent`]
/// 3. Validates the response against the outbound schema
///
/// Handler errors are returned as they are, boxed into
/// [`lambda_runtime::Error`].
pub struct EnvelopeValidationService<S, I, O> {
    inner: S,
    pipeline: Pipeline<I, O>,
    cold_start_detection: bool,
}

impl<S, I, O> EnvelopeValidationService<S, I, O> {
    pub(crate) fn new(inner: S, pipeline: Pipeline<I, O>, cold_start_detection: bool) -> Self {
        Self {
            inner,
            pipeline,
            cold_start_detection,
        }
    }
}

impl<S: Clone, I, O> Clone for EnvelopeValidationService<S, I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            pipeline: self.pipeline.clone(),
            cold_start_detection: self.cold_start_detection,
        }
    }
}

impl<S, I, O> Service<LambdaEvent<Value>> for EnvelopeValidationService<S, I, O>
where
    S: Service<LambdaEvent<ValidatedEvent<I::Output>>>,
    S::Error: Into<Error>,
    S::Response: serde::Serialize,
    I: Schema,
    O: Schema,
{
    type Response = S::Response;
    type Error = Error;
    type Future = EnvelopeValidationFuture<S::Future, O>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, event: LambdaEvent<Value>) -> Self::Future {
        let (raw, lambda_ctx) = event.into_parts();
        let is_cold_start = self.cold_start_detection && check_cold_start();

        let span = tracing::info_span!(
            "envelope.invoke",
            envelope = self.pipeline.envelope().name(),
            faas.invocation_id = %lambda_ctx.request_id,
            faas.coldstart = is_cold_start,
            batch.size = Empty,
            otel.status_code = Empty,
            error.message = Empty,
        );

        let prepared = {
            let _guard = span.enter();
            self.pipeline.prepare(&raw)
        };

        let parsed = match prepared {
            Ok(parsed) => parsed,
            Err(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.message", err.to_string().as_str());
                tracing::warn!(parent: &span, stage = %err.stage(), error = %err, "event rejected");
                return EnvelopeValidationFuture::rejected(err.into(), span);
            }
        };

        span.record("batch.size", parsed.len() as u64);
        let failed = parsed.failed_identifiers();
        if !failed.is_empty() {
            tracing::warn!(
                parent: &span,
                failed = failed.len(),
                identifiers = ?failed,
                "batch records failed validation"
            );
        }

        let event = LambdaEvent::new(ValidatedEvent { raw, parsed }, lambda_ctx);
        let future = {
            let _guard = span.enter();
            self.inner.call(event)
        };

        EnvelopeValidationFuture::running(future, span, self.pipeline.outbound_validator())
    }
}
