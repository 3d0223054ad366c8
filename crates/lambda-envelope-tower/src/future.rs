//! Future that validates the handler response and records the outcome.

use lambda_envelope::{OutboundValidator, PipelineError, Schema};
use lambda_runtime::Error;
use pin_project::pin_project;
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tracing::Span;

#[pin_project(project = StateProj)]
enum State<F> {
    Rejected { error: Option<Error> },
    Running { #[pin] inner: F },
}

/// Future returned by [`EnvelopeValidationService`](crate::EnvelopeValidationService).
///
/// Resolves immediately with the rejection when the event failed before the
/// handler ran. Otherwise polls the handler inside the invocation span, then
/// validates its response and records `otel.status_code` (and
/// `error.message` on failure).
#[pin_project]
pub struct EnvelopeValidationFuture<F, O> {
    #[pin]
    state: State<F>,
    span: Span,
    outbound: Option<OutboundValidator<O>>,
}

impl<F, O> EnvelopeValidationFuture<F, O> {
    pub(crate) fn rejected(error: Error, span: Span) -> Self {
        Self {
            state: State::Rejected { error: Some(error) },
            span,
            outbound: None,
        }
    }

    pub(crate) fn running(inner: F, span: Span, outbound: OutboundValidator<O>) -> Self {
        Self {
            state: State::Running { inner },
            span,
            outbound: Some(outbound),
        }
    }
}

impl<F, T, E, O> Future for EnvelopeValidationFuture<F, O>
where
    F: Future<Output = Result<T, E>>,
    E: Into<Error>,
    T: Serialize,
    O: Schema,
{
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let inner = match this.state.project() {
            StateProj::Rejected { error } => {
                let error = error
                    .take()
                    .unwrap_or_else(|| "future polled after completion".into());
                return Poll::Ready(Err(error));
            }
            StateProj::Running { inner } => inner,
        };

        let result = {
            let _guard = this.span.enter();
            ready!(inner.poll(cx))
        };

        let result: Result<T, Error> = result.map_err(Into::into).and_then(|response| {
            match this.outbound.as_ref().map(|outbound| outbound.validate(&response)) {
                Some(Err(failure)) => Err(PipelineError::<Infallible>::Outbound(failure).into()),
                _ => Ok(response),
            }
        });

        match &result {
            Ok(_) => {
                this.span.record("otel.status_code", "OK");
            }
            Err(e) => {
                this.span.record("otel.status_code", "ERROR");
                this.span.record("error.message", e.to_string().as_str());
            }
        }

        Poll::Ready(result)
    }
}
