//! Tower Layer implementation for envelope validation.

use crate::service::EnvelopeValidationService;
use lambda_envelope::{Passthrough, Pipeline};
use tower::Layer;

/// Tower layer that unwraps and validates Lambda events before the handler.
///
/// The wrapped service receives a [`ValidatedEvent`](crate::ValidatedEvent)
/// carrying the raw event and the parsed payload(s). Events that fail to
/// unwrap, or whose single payload fails inbound validation, are rejected
/// without calling the handler. Responses are checked against the
/// pipeline's outbound schema.
///
/// # Example
///
/// ```ignore
/// use lambda_envelope::{EnvelopeKind, JsonSchema, Pipeline};
/// use lambda_envelope_tower::EnvelopeValidationLayer;
/// use tower::ServiceBuilder;
///
/// let pipeline = Pipeline::builder(schema).envelope(EnvelopeKind::Sqs).build();
///
/// let service = ServiceBuilder::new()
///     .layer(EnvelopeValidationLayer::new(pipeline))
///     .service(my_handler);
/// ```
pub struct EnvelopeValidationLayer<I, O = Passthrough> {
    pipeline: Pipeline<I, O>,
    cold_start_detection: bool,
}

impl<I, O> EnvelopeValidationLayer<I, O> {
    /// Creates a new layer around a pipeline, with cold start detection
    /// enabled.
    pub fn new(pipeline: Pipeline<I, O>) -> Self {
        Self {
            pipeline,
            cold_start_detection: true,
        }
    }

    /// Creates a builder for more detailed configuration.
    pub fn builder(pipeline: Pipeline<I, O>) -> EnvelopeValidationLayerBuilder<I, O> {
        EnvelopeValidationLayerBuilder::new(pipeline)
    }

    pub fn pipeline(&self) -> &Pipeline<I, O> {
        &self.pipeline
    }
}

impl<I, O> Clone for EnvelopeValidationLayer<I, O> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            cold_start_detection: self.cold_start_detection,
        }
    }
}

impl<S, I, O> Layer<S> for EnvelopeValidationLayer<I, O> {
    type Service = EnvelopeValidationService<S, I, O>;

    fn layer(&self, inner: S) -> Self::Service {
        EnvelopeValidationService::new(inner, self.pipeline.clone(), self.cold_start_detection)
    }
}

/// Builder for configuring an [`EnvelopeValidationLayer`].
#[must_use = "builders do nothing unless .build() is called"]
pub struct EnvelopeValidationLayerBuilder<I, O = Passthrough> {
    pipeline: Pipeline<I, O>,
    cold_start_detection: bool,
}

impl<I, O> EnvelopeValidationLayerBuilder<I, O> {
    /// Creates a new builder around a pipeline.
    pub fn new(pipeline: Pipeline<I, O>) -> Self {
        Self {
            pipeline,
            cold_start_detection: true,
        }
    }

    /// Sets whether to record `faas.coldstart` on the invocation span.
    ///
    /// Default: `true`
    ///
    /// Disable when another layer already consumes the cold start flag.
    pub fn cold_start_detection(mut self, enabled: bool) -> Self {
        self.cold_start_detection = enabled;
        self
    }

    /// Builds the configured layer.
    pub fn build(self) -> EnvelopeValidationLayer<I, O> {
        EnvelopeValidationLayer {
            pipeline: self.pipeline,
            cold_start_detection: self.cold_start_detection,
        }
    }
}
