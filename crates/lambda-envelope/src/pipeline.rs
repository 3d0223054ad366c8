//! The validation pipeline.
//!
//! A [`Pipeline`] runs the stages of one invocation in order: unwrap the
//! envelope, validate the payload against the inbound schema, call the
//! handler with both the raw event and the parsed payload, then validate the
//! handler's return value against the outbound schema, if one is set. The
//! first fatal failure stops the run and is reported with its [`Stage`].
//!
//! Batch sources are the exception: each record is validated on its own and
//! the handler receives every outcome, in record order.

use crate::envelope::{BatchEntry, ChangeLogEntry, Envelope, ImagePair, Unwrapped};
use crate::error::{PipelineError, PrepareError, Stage, UnknownEnvelopeError};
use crate::failure::{Issue, IssueKind, ValidationFailure};
use crate::schema::{Passthrough, Schema};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Outcome of validating one record of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem<T> {
    /// Position of the record in the raw event.
    pub index: usize,
    /// Source identifier of the record, if the source provides one.
    pub id: Option<String>,
    pub outcome: Result<T, ValidationFailure>,
}

impl<T> BatchItem<T> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        self.outcome.as_ref().err()
    }

    /// The source identifier, or the record index when the source has none.
    pub fn identifier(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.index.to_string())
    }
}

/// Per-record outcomes of a batch, in the order of the raw event.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResults<T> {
    items: Vec<BatchItem<T>>,
}

impl<T> BatchResults<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchItem<T>> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&BatchItem<T>> {
        self.items.get(index)
    }

    pub fn successes(&self) -> impl Iterator<Item = &BatchItem<T>> {
        self.items.iter().filter(|item| item.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem<T>> {
        self.items.iter().filter(|item| !item.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Identifiers of the failed records, for partial batch failure
    /// responses.
    pub fn failed_identifiers(&self) -> Vec<String> {
        self.failures().map(BatchItem::identifier).collect()
    }

    pub fn into_items(self) -> Vec<BatchItem<T>> {
        self.items
    }
}

impl<T> IntoIterator for BatchResults<T> {
    type Item = BatchItem<T>;
    type IntoIter = std::vec::IntoIter<BatchItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a BatchResults<T> {
    type Item = &'a BatchItem<T>;
    type IntoIter = std::slice::Iter<'a, BatchItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The validated payload(s) of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Single(T),
    Batch(BatchResults<T>),
    ChangeLog(BatchResults<ImagePair<T>>),
}

impl<T> Parsed<T> {
    /// Number of payloads (1 for single-message sources).
    pub fn len(&self) -> usize {
        match self {
            Parsed::Single(_) => 1,
            Parsed::Batch(results) => results.len(),
            Parsed::ChangeLog(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&T> {
        match self {
            Parsed::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_single(self) -> Option<T> {
        match self {
            Parsed::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_batch(&self) -> Option<&BatchResults<T>> {
        match self {
            Parsed::Batch(results) => Some(results),
            _ => None,
        }
    }

    pub fn as_change_log(&self) -> Option<&BatchResults<ImagePair<T>>> {
        match self {
            Parsed::ChangeLog(results) => Some(results),
            _ => None,
        }
    }

    /// Identifiers of failed records; empty for single-message sources.
    pub fn failed_identifiers(&self) -> Vec<String> {
        match self {
            Parsed::Single(_) => Vec::new(),
            Parsed::Batch(results) => results.failed_identifiers(),
            Parsed::ChangeLog(results) => results.failed_identifiers(),
        }
    }
}

/// What the handler receives: the raw event and the parsed payload(s).
#[derive(Debug)]
pub struct InvocationInput<'a, T> {
    pub raw: &'a Value,
    pub parsed: Parsed<T>,
}

/// An inbound schema, an optional outbound schema and an envelope.
///
/// Cloning is cheap; schemas are shared.
pub struct Pipeline<I, O = Passthrough> {
    envelope: Envelope,
    inbound: Arc<I>,
    outbound: Option<Arc<O>>,
    log_event: bool,
}

impl<I, O> Clone for Pipeline<I, O> {
    fn clone(&self) -> Self {
        Self {
            envelope: self.envelope,
            inbound: Arc::clone(&self.inbound),
            outbound: self.outbound.clone(),
            log_event: self.log_event,
        }
    }
}

impl<I, O> std::fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("envelope", &self.envelope)
            .field("outbound", &self.outbound.is_some())
            .field("log_event", &self.log_event)
            .finish_non_exhaustive()
    }
}

impl<I: Schema> Pipeline<I> {
    /// Starts building a pipeline around an inbound schema.
    pub fn builder(inbound: I) -> PipelineBuilder<I> {
        PipelineBuilder {
            envelope: Envelope::Passthrough,
            inbound,
            outbound: None,
            log_event: false,
        }
    }
}

impl<I, O> Pipeline<I, O> {
    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn inbound(&self) -> &I {
        &self.inbound
    }

    pub fn outbound(&self) -> Option<&O> {
        self.outbound.as_deref()
    }

    pub fn log_event(&self) -> bool {
        self.log_event
    }

    /// A detached handle for outbound validation, for callers that validate
    /// after the pipeline borrow has ended (e.g. in a response future).
    pub fn outbound_validator(&self) -> OutboundValidator<O> {
        OutboundValidator {
            outbound: self.outbound.clone(),
        }
    }
}

impl<I: Schema, O: Schema> Pipeline<I, O> {
    /// Unwraps the envelope and validates the inbound payload(s).
    pub fn prepare(&self, raw: &Value) -> Result<Parsed<I::Output>, PrepareError> {
        let envelope = self.envelope.name();
        if self.log_event {
            tracing::debug!(envelope, event = %raw, "received event");
        }

        let unwrapped = self.envelope.unwrap(raw).map_err(|err| {
            tracing::debug!(envelope, stage = %Stage::Unwrap, error = %err, "envelope rejected");
            PipelineError::Unwrap(err)
        })?;
        tracing::debug!(envelope, payloads = unwrapped.len(), "unwrapped event");

        let parsed = match unwrapped {
            Unwrapped::Single(payload) => {
                let value = self.inbound.validate_payload(&payload).map_err(|failure| {
                    tracing::debug!(
                        envelope,
                        stage = %Stage::InboundValidation,
                        error = %failure,
                        "payload rejected"
                    );
                    PipelineError::Inbound(failure)
                })?;
                Parsed::Single(value)
            }
            Unwrapped::Batch(entries) => Parsed::Batch(self.validate_batch(entries)),
            Unwrapped::ChangeLog(entries) => Parsed::ChangeLog(self.validate_change_log(entries)),
        };

        tracing::debug!(envelope, "inbound validation complete");
        Ok(parsed)
    }

    /// Runs every stage, calling `handler` with the validated input.
    ///
    /// Handler errors are returned unchanged in [`PipelineError::Handler`].
    /// The handler's return value is returned unchanged once it passes
    /// outbound validation.
    pub fn run<F, R, E>(&self, raw: &Value, handler: F) -> Result<R, PipelineError<E>>
    where
        F: FnOnce(InvocationInput<'_, I::Output>) -> Result<R, E>,
        R: Serialize,
    {
        let parsed = self.prepare(raw).map_err(|err| err.with_handler_error())?;

        let response = handler(InvocationInput { raw, parsed }).map_err(PipelineError::Handler)?;
        tracing::debug!(envelope = self.envelope.name(), "handler returned");

        self.validate_outbound(&response)
            .map_err(PipelineError::Outbound)?;
        Ok(response)
    }

    /// Validates a handler response against the outbound schema, if any.
    pub fn validate_outbound<R: Serialize>(&self, response: &R) -> Result<(), ValidationFailure> {
        self.outbound_validator().validate(response)
    }

    fn validate_batch(&self, entries: Vec<BatchEntry>) -> BatchResults<I::Output> {
        let items = entries
            .into_iter()
            .map(|entry| {
                let outcome = entry
                    .payload
                    .and_then(|payload| self.inbound.validate_payload(&payload));
                if let Err(failure) = &outcome {
                    tracing::warn!(
                        index = entry.index,
                        id = entry.id.as_deref(),
                        error = %failure,
                        "batch record failed validation"
                    );
                }
                BatchItem {
                    index: entry.index,
                    id: entry.id,
                    outcome,
                }
            })
            .collect();

        BatchResults { items }
    }

    fn validate_change_log(
        &self,
        entries: Vec<ChangeLogEntry>,
    ) -> BatchResults<ImagePair<I::Output>> {
        let items = entries
            .into_iter()
            .map(|entry| {
                let outcome = entry.images.and_then(|pair| self.validate_images(pair));
                if let Err(failure) = &outcome {
                    tracing::warn!(
                        index = entry.index,
                        id = entry.id.as_deref(),
                        error = %failure,
                        "change-log record failed validation"
                    );
                }
                BatchItem {
                    index: entry.index,
                    id: entry.id,
                    outcome,
                }
            })
            .collect();

        BatchResults { items }
    }

    // Each side is validated on its own; failures of both sides are merged.
    fn validate_images(
        &self,
        pair: ImagePair<Value>,
    ) -> Result<ImagePair<I::Output>, ValidationFailure> {
        let old = pair
            .old
            .map(|image| self.inbound.validate(&image).map_err(|f| f.prefixed("/OldImage")))
            .transpose();
        let new = pair
            .new
            .map(|image| self.inbound.validate(&image).map_err(|f| f.prefixed("/NewImage")))
            .transpose();

        match (old, new) {
            (Ok(old), Ok(new)) => Ok(ImagePair { old, new }),
            (Err(old), Err(new)) => Err(old.merge(new)),
            (Err(failure), Ok(_)) | (Ok(_), Err(failure)) => Err(failure),
        }
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug)]
pub struct PipelineBuilder<I, O = Passthrough> {
    envelope: Envelope,
    inbound: I,
    outbound: Option<O>,
    log_event: bool,
}

impl<I, O> PipelineBuilder<I, O> {
    /// Selects the envelope to unwrap.
    #[must_use]
    pub fn envelope(mut self, envelope: impl Into<Envelope>) -> Self {
        self.envelope = envelope.into();
        self
    }

    /// Selects the envelope by name. Unknown names are rejected.
    pub fn envelope_name(mut self, name: &str) -> Result<Self, UnknownEnvelopeError> {
        self.envelope = Envelope::resolve(Some(name))?;
        Ok(self)
    }

    /// Sets the schema the handler's return value must satisfy.
    #[must_use]
    pub fn outbound<O2: Schema>(self, outbound: O2) -> PipelineBuilder<I, O2> {
        self.outbound_opt(Some(outbound))
    }

    pub(crate) fn outbound_opt<O2: Schema>(self, outbound: Option<O2>) -> PipelineBuilder<I, O2> {
        PipelineBuilder {
            envelope: self.envelope,
            inbound: self.inbound,
            outbound,
            log_event: self.log_event,
        }
    }

    /// Logs every raw event at debug level.
    #[must_use]
    pub fn log_event(mut self, enabled: bool) -> Self {
        self.log_event = enabled;
        self
    }

    pub fn build(self) -> Pipeline<I, O> {
        Pipeline {
            envelope: self.envelope,
            inbound: Arc::new(self.inbound),
            outbound: self.outbound.map(Arc::new),
            log_event: self.log_event,
        }
    }
}

/// Outbound validation detached from its [`Pipeline`].
pub struct OutboundValidator<O> {
    outbound: Option<Arc<O>>,
}

impl<O> Clone for OutboundValidator<O> {
    fn clone(&self) -> Self {
        Self {
            outbound: self.outbound.clone(),
        }
    }
}

impl<O> std::fmt::Debug for OutboundValidator<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundValidator")
            .field("enabled", &self.outbound.is_some())
            .finish()
    }
}

impl<O: Schema> OutboundValidator<O> {
    pub fn is_enabled(&self) -> bool {
        self.outbound.is_some()
    }

    /// Serializes the response and validates it.
    pub fn validate<R: Serialize>(&self, response: &R) -> Result<(), ValidationFailure> {
        let Some(schema) = &self.outbound else {
            return Ok(());
        };

        let value = serde_json::to_value(response).map_err(|e| {
            ValidationFailure::new(Issue::new(
                IssueKind::Constraint,
                "",
                "a serializable response",
                e.to_string(),
            ))
        })?;

        schema.validate(&value).map(drop).inspect_err(|failure| {
            tracing::debug!(
                stage = %Stage::OutboundValidation,
                error = %failure,
                "response rejected"
            );
        })
    }
}

/// Runs one invocation with an envelope named at call time.
///
/// The envelope is resolved before anything else, so an unknown name fails
/// without the handler being called.
pub fn run<I, O, F, R, E>(
    raw: &Value,
    envelope: Option<&str>,
    inbound: &I,
    outbound: Option<&O>,
    handler: F,
) -> Result<R, PipelineError<E>>
where
    I: Schema,
    O: Schema,
    F: FnOnce(InvocationInput<'_, I::Output>) -> Result<R, E>,
    R: Serialize,
{
    let pipeline = Pipeline {
        envelope: Envelope::resolve(envelope)?,
        inbound: Arc::new(inbound),
        outbound: outbound.map(Arc::new),
        log_event: false,
    };
    pipeline.run(raw, handler)
}

/// Unwraps and validates an event without a handler.
pub fn parse<S: Schema>(
    raw: &Value,
    envelope: impl Into<Envelope>,
    schema: &S,
) -> Result<Parsed<S::Output>, PrepareError> {
    let pipeline: Pipeline<&S> = Pipeline::builder(schema).envelope(envelope).build();
    pipeline.prepare(raw)
}

/// Checks that every payload of an event satisfies the schema.
///
/// Unlike [`parse`], a failed batch record fails the whole call; its issues
/// are reported under `/{index}`.
pub fn validate<S: Schema>(
    raw: &Value,
    envelope: impl Into<Envelope>,
    schema: &S,
) -> Result<(), PrepareError> {
    let failures = match parse(raw, envelope, schema)? {
        Parsed::Single(_) => return Ok(()),
        Parsed::Batch(results) => collect_failures(results),
        Parsed::ChangeLog(results) => collect_failures(results),
    };

    match failures.into_iter().reduce(ValidationFailure::merge) {
        Some(failure) => Err(PipelineError::Inbound(failure)),
        None => Ok(()),
    }
}

fn collect_failures<T>(results: BatchResults<T>) -> Vec<ValidationFailure> {
    results
        .into_iter()
        .filter_map(|item| {
            let index = item.index;
            item.outcome
                .err()
                .map(|failure| failure.prefixed(&format!("/{index}")))
        })
        .collect()
}
