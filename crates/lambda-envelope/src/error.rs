//! Error types for envelope unwrapping and validation.

use crate::failure::ValidationFailure;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The requested envelope name does not match any known envelope kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown envelope `{name}`")]
pub struct UnknownEnvelopeError {
    /// The unrecognised name as supplied by the caller.
    pub name: String,
}

impl UnknownEnvelopeError {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The raw event does not have the shape an envelope strategy expects.
///
/// Shape defects are permanent, so this error is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed envelope: expected {expected} at `{path}`")]
pub struct MalformedEnvelopeError {
    /// Key path that was expected, e.g. `Records[2].body`.
    pub path: String,
    /// Description of what should have been found there.
    pub expected: &'static str,
}

impl MalformedEnvelopeError {
    pub(crate) fn new(path: impl Into<String>, expected: &'static str) -> Self {
        Self {
            path: path.into(),
            expected,
        }
    }
}

/// A schema definition could not be loaded or compiled.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document is not a valid JSON Schema.
    #[error("invalid schema definition: {0}")]
    Invalid(String),

    /// The schema file could not be read.
    #[error("failed to read schema file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("schema file {path} is not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while building a pipeline from configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration could not be extracted.
    #[error("configuration error")]
    Figment(#[source] Box<figment::Error>),

    /// The configured envelope is unknown.
    #[error(transparent)]
    UnknownEnvelope(#[from] UnknownEnvelopeError),

    /// A configured schema could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

/// Pipeline stage at which a failure surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Envelope resolution and unwrapping.
    Unwrap,
    /// Validation of the unwrapped payload.
    InboundValidation,
    /// The user handler.
    Handler,
    /// Validation of the handler's return value.
    OutboundValidation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Unwrap => "unwrap",
            Stage::InboundValidation => "inbound_validation",
            Stage::Handler => "handler",
            Stage::OutboundValidation => "outbound_validation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownEnvelope,
    MalformedEnvelope,
    Validation,
    Handler,
}

/// A fatal pipeline failure, tagged with the stage that produced it.
///
/// `E` is the user handler's error type. Handler errors are carried
/// unchanged so callers observe exactly what the handler returned.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    /// No strategy is registered for the requested envelope.
    #[error(transparent)]
    UnknownEnvelope(#[from] UnknownEnvelopeError),

    /// The raw event did not match the envelope shape.
    #[error("unwrap failed: {0}")]
    Unwrap(#[source] MalformedEnvelopeError),

    /// The unwrapped payload did not satisfy the inbound schema.
    #[error("inbound validation failed: {0}")]
    Inbound(#[source] ValidationFailure),

    /// The user handler returned an error.
    #[error(transparent)]
    Handler(E),

    /// The handler's return value did not satisfy the outbound schema.
    #[error("outbound validation failed: {0}")]
    Outbound(#[source] ValidationFailure),
}

impl<E> PipelineError<E> {
    /// Returns the stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::UnknownEnvelope(_) | PipelineError::Unwrap(_) => Stage::Unwrap,
            PipelineError::Inbound(_) => Stage::InboundValidation,
            PipelineError::Handler(_) => Stage::Handler,
            PipelineError::Outbound(_) => Stage::OutboundValidation,
        }
    }

    /// Returns the failure classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::UnknownEnvelope(_) => ErrorKind::UnknownEnvelope,
            PipelineError::Unwrap(_) => ErrorKind::MalformedEnvelope,
            PipelineError::Inbound(_) | PipelineError::Outbound(_) => ErrorKind::Validation,
            PipelineError::Handler(_) => ErrorKind::Handler,
        }
    }

    /// Returns the validation failure for inbound or outbound errors.
    pub fn validation_failure(&self) -> Option<&ValidationFailure> {
        match self {
            PipelineError::Inbound(failure) | PipelineError::Outbound(failure) => Some(failure),
            _ => None,
        }
    }

    /// Consumes the error, returning the handler's original error if that is
    /// what failed.
    pub fn into_handler_error(self) -> Option<E> {
        match self {
            PipelineError::Handler(err) => Some(err),
            _ => None,
        }
    }
}

impl PipelineError<Infallible> {
    /// Re-types an error raised before the handler ran.
    pub fn with_handler_error<E>(self) -> PipelineError<E> {
        match self {
            PipelineError::UnknownEnvelope(err) => PipelineError::UnknownEnvelope(err),
            PipelineError::Unwrap(err) => PipelineError::Unwrap(err),
            PipelineError::Inbound(failure) => PipelineError::Inbound(failure),
            PipelineError::Outbound(failure) => PipelineError::Outbound(failure),
            PipelineError::Handler(never) => match never {},
        }
    }
}

/// Errors raised before a handler is involved.
pub type PrepareError = PipelineError<Infallible>;
