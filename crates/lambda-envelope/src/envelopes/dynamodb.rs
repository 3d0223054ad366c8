//! DynamoDB Streams envelope for change-log triggers.

use crate::attribute::decode_image;
use crate::envelope::{ChangeLogEntry, EnvelopeStrategy, ImagePair, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;
use crate::failure::{Issue, IssueKind, ValidationFailure, describe};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// Which images a stream is configured to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamViewType {
    NewAndOldImages,
    NewImage,
    OldImage,
    KeysOnly,
}

/// The `StreamViewType` of a record is not one DynamoDB defines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stream view type `{0}`")]
pub struct UnknownStreamViewType(pub String);

impl FromStr for StreamViewType {
    type Err = UnknownStreamViewType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW_AND_OLD_IMAGES" => Ok(StreamViewType::NewAndOldImages),
            "NEW_IMAGE" => Ok(StreamViewType::NewImage),
            "OLD_IMAGE" => Ok(StreamViewType::OldImage),
            "KEYS_ONLY" => Ok(StreamViewType::KeysOnly),
            other => Err(UnknownStreamViewType(other.to_string())),
        }
    }
}

/// Extracts `OldImage`/`NewImage` pairs from a DynamoDB Streams batch.
///
/// Each record must carry a `dynamodb` change descriptor. Images are decoded
/// from attribute-tagged form into plain JSON; a side that is absent stays
/// empty. A record declared `NEW_AND_OLD_IMAGES` that carries neither image
/// fails on its own, as does a record whose image cannot be decoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamoDbStreamEnvelope;

impl EnvelopeStrategy for DynamoDbStreamEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let records = event.records()?;

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let change = record.object_field("dynamodb")?;
            entries.push(ChangeLogEntry {
                index,
                id: record.opt_str_field("eventID").map(str::to_string),
                images: decode_images(&change),
            });
        }

        tracing::debug!(records = entries.len(), "unwrapped DynamoDB stream batch");
        Ok(Unwrapped::ChangeLog(entries))
    }
}

fn decode_images(change: &RawEvent<'_>) -> Result<ImagePair<Value>, ValidationFailure> {
    let view_type = match change
        .opt_str_field("StreamViewType")
        .map(str::parse::<StreamViewType>)
    {
        Some(Ok(view_type)) => Some(view_type),
        Some(Err(err)) => {
            tracing::debug!(error = %err, "treating record as having no view type");
            None
        }
        None => None,
    };

    let pair = ImagePair {
        old: decode_side(change, "OldImage")?,
        new: decode_side(change, "NewImage")?,
    };

    if pair.is_empty() && view_type == Some(StreamViewType::NewAndOldImages) {
        return Err(ValidationFailure::new(Issue::new(
            IssueKind::MissingImage,
            "",
            "OldImage or NewImage for a NEW_AND_OLD_IMAGES record",
            "neither image",
        )));
    }

    Ok(pair)
}

fn decode_side(change: &RawEvent<'_>, key: &str) -> Result<Option<Value>, ValidationFailure> {
    let Some(image) = change.opt_field(key) else {
        return Ok(None);
    };

    let prefix = format!("/{key}");
    let Some(map) = image.value().as_object() else {
        return Err(ValidationFailure::new(Issue::new(
            IssueKind::TypeMismatch,
            prefix,
            "object",
            describe(image.value()),
        )));
    };

    decode_image(map)
        .map(Some)
        .map_err(|failure| failure.prefixed(&prefix))
}
