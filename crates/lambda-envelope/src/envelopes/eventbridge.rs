//! EventBridge envelope for event bus triggers.

use crate::envelope::{EnvelopeStrategy, Payload, Unwrapped};
use crate::error::MalformedEnvelopeError;
use crate::event::RawEvent;

/// Extracts the `detail` mapping of an EventBridge event verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventBridgeEnvelope;

impl EnvelopeStrategy for EventBridgeEnvelope {
    fn unwrap(&self, event: RawEvent<'_>) -> Result<Unwrapped, MalformedEnvelopeError> {
        let detail = event.object_field("detail")?;
        Ok(Unwrapped::Single(Payload::Json(detail.value().clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_verbatim() {
        let event = json!({
            "version": "0",
            "detail-type": "OrderPlaced",
            "source": "shop",
            "detail": {"message": "hello", "messageId": 8}
        });
        let unwrapped = EventBridgeEnvelope.unwrap(RawEvent::new(&event)).unwrap();
        assert_eq!(
            unwrapped,
            Unwrapped::Single(Payload::Json(json!({"message": "hello", "messageId": 8})))
        );
    }

    #[test]
    fn test_detail_must_be_mapping() {
        let event = json!({"detail": "hello"});
        let err = EventBridgeEnvelope.unwrap(RawEvent::new(&event)).unwrap_err();
        assert_eq!(err.path, "detail");
        assert_eq!(err.expected, "a mapping");
    }

    #[test]
    fn test_missing_detail() {
        let event = json!({"source": "shop"});
        assert!(EventBridgeEnvelope.unwrap(RawEvent::new(&event)).is_err());
    }
}
