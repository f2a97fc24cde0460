//! Provider adapters.
//!
//! One adapter per external payload format. Adapters only map fields; the
//! shared extraction driver in this module owns the batch semantics every
//! provider gets for free:
//!
//! - a payload may be one JSON object or an array of objects (array
//!   attempted first),
//! - a batch fails atomically, reporting the index of the offending
//!   element,
//! - every extracted event is taxonomy-validated before it leaves the
//!   adapter layer.

mod generic;
mod opta;
mod wyscout;

pub use generic::GenericAdapter;
pub use opta::OptaAdapter;
pub use wyscout::WyscoutAdapter;

use std::sync::Arc;

use serde_json::{Map, Value};

use super::event::{NormalizedEvent, ValidationError};

/// Extraction failure for a whole payload.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("payload must be a JSON object or an array of objects")]
    UnsupportedShape,
    #[error("event at index {index}: {source}")]
    Event {
        index: usize,
        source: EventFieldError,
    },
    #[error("expected exactly one event, payload contained {0}")]
    NotSingleton(usize),
    #[error("payload contained no events")]
    Empty,
}

/// Field-level mapping failure for one payload element.
#[derive(Debug, thiserror::Error)]
pub enum EventFieldError {
    #[error("missing required field {0:?}")]
    MissingField(&'static str),
    #[error("field {field:?}: {detail}")]
    InvalidField {
        field: &'static str,
        detail: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A provider payload format.
///
/// Implementations map a single JSON object to a [`NormalizedEvent`]; the
/// provided `extract_*` drivers handle payload shape, ordering, index
/// attribution and validation uniformly.
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Canonical (lowercase) provider name.
    fn name(&self) -> &'static str;

    /// Whether payloads from this provider carry a signature to verify.
    /// Providers without a signing scheme opt out here; the secret
    /// configuration can additionally disable verification per deployment.
    fn verifies_signature(&self) -> bool {
        true
    }

    /// Map one payload element to a normalized event.
    fn map_event(&self, object: &Map<String, Value>) -> Result<NormalizedEvent, EventFieldError>;

    /// Extract every event of a payload, in input order.
    fn extract_batch(&self, payload: &[u8]) -> Result<Vec<NormalizedEvent>, AdapterError> {
        let elements = parse_one_or_many(payload)?;
        let mut events = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let object = element
                .as_object()
                .ok_or(AdapterError::UnsupportedShape)?;
            let event = self
                .map_event(object)
                .and_then(|event| {
                    event.validate()?;
                    Ok(event)
                })
                .map_err(|source| AdapterError::Event { index, source })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Extract exactly one event.
    ///
    /// Zero or more than one result means the caller used the wrong code
    /// path and is reported as an error, not truncated.
    fn extract_single(&self, payload: &[u8]) -> Result<NormalizedEvent, AdapterError> {
        let mut events = self.extract_batch(payload)?;
        match events.len() {
            1 => match events.pop() {
                Some(event) => Ok(event),
                None => Err(AdapterError::Empty),
            },
            0 => Err(AdapterError::Empty),
            n => Err(AdapterError::NotSingleton(n)),
        }
    }
}

/// The built-in adapter set, used to seed a registry.
pub fn standard_adapters() -> Vec<Arc<dyn ProviderAdapter>> {
    vec![
        Arc::new(GenericAdapter),
        Arc::new(OptaAdapter),
        Arc::new(WyscoutAdapter),
    ]
}

/// Split a payload into its elements: a JSON array yields its items, a
/// single object yields one element. Anything else is a shape error.
fn parse_one_or_many(payload: &[u8]) -> Result<Vec<Value>, AdapterError> {
    let value: Value = serde_json::from_slice(payload)?;
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(AdapterError::Empty);
            }
            Ok(items)
        }
        object @ Value::Object(_) => Ok(vec![object]),
        _ => Err(AdapterError::UnsupportedShape),
    }
}

// --- shared field accessors -------------------------------------------------

/// Read a required identifier that may arrive as a JSON number or a
/// numeric string; unparsable strings are rejected.
pub(crate) fn require_id(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<i64, EventFieldError> {
    optional_id(object, field)?.ok_or(EventFieldError::MissingField(field))
}

/// [`require_id`], but absent/null fields yield `None`.
pub(crate) fn optional_id(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, EventFieldError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            EventFieldError::InvalidField {
                field,
                detail: format!("{n} is not an integer identifier"),
            }
        }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| EventFieldError::InvalidField {
                field,
                detail: format!("{s:?} is not a numeric identifier"),
            }),
        Some(other) => Err(EventFieldError::InvalidField {
            field,
            detail: format!("expected identifier, got {other}"),
        }),
    }
}

pub(crate) fn require_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, EventFieldError> {
    optional_str(object, field)?.ok_or(EventFieldError::MissingField(field))
}

pub(crate) fn optional_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, EventFieldError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(EventFieldError::InvalidField {
            field,
            detail: format!("expected string, got {other}"),
        }),
    }
}

pub(crate) fn require_u8(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<u8, EventFieldError> {
    optional_u8(object, field)?.ok_or(EventFieldError::MissingField(field))
}

pub(crate) fn optional_u8(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u8>, EventFieldError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| EventFieldError::InvalidField {
                field,
                detail: format!("{n} is out of range"),
            }),
        Some(other) => Err(EventFieldError::InvalidField {
            field,
            detail: format!("expected small integer, got {other}"),
        }),
    }
}

pub(crate) fn optional_f32(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f32>, EventFieldError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(|v| Some(v as f32)).ok_or_else(|| {
            EventFieldError::InvalidField {
                field,
                detail: format!("{n} is not a float"),
            }
        }),
        Some(other) => Err(EventFieldError::InvalidField {
            field,
            detail: format!("expected number, got {other}"),
        }),
    }
}

/// Copy a provider field into the metadata bag verbatim, if present.
pub(crate) fn stash_metadata(
    metadata: &mut Map<String, Value>,
    object: &Map<String, Value>,
    field: &str,
    key: &str,
) {
    if let Some(value) = object.get(field)
        && !value.is_null()
    {
        metadata.insert(key.to_string(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn array_is_attempted_before_object() {
        let payload = serde_json::to_vec(&json!([
            {"match_id": 1, "event_type": "goal", "minute": 10},
            {"match_id": 1, "event_type": "pass", "minute": 11}
        ]))
        .unwrap();
        let events = GenericAdapter.extract_batch(&payload).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type.as_str(), "goal");
        assert_eq!(events[1].event_type.as_str(), "pass");
    }

    #[test]
    fn single_object_falls_back() {
        let payload =
            serde_json::to_vec(&json!({"match_id": 1, "event_type": "goal", "minute": 10}))
                .unwrap();
        let events = GenericAdapter.extract_batch(&payload).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn non_json_is_a_parse_error() {
        let err = GenericAdapter.extract_batch(b"not json at all").unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
    }

    #[test]
    fn scalar_json_is_a_shape_error() {
        let err = GenericAdapter.extract_batch(b"42").unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedShape));
    }

    #[test]
    fn batch_failure_reports_the_index() {
        let payload = serde_json::to_vec(&json!([
            {"match_id": 1, "event_type": "goal", "minute": 10},
            {"match_id": 1, "event_type": "not valid!", "minute": 11},
            {"match_id": 1, "event_type": "pass", "minute": 12}
        ]))
        .unwrap();
        match GenericAdapter.extract_batch(&payload).unwrap_err() {
            AdapterError::Event { index, .. } => assert_eq!(index, 1),
            other => panic!("expected index attribution, got {other:?}"),
        }
    }

    #[test]
    fn single_extraction_rejects_batches() {
        let payload = serde_json::to_vec(&json!([
            {"match_id": 1, "event_type": "goal", "minute": 10},
            {"match_id": 1, "event_type": "pass", "minute": 11}
        ]))
        .unwrap();
        match GenericAdapter.extract_single(&payload).unwrap_err() {
            AdapterError::NotSingleton(n) => assert_eq!(n, 2),
            other => panic!("expected NotSingleton, got {other:?}"),
        }
    }

    #[test]
    fn empty_array_is_rejected() {
        let err = GenericAdapter.extract_batch(b"[]").unwrap_err();
        assert!(matches!(err, AdapterError::Empty));
    }

    #[test]
    fn string_ids_parse_and_garbage_ids_reject() {
        let object = json!({"id": "12345"});
        let object = object.as_object().unwrap();
        assert_eq!(require_id(object, "id").unwrap(), 12345);

        let object = json!({"id": "12x45"});
        let object = object.as_object().unwrap();
        assert!(matches!(
            require_id(object, "id").unwrap_err(),
            EventFieldError::InvalidField { field: "id", .. }
        ));
    }
}
