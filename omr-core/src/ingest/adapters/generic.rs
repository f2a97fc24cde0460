//! The generic adapter: payloads already in the relay's own field names.
//!
//! This is the format first-party tooling and the SDK producer client
//! speak. Field names match [`NormalizedEvent`] directly; `period` is
//! optional and re-derived from elapsed time when absent or unrecognized.

use serde_json::{Map, Value};

use super::{
    EventFieldError, ProviderAdapter, optional_f32, optional_id, optional_str, optional_u8,
    require_id, require_str, require_u8, stash_metadata,
};
use crate::ingest::event::NormalizedEvent;
use crate::taxonomy::{EventType, Period};

#[derive(Debug)]
pub struct GenericAdapter;

impl ProviderAdapter for GenericAdapter {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn map_event(&self, object: &Map<String, Value>) -> Result<NormalizedEvent, EventFieldError> {
        let match_id = require_id(object, "match_id")?;
        let event_type = EventType::normalize(require_str(object, "event_type")?);
        let minute = require_u8(object, "minute")?;
        let second = optional_u8(object, "second")?;
        let extra_minute = optional_u8(object, "extra_minute")?;

        let period = match optional_str(object, "period")? {
            Some(raw) => Period::normalize(raw).resolve(minute, extra_minute),
            None => Period::derive(minute, extra_minute),
        };

        let mut event = NormalizedEvent::new(match_id, event_type, minute, period);
        event.second = second;
        event.extra_minute = extra_minute;
        event.team_id = optional_id(object, "team_id")?;
        event.player_id = optional_id(object, "player_id")?;
        event.related_player_id = optional_id(object, "related_player_id")?;
        event.position_x = optional_f32(object, "position_x")?;
        event.position_y = optional_f32(object, "position_y")?;
        event.description = optional_str(object, "description")?.map(str::to_owned);

        if let Some(Value::Object(map)) = object.get("metadata") {
            event.metadata = map.clone();
        }
        stash_metadata(&mut event.metadata, object, "external_id", "external_id");

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn extract(value: Value) -> NormalizedEvent {
        let payload = serde_json::to_vec(&value).unwrap();
        GenericAdapter.extract_single(&payload).unwrap()
    }

    #[test]
    fn full_event_maps() {
        let event = extract(json!({
            "match_id": 88001,
            "event_type": "Goal",
            "minute": 67,
            "second": 12,
            "period": "2H",
            "team_id": 5,
            "player_id": "909",
            "related_player_id": 910,
            "position_x": 88.5,
            "position_y": 44.0,
            "description": "header from the cross",
            "metadata": {"xg": 0.31, "body_part": "head"},
            "external_id": "prov-123"
        }));
        assert_eq!(event.match_id, 88001);
        assert_eq!(event.event_type.as_str(), "goal");
        assert_eq!(event.minute, 67);
        assert_eq!(event.second, Some(12));
        assert_eq!(event.period, Period::SecondHalf);
        assert_eq!(event.player_id, Some(909));
        assert_eq!(event.position_x, Some(88.5));
        assert_eq!(event.metadata["xg"], json!(0.31));
        assert_eq!(event.metadata["external_id"], json!("prov-123"));
    }

    #[test]
    fn period_is_derived_when_absent() {
        let event = extract(json!({"match_id": 1, "event_type": "goal", "minute": 45}));
        assert_eq!(event.period, Period::FirstHalf);
        let event = extract(json!({
            "match_id": 1, "event_type": "goal", "minute": 92, "extra_minute": 2
        }));
        assert_eq!(event.period, Period::ExtraTimeFirst);
    }

    #[test]
    fn unrecognized_period_is_rederived() {
        let event = extract(json!({
            "match_id": 1, "event_type": "goal", "minute": 70, "period": "whatever"
        }));
        assert_eq!(event.period, Period::SecondHalf);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let payload = serde_json::to_vec(&json!({"event_type": "goal", "minute": 3})).unwrap();
        let err = GenericAdapter.extract_single(&payload).unwrap_err();
        assert!(err.to_string().contains("match_id"));
    }
}
