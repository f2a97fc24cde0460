//! Adapter for Wyscout-style event feeds.
//!
//! Characteristics of the format:
//!
//! - identifiers are plain JSON numbers,
//! - the event type is a name pair (`eventName` plus a more specific
//!   `subEventName`, which wins when present),
//! - time is `matchPeriod` (a short code such as `"1H"`, `"E1"`, `"P"`)
//!   plus `eventSec`, seconds elapsed within that period,
//! - `positions` is a list of `{x, y}` pairs: the first is the event
//!   location, a second one (pass/shot end location) goes to metadata,
//! - `tags` carry everything else and are passed through verbatim.

use serde_json::{Map, Value, json};

use super::{EventFieldError, ProviderAdapter, optional_id, optional_str, require_id, stash_metadata};
use crate::ingest::event::NormalizedEvent;
use crate::taxonomy::{EventType, Period};

#[derive(Debug)]
pub struct WyscoutAdapter;

/// Minute offset at which each period starts.
fn period_start_minute(period: Period) -> u8 {
    match period {
        Period::FirstHalf | Period::Regular => 0,
        Period::SecondHalf => 45,
        Period::ExtraTimeFirst => 90,
        Period::ExtraTimeSecond => 105,
        Period::Penalties => 120,
    }
}

fn coordinate_pair(value: &Value) -> Option<(f32, f32)> {
    let object = value.as_object()?;
    let x = object.get("x")?.as_f64()?;
    let y = object.get("y")?.as_f64()?;
    Some((x as f32, y as f32))
}

impl ProviderAdapter for WyscoutAdapter {
    fn name(&self) -> &'static str {
        "wyscout"
    }

    fn map_event(&self, object: &Map<String, Value>) -> Result<NormalizedEvent, EventFieldError> {
        let match_id = require_id(object, "matchId")?;

        let name = match optional_str(object, "subEventName")? {
            Some(sub) if !sub.is_empty() => sub,
            _ => require_str_event_name(object)?,
        };
        // Wyscout names are capitalized multi-word ("Simple pass"); fold
        // them into the internal character class.
        let event_type = EventType::normalize(&name.replace([' ', '-'], "_"));

        let period = match optional_str(object, "matchPeriod")? {
            Some(code) => Period::normalize(code),
            None => Period::Regular,
        };

        let event_sec = object
            .get("eventSec")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .max(0.0);
        let minute_in_period = (event_sec / 60.0) as u8;
        let minute = period_start_minute(period).saturating_add(minute_in_period);
        let second = (event_sec % 60.0) as u8;
        let period = period.resolve(minute, None);

        let mut event = NormalizedEvent::new(match_id, event_type, minute.min(120), period);
        event.second = Some(second.min(59));
        event.team_id = optional_id(object, "teamId")?;
        event.player_id = optional_id(object, "playerId")?;

        if let Some(Value::Array(positions)) = object.get("positions") {
            if let Some((x, y)) = positions.first().and_then(coordinate_pair) {
                event.position_x = Some(x);
                event.position_y = Some(y);
            }
            if let Some((x, y)) = positions.get(1).and_then(coordinate_pair) {
                event
                    .metadata
                    .insert("end_position".to_string(), json!({"x": x, "y": y}));
            }
        }

        stash_metadata(&mut event.metadata, object, "id", "external_id");
        stash_metadata(&mut event.metadata, object, "tags", "tags");
        stash_metadata(&mut event.metadata, object, "eventName", "event_name");

        Ok(event)
    }
}

fn require_str_event_name(object: &Map<String, Value>) -> Result<&str, EventFieldError> {
    match object.get("eventName") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => Err(EventFieldError::MissingField("eventName")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn extract(value: Value) -> NormalizedEvent {
        let payload = serde_json::to_vec(&value).unwrap();
        WyscoutAdapter.extract_single(&payload).unwrap()
    }

    #[test]
    fn pass_event_maps() {
        let event = extract(json!({
            "id": 253668702,
            "matchId": 2499719,
            "teamId": 1609,
            "playerId": 25413,
            "eventName": "Pass",
            "subEventName": "Simple pass",
            "matchPeriod": "1H",
            "eventSec": 2.76,
            "positions": [{"x": 49, "y": 49}, {"x": 31, "y": 78}],
            "tags": [{"id": 1801}]
        }));
        assert_eq!(event.match_id, 2499719);
        assert_eq!(event.event_type.as_str(), "simple_pass");
        assert_eq!(event.minute, 0);
        assert_eq!(event.second, Some(2));
        assert_eq!(event.period, Period::FirstHalf);
        assert_eq!(event.position_x, Some(49.0));
        assert_eq!(event.metadata["end_position"], json!({"x": 31.0, "y": 78.0}));
        assert_eq!(event.metadata["external_id"], json!(253668702));
        assert_eq!(event.metadata["event_name"], json!("Pass"));
    }

    #[test]
    fn second_half_minute_is_offset() {
        let event = extract(json!({
            "matchId": 1, "eventName": "Shot", "matchPeriod": "2H", "eventSec": 1510.0
        }));
        // 1510s = 25m10s into the second half.
        assert_eq!(event.minute, 70);
        assert_eq!(event.second, Some(10));
        assert_eq!(event.period, Period::SecondHalf);
    }

    #[test]
    fn extra_time_codes_map() {
        let event = extract(json!({
            "matchId": 1, "eventName": "Shot", "matchPeriod": "E1", "eventSec": 120.0
        }));
        assert_eq!(event.minute, 92);
        assert_eq!(event.period, Period::ExtraTimeFirst);
    }

    #[test]
    fn single_position_maps_only_the_event_location() {
        let event = extract(json!({
            "matchId": 1, "eventName": "Foul", "matchPeriod": "1H", "eventSec": 60.0,
            "positions": [{"x": 20, "y": 30}]
        }));
        assert_eq!(event.position_x, Some(20.0));
        assert!(event.metadata.get("end_position").is_none());
    }

    #[test]
    fn incomplete_position_pair_is_ignored() {
        let event = extract(json!({
            "matchId": 1, "eventName": "Foul", "matchPeriod": "1H", "eventSec": 60.0,
            "positions": [{"x": 20}]
        }));
        assert_eq!(event.position_x, None);
        assert_eq!(event.position_y, None);
    }
}
