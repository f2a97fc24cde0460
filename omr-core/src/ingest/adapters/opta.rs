//! Adapter for Opta-style F24 event feeds.
//!
//! Characteristics of the format:
//!
//! - identifiers arrive as numeric strings (`"matchId": "2372231"`),
//! - the event type is a numeric `typeId` resolved through a lookup table,
//!   with an optional `typeName` taking precedence when present,
//! - the period is a numeric `periodId` 1–5,
//! - coordinates are `x`/`y` floats on a 0–100 grid,
//! - everything else of interest travels in a `qualifiers` list.

use serde_json::{Map, Value};

use super::{
    EventFieldError, ProviderAdapter, optional_f32, optional_id, optional_str, optional_u8,
    require_id, require_u8, stash_metadata,
};
use crate::ingest::event::NormalizedEvent;
use crate::taxonomy::{EventType, Period};

#[derive(Debug)]
pub struct OptaAdapter;

/// Map an F24 `typeId` to an internal event type name.
///
/// Only the commonly observed subset; unknown ids are rejected so a feed
/// misconfiguration surfaces instead of flooding the store with opaque
/// types.
fn type_name_for_id(type_id: u64) -> Option<&'static str> {
    match type_id {
        1 => Some("pass"),
        3 => Some("take_on"),
        4 => Some("foul"),
        6 => Some("corner_awarded"),
        7 => Some("tackle"),
        8 => Some("interception"),
        10 => Some("save"),
        11 => Some("claim"),
        12 => Some("clearance"),
        13 => Some("shot_off_target"),
        14 => Some("post"),
        15 => Some("attempt_saved"),
        16 => Some("goal"),
        17 => Some("card"),
        18 => Some("player_off"),
        19 => Some("player_on"),
        32 => Some("kick_off"),
        30 => Some("period_end"),
        _ => None,
    }
}

impl ProviderAdapter for OptaAdapter {
    fn name(&self) -> &'static str {
        "opta"
    }

    fn map_event(&self, object: &Map<String, Value>) -> Result<NormalizedEvent, EventFieldError> {
        let match_id = require_id(object, "matchId")?;

        let event_type = match optional_str(object, "typeName")? {
            Some(name) => EventType::normalize(name),
            None => {
                let type_id = object
                    .get("typeId")
                    .and_then(Value::as_u64)
                    .ok_or(EventFieldError::MissingField("typeId"))?;
                let name = type_name_for_id(type_id).ok_or(EventFieldError::InvalidField {
                    field: "typeId",
                    detail: format!("unknown event type id {type_id}"),
                })?;
                EventType::normalize(name)
            }
        };

        let minute = require_u8(object, "min")?;
        let second = optional_u8(object, "sec")?;
        let extra_minute = optional_u8(object, "expandedMin")?;

        let period = match optional_u8(object, "periodId")? {
            Some(code) => {
                Period::from_code(code).unwrap_or_else(|| Period::derive(minute, extra_minute))
            }
            None => Period::derive(minute, extra_minute),
        };

        let mut event = NormalizedEvent::new(match_id, event_type, minute, period);
        event.second = second;
        event.extra_minute = extra_minute;
        event.team_id = optional_id(object, "teamId")?;
        event.player_id = optional_id(object, "playerId")?;
        event.related_player_id = optional_id(object, "relatedPlayerId")?;

        // Both coordinates or neither; a lone axis is dropped rather than
        // inventing a position.
        let x = optional_f32(object, "x")?;
        let y = optional_f32(object, "y")?;
        if let (Some(x), Some(y)) = (x, y) {
            event.position_x = Some(x);
            event.position_y = Some(y);
        }

        stash_metadata(&mut event.metadata, object, "id", "external_id");
        stash_metadata(&mut event.metadata, object, "qualifiers", "qualifiers");
        stash_metadata(&mut event.metadata, object, "outcome", "outcome");
        stash_metadata(&mut event.metadata, object, "keyPass", "key_pass");
        stash_metadata(&mut event.metadata, object, "assist", "assist");

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
        OptaAdapter.extract_single(&payload).unwrap()
    }

    #[test]
    fn goal_event_maps() {
        let event = extract(json!({
            "id": "2173501921",
            "matchId": "2372231",
            "typeId": 16,
            "periodId": 2,
            "min": 73,
            "sec": 22,
            "teamId": "43",
            "playerId": "82403",
            "x": 94.1,
            "y": 48.7,
            "outcome": 1,
            "qualifiers": [{"qualifierId": 22}, {"qualifierId": 233, "value": "248"}]
        }));
        assert_eq!(event.match_id, 2372231);
        assert_eq!(event.event_type.as_str(), "goal");
        assert_eq!(event.period, Period::SecondHalf);
        assert_eq!(event.team_id, Some(43));
        assert_eq!(event.position_x, Some(94.1));
        assert_eq!(event.metadata["external_id"], json!("2173501921"));
        assert!(event.metadata["qualifiers"].is_array());
    }

    #[test]
    fn unparsable_string_id_is_rejected() {
        let payload = serde_json::to_vec(&json!({
            "matchId": "not-a-number", "typeId": 1, "min": 10
        }))
        .unwrap();
        let err = OptaAdapter.extract_single(&payload).unwrap_err();
        assert!(err.to_string().contains("matchId"));
    }

    #[test]
    fn unknown_type_id_is_rejected() {
        let payload = serde_json::to_vec(&json!({
            "matchId": "1", "typeId": 9999, "min": 10
        }))
        .unwrap();
        let err = OptaAdapter.extract_single(&payload).unwrap_err();
        assert!(err.to_string().contains("typeId"));
    }

    #[test]
    fn type_name_takes_precedence() {
        let event = extract(json!({
            "matchId": "1", "typeId": 16, "typeName": "own_goal", "min": 10, "periodId": 1
        }));
        assert_eq!(event.event_type.as_str(), "own_goal");
    }

    #[test]
    fn lone_coordinate_is_dropped() {
        let event = extract(json!({
            "matchId": "1", "typeId": 1, "min": 10, "periodId": 1, "x": 30.0
        }));
        assert_eq!(event.position_x, None);
        assert_eq!(event.position_y, None);
    }

    #[test]
    fn out_of_range_period_code_falls_back_to_derivation() {
        let event = extract(json!({
            "matchId": "1", "typeId": 1, "min": 70, "periodId": 14
        }));
        assert_eq!(event.period, Period::SecondHalf);
    }
}
