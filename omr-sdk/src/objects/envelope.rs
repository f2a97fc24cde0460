//! Broadcast envelope types for the live delivery stream.
//!
//! The `GET /matches/{match_id}/live` endpoint upgrades to a WebSocket and
//! pushes [`BroadcastEnvelope`] JSON frames:
//!
//! ```json
//! {"type":"event","match_id":88001,"timestamp":1754650000,"data":{...}}
//! {"type":"score_update","match_id":88001,"timestamp":1754650001,"data":{...}}
//! ```
//!
//! The `data` payload is opaque at the envelope level; its shape is
//! determined by the `type` discriminator. [`MatchEventData`],
//! [`ScoreUpdateData`] and [`StatusUpdateData`] are the documented shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of message carried by a [`BroadcastEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// A normalized match event was recorded.
    Event,
    /// The score changed (derived from a goal-category event that carried
    /// score metadata).
    ScoreUpdate,
    /// The match state changed (kick-off, half-time, full-time, ...).
    StatusUpdate,
}

impl std::fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeKind::Event => write!(f, "event"),
            EnvelopeKind::ScoreUpdate => write!(f, "score_update"),
            EnvelopeKind::StatusUpdate => write!(f, "status_update"),
        }
    }
}

/// The wire message pushed to live clients and appended to the ordered log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    /// Message kind; determines the shape of `data`.
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    /// The match this message belongs to.
    pub match_id: i64,
    /// Unix timestamp at which the envelope was produced.
    pub timestamp: i64,
    /// Kind-shaped payload.
    pub data: serde_json::Value,
}

impl BroadcastEnvelope {
    /// Build an envelope of the given kind, stamped with the current time.
    ///
    /// Serialization of the payload cannot fail for the documented data
    /// shapes; a failure is reported as `serde_json::Error` anyway rather
    /// than being swallowed.
    pub fn new<T: Serialize>(
        kind: EnvelopeKind,
        match_id: i64,
        data: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind,
            match_id,
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// Payload for [`EnvelopeKind::Event`]: the persisted event as seen by
/// consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEventData {
    pub event_id: Uuid,
    pub match_id: i64,
    pub event_type: String,
    /// Coarse analytics category of `event_type`.
    pub category: String,
    pub minute: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_minute: Option<u8>,
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_player_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    /// Unix timestamp at which the event was durably recorded.
    pub recorded_at: i64,
}

/// Payload for [`EnvelopeKind::ScoreUpdate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdateData {
    pub event_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<i64>,
    pub minute: u8,
    pub home_score: i64,
    pub away_score: i64,
}

/// Payload for [`EnvelopeKind::StatusUpdate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateData {
    pub event_id: Uuid,
    /// The match-state event type ("kick_off", "half_time", ...).
    pub status: String,
    pub minute: u8,
    pub period: String,
}

/// Well-known WebSocket close codes used by the live delivery stream.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;

    /// The requested match does not exist.
    pub const MATCH_NOT_FOUND: u16 = 4004;

    /// The connection missed its heartbeat deadline.
    pub const IDLE_TIMEOUT: u16 = 4008;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wire_shape() {
        let data = StatusUpdateData {
            event_id: Uuid::nil(),
            status: "half_time".to_string(),
            minute: 45,
            period: "first_half".to_string(),
        };
        let envelope = BroadcastEnvelope::new(EnvelopeKind::StatusUpdate, 42, &data).unwrap();
        let json: serde_json::Value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["type"], "status_update");
        assert_eq!(json["match_id"], 42);
        assert!(json["timestamp"].is_i64());
        assert_eq!(json["data"]["status"], "half_time");
    }

    #[test]
    fn envelope_roundtrip() {
        let raw = r#"{"type":"event","match_id":7,"timestamp":1754650000,"data":{"k":1}}"#;
        let envelope: BroadcastEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.kind, EnvelopeKind::Event);
        assert_eq!(envelope.match_id, 7);
        assert_eq!(envelope.data["k"], 1);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let data = MatchEventData {
            event_id: Uuid::nil(),
            match_id: 1,
            event_type: "goal".to_string(),
            category: "goal".to_string(),
            minute: 45,
            second: None,
            extra_minute: None,
            period: "first_half".to_string(),
            team_id: Some(10),
            player_id: None,
            related_player_id: None,
            position_x: None,
            position_y: None,
            description: None,
            metadata: serde_json::json!({}),
            recorded_at: 0,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("second").is_none());
        assert!(json.get("player_id").is_none());
        assert_eq!(json["team_id"], 10);
    }
}
