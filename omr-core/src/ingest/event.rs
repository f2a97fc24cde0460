//! The canonical in-flight event representation.

use serde_json::{Map, Value};

use crate::taxonomy::{EventType, Period, TaxonomyError};

/// Upper bound for the minute field (120 covers extra time).
pub const MAX_MINUTE: u8 = 120;

/// Coordinates are expressed on a 0–100 pitch grid on both axes.
pub const MAX_COORDINATE: f32 = 100.0;

/// Validation failure for a normalized event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error("minute {0} is out of range 0..={MAX_MINUTE}")]
    MinuteOutOfRange(u8),
    #[error("second {0} is out of range 0..=59")]
    SecondOutOfRange(u8),
    #[error("coordinate {0} is out of range 0.0..={MAX_COORDINATE}")]
    CoordinateOutOfRange(f32),
    #[error("position requires both x and y")]
    UnpairedPosition,
}

/// The provider-independent representation of one match occurrence,
/// produced by an adapter and consumed exactly once by the event store.
///
/// Construction does not imply validity; the adapter layer calls
/// [`NormalizedEvent::validate`] before any event leaves extraction, so an
/// invalid event is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub match_id: i64,
    pub event_type: EventType,
    pub minute: u8,
    pub second: Option<u8>,
    pub extra_minute: Option<u8>,
    pub period: Period,
    pub team_id: Option<i64>,
    pub player_id: Option<i64>,
    pub related_player_id: Option<i64>,
    pub position_x: Option<f32>,
    pub position_y: Option<f32>,
    pub description: Option<String>,
    /// Provider-specific fields carried verbatim (expected-goal value,
    /// outcome, body part, technique, pass end coordinates, external event
    /// id, ...).
    pub metadata: Map<String, Value>,
}

impl NormalizedEvent {
    /// Minimal constructor; optional fields start empty.
    pub fn new(match_id: i64, event_type: EventType, minute: u8, period: Period) -> Self {
        Self {
            match_id,
            event_type,
            minute,
            second: None,
            extra_minute: None,
            period,
            team_id: None,
            player_id: None,
            related_player_id: None,
            position_x: None,
            position_y: None,
            description: None,
            metadata: Map::new(),
        }
    }

    /// Enforce the field invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.event_type.is_valid() {
            // Re-run parse for the precise failure reason.
            EventType::parse(self.event_type.as_str())?;
        }
        if self.minute > MAX_MINUTE {
            return Err(ValidationError::MinuteOutOfRange(self.minute));
        }
        if let Some(second) = self.second
            && second > 59
        {
            return Err(ValidationError::SecondOutOfRange(second));
        }
        if self.position_x.is_some() != self.position_y.is_some() {
            return Err(ValidationError::UnpairedPosition);
        }
        for coordinate in [self.position_x, self.position_y].into_iter().flatten() {
            if !coordinate.is_finite() || !(0.0..=MAX_COORDINATE).contains(&coordinate) {
                return Err(ValidationError::CoordinateOutOfRange(coordinate));
            }
        }
        Ok(())
    }
}
