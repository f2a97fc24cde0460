//! Event taxonomy: validated open event-type strings, coarse analytics
//! categories, and match periods.
//!
//! The event-type set is deliberately open-ended: providers ship thousands
//! of type names and new ones appear without notice, so the taxonomy
//! validates a character class instead of enumerating types. Analytics
//! grouping happens through [`Category`], a separate classification that
//! maps unrecognized-but-valid types to [`Category::Other`] instead of
//! rejecting them.

mod period;

pub use period::Period;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Maximum accepted length of a normalized event type.
pub const MAX_EVENT_TYPE_LEN: usize = 50;

/// Taxonomy validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    #[error("event type is empty")]
    EmptyEventType,
    #[error("event type {0:?} exceeds {MAX_EVENT_TYPE_LEN} characters")]
    EventTypeTooLong(String),
    #[error("event type {0:?} contains characters outside [a-z0-9_]")]
    InvalidEventTypeChars(String),
}

/// A normalized event-type string.
///
/// Always lowercase and trimmed. Construction through [`EventType::parse`]
/// guarantees validity; [`EventType::normalize`] alone does not (use it
/// when the caller wants to inspect the normalized form of an invalid
/// input).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct EventType(CompactString);

impl EventType {
    /// Lowercase and trim a raw provider string. Idempotent.
    pub fn normalize(raw: &str) -> Self {
        Self(CompactString::from(raw.trim().to_lowercase()))
    }

    /// Whether this value passes taxonomy validation: non-empty, at most
    /// [`MAX_EVENT_TYPE_LEN`] characters, lowercase letters, digits and
    /// underscore only.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_EVENT_TYPE_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    }

    /// Normalize and validate in one step.
    pub fn parse(raw: &str) -> Result<Self, TaxonomyError> {
        let normalized = Self::normalize(raw);
        if normalized.0.is_empty() {
            return Err(TaxonomyError::EmptyEventType);
        }
        if normalized.0.len() > MAX_EVENT_TYPE_LEN {
            return Err(TaxonomyError::EventTypeTooLong(normalized.0.into()));
        }
        if !normalized.is_valid() {
            return Err(TaxonomyError::InvalidEventTypeChars(normalized.0.into()));
        }
        Ok(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coarse analytics category of this type.
    pub fn category(&self) -> Category {
        Category::of(self)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse analytics bucket for an [`EventType`].
///
/// Used only for downstream grouping; membership is advisory and the
/// buckets are intentionally small. Valid types outside every bucket land
/// in [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Goal,
    Card,
    Substitution,
    Shot,
    Pass,
    Defensive,
    Duel,
    Foul,
    Goalkeeper,
    VarReview,
    MatchState,
    Other,
}

impl Category {
    /// Classify a validated event type.
    pub fn of(event_type: &EventType) -> Category {
        match event_type.as_str() {
            "goal" | "own_goal" | "penalty_goal" => Category::Goal,
            "card" | "yellow_card" | "red_card" | "second_yellow" => Category::Card,
            "substitution" | "sub_on" | "sub_off" | "player_on" | "player_off" => {
                Category::Substitution
            }
            "shot" | "shot_on_target" | "shot_off_target" | "shot_blocked" | "attempt_saved"
            | "post" | "miss" => Category::Shot,
            "pass" | "cross" | "corner" | "corner_awarded" | "through_ball" | "key_pass"
            | "assist" | "throw_in" | "free_kick_pass" => Category::Pass,
            "tackle" | "interception" | "clearance" | "block" | "ball_recovery" => {
                Category::Defensive
            }
            "duel" | "aerial_duel" | "ground_duel" | "take_on" => Category::Duel,
            "foul" | "foul_won" | "handball" | "offside" => Category::Foul,
            "save" | "claim" | "punch" | "smother" | "keeper_sweeper" | "goal_kick" => {
                Category::Goalkeeper
            }
            "var_review" | "var_goal_check" | "var_penalty_check" | "var_card_check" => {
                Category::VarReview
            }
            "kick_off" | "half_time" | "full_time" | "period_start" | "period_end"
            | "extra_time_start" | "penalty_shootout_start" | "match_postponed"
            | "match_abandoned" => Category::MatchState,
            _ => Category::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Goal => "goal",
            Category::Card => "card",
            Category::Substitution => "substitution",
            Category::Shot => "shot",
            Category::Pass => "pass",
            Category::Defensive => "defensive",
            Category::Duel => "duel",
            Category::Foul => "foul",
            Category::Goalkeeper => "goalkeeper",
            Category::VarReview => "var_review",
            Category::MatchState => "match_state",
            Category::Other => "other",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_character_class() {
        for raw in ["goal", "yellow_card", "var_goal_check", "a", "x9_1"] {
            assert!(EventType::normalize(raw).is_valid(), "{raw} should be valid");
        }
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert!(!EventType::normalize("").is_valid());
        assert!(!EventType::normalize("   ").is_valid());
        assert!(!EventType::normalize("goal!").is_valid());
        assert!(!EventType::normalize("goal scored").is_valid());
        assert!(!EventType::normalize("göal").is_valid());
        let long = "a".repeat(MAX_EVENT_TYPE_LEN + 1);
        assert!(!EventType::normalize(&long).is_valid());
        let max = "a".repeat(MAX_EVENT_TYPE_LEN);
        assert!(EventType::normalize(&max).is_valid());
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["  GOAL ", "Yellow_Card", "shot_on_target"] {
            let once = EventType::normalize(raw);
            let twice = EventType::normalize(once.as_str());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn parse_reports_the_failure() {
        assert_eq!(EventType::parse("  "), Err(TaxonomyError::EmptyEventType));
        assert!(matches!(
            EventType::parse("no spaces allowed"),
            Err(TaxonomyError::InvalidEventTypeChars(_))
        ));
        assert!(matches!(
            EventType::parse(&"b".repeat(60)),
            Err(TaxonomyError::EventTypeTooLong(_))
        ));
    }

    #[test]
    fn category_buckets() {
        let cases = [
            ("goal", Category::Goal),
            ("own_goal", Category::Goal),
            ("red_card", Category::Card),
            ("substitution", Category::Substitution),
            ("shot_on_target", Category::Shot),
            ("corner", Category::Pass),
            ("interception", Category::Defensive),
            ("aerial_duel", Category::Duel),
            ("offside", Category::Foul),
            ("save", Category::Goalkeeper),
            ("var_penalty_check", Category::VarReview),
            ("half_time", Category::MatchState),
        ];
        for (raw, expected) in cases {
            assert_eq!(EventType::normalize(raw).category(), expected, "{raw}");
        }
    }

    #[test]
    fn unknown_but_valid_types_are_other() {
        assert_eq!(
            EventType::normalize("provider_specific_thing_42").category(),
            Category::Other
        );
    }
}
