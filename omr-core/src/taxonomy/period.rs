//! Match periods: numeric provider codes, free-form spellings, and
//! time-based derivation.

use serde::{Deserialize, Serialize};

/// The period of the match an event belongs to.
///
/// [`Period::Regular`] is a neutral sentinel produced by
/// [`Period::normalize`] for unrecognized spellings; callers that need a
/// concrete half re-derive with [`Period::resolve`] before the value
/// leaves the normalizer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "match_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Period {
    FirstHalf,
    SecondHalf,
    ExtraTimeFirst,
    ExtraTimeSecond,
    Penalties,
    Regular,
}

impl Period {
    /// Derive the period from elapsed time.
    ///
    /// An extra-minute marker > 0 means extra time, split at minute 105.
    /// Without a marker: minute ≤ 45 is the first half, everything else —
    /// including minutes past 90, where stoppage time is indistinguishable
    /// from extra time — is the second half.
    pub fn derive(minute: u8, extra_minute: Option<u8>) -> Period {
        match extra_minute {
            Some(extra) if extra > 0 => {
                if minute <= 105 {
                    Period::ExtraTimeFirst
                } else {
                    Period::ExtraTimeSecond
                }
            }
            _ => {
                if minute <= 45 {
                    Period::FirstHalf
                } else {
                    Period::SecondHalf
                }
            }
        }
    }

    /// Map a numeric provider period code (1–5) to a period.
    pub fn from_code(code: u8) -> Option<Period> {
        match code {
            1 => Some(Period::FirstHalf),
            2 => Some(Period::SecondHalf),
            3 => Some(Period::ExtraTimeFirst),
            4 => Some(Period::ExtraTimeSecond),
            5 => Some(Period::Penalties),
            _ => None,
        }
    }

    /// Normalize a free-form provider period spelling.
    ///
    /// Case-insensitive; separators (`_`, `-`, spaces) are ignored, so
    /// `"1H"`, `"first_half"` and `"FirstHalf"` all map to
    /// [`Period::FirstHalf`]. Unrecognized input maps to
    /// [`Period::Regular`].
    pub fn normalize(raw: &str) -> Period {
        let folded: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "1h" | "h1" | "1" | "first" | "firsthalf" | "firstperiod" => Period::FirstHalf,
            "2h" | "h2" | "2" | "second" | "secondhalf" | "secondperiod" => Period::SecondHalf,
            "e1" | "et1" | "ot1" | "extratimefirst" | "firstextra" | "extrafirst" => {
                Period::ExtraTimeFirst
            }
            "e2" | "et2" | "ot2" | "extratimesecond" | "secondextra" | "extrasecond" => {
                Period::ExtraTimeSecond
            }
            "p" | "pen" | "pens" | "penalties" | "penaltyshootout" | "shootout" => {
                Period::Penalties
            }
            _ => Period::Regular,
        }
    }

    /// Replace the [`Period::Regular`] sentinel with a time-derived period.
    pub fn resolve(self, minute: u8, extra_minute: Option<u8>) -> Period {
        match self {
            Period::Regular => Period::derive(minute, extra_minute),
            concrete => concrete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FirstHalf => "first_half",
            Period::SecondHalf => "second_half",
            Period::ExtraTimeFirst => "extra_time_first",
            Period::ExtraTimeSecond => "extra_time_second",
            Period::Penalties => "penalties",
            Period::Regular => "regular",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_regulation_time() {
        assert_eq!(Period::derive(0, None), Period::FirstHalf);
        assert_eq!(Period::derive(30, None), Period::FirstHalf);
        assert_eq!(Period::derive(45, None), Period::FirstHalf);
        assert_eq!(Period::derive(46, None), Period::SecondHalf);
        assert_eq!(Period::derive(70, None), Period::SecondHalf);
        assert_eq!(Period::derive(90, None), Period::SecondHalf);
        // Past 90 with no extra-minute marker stays second half.
        assert_eq!(Period::derive(93, None), Period::SecondHalf);
        assert_eq!(Period::derive(93, Some(0)), Period::SecondHalf);
    }

    #[test]
    fn derive_extra_time() {
        assert_eq!(Period::derive(92, Some(2)), Period::ExtraTimeFirst);
        assert_eq!(Period::derive(105, Some(1)), Period::ExtraTimeFirst);
        assert_eq!(Period::derive(106, Some(1)), Period::ExtraTimeSecond);
        assert_eq!(Period::derive(120, Some(3)), Period::ExtraTimeSecond);
    }

    #[test]
    fn numeric_codes() {
        assert_eq!(Period::from_code(1), Some(Period::FirstHalf));
        assert_eq!(Period::from_code(5), Some(Period::Penalties));
        assert_eq!(Period::from_code(0), None);
        assert_eq!(Period::from_code(6), None);
    }

    #[test]
    fn spellings() {
        for raw in ["1H", "first_half", "firsthalf", "FIRST HALF", "h1"] {
            assert_eq!(Period::normalize(raw), Period::FirstHalf, "{raw}");
        }
        for raw in ["ET1", "e1", "extra-time-first"] {
            assert_eq!(Period::normalize(raw), Period::ExtraTimeFirst, "{raw}");
        }
        assert_eq!(Period::normalize("P"), Period::Penalties);
        assert_eq!(Period::normalize("halftime-ish"), Period::Regular);
        assert_eq!(Period::normalize(""), Period::Regular);
    }

    #[test]
    fn resolve_replaces_sentinel_only() {
        assert_eq!(Period::Regular.resolve(30, None), Period::FirstHalf);
        assert_eq!(Period::Regular.resolve(70, None), Period::SecondHalf);
        assert_eq!(Period::Penalties.resolve(30, None), Period::Penalties);
    }
}
