//! Time-to-resolution phases and their policy windows.
//!
//! | Phase          | Hours to resolution | Policy window |
//! |----------------|---------------------|---------------|
//! | `T_7d_3d`      | [72, 168)           | 24h           |
//! | `T_3d_1d`      | [24, 72)            | 12h           |
//! | `T_24h_6h`     | [6, 24)             | 6h            |
//! | `T_6h_1h`      | [1, 6)              | 1h            |
//! | `T_1h_close`   | [0, 1)              | 0.5h          |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bounds applied to the fallback policy window when the phase is unknown.
const FALLBACK_WINDOW_MIN_HOURS: f64 = 0.5;
const FALLBACK_WINDOW_MAX_HOURS: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "T_7d_3d")]
    SevenToThreeDays,
    #[serde(rename = "T_3d_1d")]
    ThreeDaysToOne,
    #[serde(rename = "T_24h_6h")]
    DayToSixHours,
    #[serde(rename = "T_6h_1h")]
    SixHoursToOne,
    #[serde(rename = "T_1h_close")]
    FinalHour,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::SevenToThreeDays,
        Phase::ThreeDaysToOne,
        Phase::DayToSixHours,
        Phase::SixHoursToOne,
        Phase::FinalHour,
    ];

    /// Bucket hours-to-resolution; anything outside `[0, 168)` has no phase.
    pub fn from_hours(hours: Option<f64>) -> Option<Self> {
        let hours = hours.filter(|h| h.is_finite())?;
        Self::ALL.into_iter().find(|phase| {
            let (lo, hi) = phase.bounds_hours();
            hours >= lo && hours < hi
        })
    }

    /// Half-open `[lo, hi)` bounds in hours.
    pub fn bounds_hours(&self) -> (f64, f64) {
        match self {
            Self::SevenToThreeDays => (72.0, 168.0),
            Self::ThreeDaysToOne => (24.0, 72.0),
            Self::DayToSixHours => (6.0, 24.0),
            Self::SixHoursToOne => (1.0, 6.0),
            Self::FinalHour => (0.0, 1.0),
        }
    }

    pub fn policy_window_hours(&self) -> f64 {
        match self {
            Self::SevenToThreeDays => 24.0,
            Self::ThreeDaysToOne => 12.0,
            Self::DayToSixHours => 6.0,
            Self::SixHoursToOne => 1.0,
            Self::FinalHour => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenToThreeDays => "T_7d_3d",
            Self::ThreeDaysToOne => "T_3d_1d",
            Self::DayToSixHours => "T_24h_6h",
            Self::SixHoursToOne => "T_6h_1h",
            Self::FinalHour => "T_1h_close",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length of the "wait" horizon for a decision.
///
/// Known phases use the table; otherwise `clip(ttr / 4, 0.5, 24)`, and the
/// upper bound when time-to-resolution itself is unknown.
pub fn policy_window_hours(phase: Option<Phase>, ttr_hours: Option<f64>) -> f64 {
    match (phase, ttr_hours.filter(|h| h.is_finite())) {
        (Some(phase), _) => phase.policy_window_hours(),
        (None, Some(ttr)) => (ttr / 4.0).clamp(FALLBACK_WINDOW_MIN_HOURS, FALLBACK_WINDOW_MAX_HOURS),
        (None, None) => FALLBACK_WINDOW_MAX_HOURS,
    }
}
