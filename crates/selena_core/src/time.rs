//! Time-of-day context
//!
//! Wall-clock time is split into four buckets on the character's local
//! calendar. The bucket drives the rest schedule and nudges how energetic
//! the character feels.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar bucket of the local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// [05:00, 12:00)
    Morning,
    /// [12:00, 18:00)
    Day,
    /// [18:00, 22:00)
    Evening,
    /// [22:00, 05:00), wraps midnight
    Night,
}

impl TimeOfDay {
    /// Classify any local time (or datetime) into its bucket.
    pub fn classify<T: Timelike>(instant: &T) -> Self {
        Self::from_hour(instant.hour())
    }

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Day,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Energy nudge for the bucket.
    pub fn energy_modifier(self) -> f32 {
        match self {
            TimeOfDay::Morning => 0.2,
            TimeOfDay::Day => 0.1,
            TimeOfDay::Evening => 0.0,
            TimeOfDay::Night => -0.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Day => "day",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phrases in a thought that signal the character wants to rest.
const REST_INDICATORS: &[&str] = &[
    "sleep",
    "rest",
    "tired",
    "exhausted",
    "bed",
    "nap",
    "need to rest",
    "going to sleep",
    "time to sleep",
    "feeling sleepy",
    "wanna sleep",
    "wanna rest",
];

/// Whether the character should consider resting.
///
/// Energy has to be below the bucket's threshold (0.3 at night, 0.2
/// otherwise) and at least one thought has to mention resting.
pub fn should_consider_rest<S: AsRef<str>>(energy: f32, bucket: TimeOfDay, thoughts: &[S]) -> bool {
    let threshold = if bucket == TimeOfDay::Night { 0.3 } else { 0.2 };
    if energy >= threshold {
        return false;
    }

    thoughts.iter().any(|thought| {
        let thought = thought.as_ref().to_lowercase();
        REST_INDICATORS
            .iter()
            .any(|indicator| thought.contains(indicator))
    })
}
