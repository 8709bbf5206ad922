//! Activity classification types and the impact model.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Work,
    Rest,
    Eating,
    Social,
    Passive,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Work => "work",
            ActivityType::Rest => "rest",
            ActivityType::Eating => "eating",
            ActivityType::Social => "social",
            ActivityType::Passive => "passive",
        }
    }

    /// Cheap keyword match used for memory summaries. `None` means "other".
    pub fn from_keywords(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["work", "job", "portfolio"]) {
            Some(ActivityType::Work)
        } else if has(&["rest", "sleep", "nap"]) {
            Some(ActivityType::Rest)
        } else if has(&["eat", "snack", "food"]) {
            Some(ActivityType::Eating)
        } else if has(&["chat", "discord", "social"]) {
            Some(ActivityType::Social)
        } else if has(&["tiktok", "scroll", "watch"]) {
            Some(ActivityType::Passive)
        } else {
            None
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured impact of one activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityAnalysis {
    pub activity_type: ActivityType,
    /// 0.1 - 1.0
    pub intensity: f32,
    /// -0.1 - 0.1
    pub energy_impact: f32,
    /// -0.1 - 0.1
    pub mood_impact: f32,
    /// Whether the activity suits the current energy level
    pub is_appropriate: bool,
}

impl ActivityAnalysis {
    /// The single safe default used whenever impact cannot be determined.
    pub fn fallback() -> Self {
        Self {
            activity_type: ActivityType::Passive,
            intensity: 0.1,
            energy_impact: -0.02,
            mood_impact: 0.0,
            is_appropriate: true,
        }
    }

    /// Clamp every numeric field into its documented range.
    ///
    /// Non-finite values are treated as out of contract and yield `None`.
    pub fn bounded(self) -> Option<Self> {
        let finite = [self.intensity, self.energy_impact, self.mood_impact]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return None;
        }
        Some(Self {
            intensity: self.intensity.clamp(0.1, 1.0),
            energy_impact: self.energy_impact.clamp(-0.1, 0.1),
            mood_impact: self.mood_impact.clamp(-0.1, 0.1),
            ..self
        })
    }

    /// `impact * (1 + intensity)`, amplified by 1.5 when the activity does not
    /// suit the current energy level.
    pub fn energy_change(&self) -> f32 {
        let mut change = self.energy_impact * (1.0 + self.intensity);
        if !self.is_appropriate {
            change *= 1.5;
        }
        change
    }

    /// Appropriate activities amplify the mood impact, inappropriate ones
    /// dampen it.
    pub fn mood_change(&self) -> f32 {
        if self.is_appropriate {
            self.mood_impact * (1.0 + self.intensity * 0.5)
        } else {
            self.mood_impact * (1.0 - self.intensity * 0.5)
        }
    }
}
