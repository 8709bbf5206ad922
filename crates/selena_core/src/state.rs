//! Character state
//!
//! `AiState` is the one mutable record of energy and mood. The fixed
//! personality traits live in `Personality`; anything that needs the full
//! trait vector takes a `Traits` snapshot built from both, so there is a
//! single update path and no second copy to drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-tick deltas are scaled down by this factor before being applied.
pub const DELTA_SCALE: f32 = 0.1;

/// Energy on first boot.
pub const DEFAULT_ENERGY: f32 = 1.0;
/// Mood on first boot.
pub const DEFAULT_MOOD: f32 = 0.8;
/// Mood the character wakes up with after a rest episode.
pub const WOKE_UP_MOOD: f32 = 0.8;

/// Guard against NaN and Infinity, then clamp into [0, 1].
#[inline]
pub fn clamp01(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        tracing::warn!("NaN/Inf detected in state, resetting to fallback {}", fallback);
        fallback
    }
}

/// Persisted energy/mood record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiState {
    /// 0.0 (exhausted) - 1.0 (fully rested)
    pub energy: f32,
    /// 0.0 (miserable) - 1.0 (elated)
    pub mood: f32,
    pub last_update: DateTime<Utc>,
}

impl AiState {
    pub fn new(energy: f32, mood: f32, at: DateTime<Utc>) -> Self {
        Self {
            energy: clamp01(energy, DEFAULT_ENERGY),
            mood: clamp01(mood, DEFAULT_MOOD),
            last_update: at,
        }
    }

    pub fn initial(at: DateTime<Utc>) -> Self {
        Self::new(DEFAULT_ENERGY, DEFAULT_MOOD, at)
    }

    /// Apply raw deltas, scaled by [`DELTA_SCALE`], keeping both values in [0, 1].
    pub fn apply(&self, energy_delta: f32, mood_delta: f32, at: DateTime<Utc>) -> Self {
        Self {
            energy: clamp01(self.energy + energy_delta * DELTA_SCALE, self.energy),
            mood: clamp01(self.mood + mood_delta * DELTA_SCALE, self.mood),
            last_update: at,
        }
    }

    /// Bring values loaded from disk back into range.
    pub fn normalize(&mut self) {
        self.energy = clamp01(self.energy, DEFAULT_ENERGY);
        self.mood = clamp01(self.mood, DEFAULT_MOOD);
    }
}

/// Immutable traits fixed at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    pub curiosity: f32,
    pub empathy: f32,
    pub humor: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            name: "Selena".to_string(),
            curiosity: 0.7,
            empathy: 0.5,
            humor: 0.2,
        }
    }
}

impl Personality {
    /// Combine with the current state into a read-only trait vector.
    pub fn snapshot(&self, state: &AiState) -> Traits {
        Traits {
            curiosity: clamp01(self.curiosity, 0.5),
            empathy: clamp01(self.empathy, 0.5),
            humor: clamp01(self.humor, 0.5),
            mood: state.mood,
            energy: state.energy,
        }
    }
}

/// Read-only view of all five traits at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub curiosity: f32,
    pub empathy: f32,
    pub humor: f32,
    pub mood: f32,
    pub energy: f32,
}
