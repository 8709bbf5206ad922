//! Rest episodes
//!
//! A rest episode replaces normal ticking with one long recovery timer.
//! Its length and recovery rate depend only on the bucket it starts in.

use chrono::{DateTime, Utc};
use regex::Regex;
use selena_core::state::{clamp01, WOKE_UP_MOOD};
use selena_core::{Phase, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

static RE_REST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(sleep\w*|slept|asleep|naps?|napping|rest|rests|resting|bed|bedtime)\b")
        .unwrap()
});

/// Whether any action describes resting, napping or going to bed.
pub fn mentions_rest<S: AsRef<str>>(actions: &[S]) -> bool {
    actions.iter().any(|a| RE_REST.is_match(a.as_ref()))
}

// =============================================================================
// Plan
// =============================================================================

/// How long a rest lasts and how fast it restores energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestPlan {
    pub duration: Duration,
    /// Fraction of full energy restored per minute of rest.
    pub recovery_per_minute: f32,
}

impl Default for RestPlan {
    /// 60 minutes at 5%/min, used when the bucket is unknown.
    fn default() -> Self {
        Self::minutes(60, 0.05)
    }
}

impl RestPlan {
    fn minutes(minutes: u64, recovery_per_minute: f32) -> Self {
        Self {
            duration: Duration::from_secs(minutes * 60),
            recovery_per_minute,
        }
    }

    pub fn for_bucket(bucket: TimeOfDay) -> Self {
        match bucket {
            TimeOfDay::Morning => Self::minutes(15, 0.10),
            TimeOfDay::Day => Self::minutes(60, 0.05),
            TimeOfDay::Evening | TimeOfDay::Night => Self::minutes(8 * 60, 0.15),
        }
    }

    pub fn duration_minutes(&self) -> f32 {
        self.duration.as_secs_f32() / 60.0
    }

    /// Energy after resting for the full plan, saturating at 1.0.
    pub fn recovered_energy(&self, start_energy: f32) -> f32 {
        let recovered = start_energy + self.recovery_per_minute * self.duration_minutes();
        clamp01(recovered.min(1.0), 1.0)
    }
}

// =============================================================================
// Episode
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestEpisode {
    pub plan: RestPlan,
    pub started_at: DateTime<Utc>,
    pub started_in: TimeOfDay,
    pub start_energy: f32,
    /// Energy the character wakes up with.
    pub recovered_energy: f32,
}

impl RestEpisode {
    pub fn begin(bucket: TimeOfDay, start_energy: f32, at: DateTime<Utc>) -> Self {
        let plan = RestPlan::for_bucket(bucket);
        Self {
            plan,
            started_at: at,
            started_in: bucket,
            start_energy,
            recovered_energy: plan.recovered_energy(start_energy),
        }
    }
}

/// What the character thinks and does on waking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeNarration {
    pub thoughts: String,
    pub actions: String,
}

impl WakeNarration {
    fn new(thoughts: impl Into<String>, actions: impl Into<String>) -> Self {
        Self {
            thoughts: thoughts.into(),
            actions: actions.into(),
        }
    }

    pub fn for_episode(episode: &RestEpisode, woke_in: TimeOfDay, elapsed_minutes: i64) -> Self {
        match (episode.started_in, woke_in) {
            (TimeOfDay::Evening | TimeOfDay::Night, TimeOfDay::Morning) => Self::new(
                "I slept through the night and woke up feeling refreshed. Good morning!",
                "Wake up, stretch, and get ready for the morning",
            ),
            (TimeOfDay::Evening | TimeOfDay::Night, _) => Self::new(
                format!(
                    "Woke up after sleeping for about {} hours. Still a bit groggy.",
                    (elapsed_minutes as f32 / 60.0).round()
                ),
                "Get up and drink some water",
            ),
            (TimeOfDay::Morning, _) => Self::new(
                format!(
                    "That {}-minute morning rest helped me recharge.",
                    elapsed_minutes.max(1)
                ),
                "Get up and carry on with the morning",
            ),
            (TimeOfDay::Day, _) => Self::new(
                "That power nap was exactly what I needed. Feeling sharper now.",
                "Get up and get back to it",
            ),
        }
    }
}

/// Result of leaving a rest episode.
#[derive(Debug, Clone, PartialEq)]
pub struct WakeUp {
    pub episode: RestEpisode,
    pub woke_at: DateTime<Utc>,
    pub elapsed_minutes: i64,
    pub energy: f32,
    pub mood: f32,
    pub narration: WakeNarration,
}

// =============================================================================
// State machine
// =============================================================================

/// `Active <-> Resting`. Only one rest episode at a time.
#[derive(Debug, Clone, Default)]
pub struct RestStateMachine {
    episode: Option<RestEpisode>,
}

impl RestStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.episode.is_some() {
            Phase::Resting
        } else {
            Phase::Active
        }
    }

    pub fn episode(&self) -> Option<&RestEpisode> {
        self.episode.as_ref()
    }

    /// Enter Resting. Returns `None` (no-op) if already resting.
    pub fn begin_rest(
        &mut self,
        bucket: TimeOfDay,
        start_energy: f32,
        at: DateTime<Utc>,
    ) -> Option<&RestEpisode> {
        if self.episode.is_some() {
            tracing::debug!("Already resting, ignoring rest request");
            return None;
        }
        let episode = RestEpisode::begin(bucket, start_energy, at);
        tracing::info!(
            "Entering rest ({}): {:.0} min at {:.0}%/min, energy {:.2} -> {:.2}",
            bucket,
            episode.plan.duration_minutes(),
            episode.plan.recovery_per_minute * 100.0,
            start_energy,
            episode.recovered_energy
        );
        self.episode = Some(episode);
        self.episode.as_ref()
    }

    /// Leave Resting. Returns `None` if not resting.
    pub fn wake(&mut self, woke_in: TimeOfDay, at: DateTime<Utc>) -> Option<WakeUp> {
        let episode = self.episode.take()?;
        let elapsed_minutes = (at - episode.started_at).num_minutes().max(0);
        let narration = WakeNarration::for_episode(&episode, woke_in, elapsed_minutes);
        tracing::info!(
            "Woke up after {} min ({} -> {}), energy {:.2}",
            elapsed_minutes,
            episode.started_in,
            woke_in,
            episode.recovered_energy
        );
        Some(WakeUp {
            energy: episode.recovered_energy,
            mood: WOKE_UP_MOOD,
            episode,
            woke_at: at,
            elapsed_minutes,
            narration,
        })
    }

    /// Drop any episode without waking (used when the loop is stopped).
    pub fn reset(&mut self) {
        self.episode = None;
    }
}
