//! One tick of the character loop: decide, analyze, update, log.

use crate::analyzer::ActivityAnalyzer;
use crate::decision::{Decision, DecisionClient, DecisionError};
use crate::prompts::{ContextAssembler, DecisionContext};
use selena_core::{ActivityAnalysis, AiState, Clock, Personality, Weather, WeatherSource};
use selena_limbic::{HeartbeatConfig, RestPlan};
use selena_memory::{
    ActivityLog, ActivityLogEntry, AnalyzerLog, AnalyzerLogEntry, MemoryEntry, MemoryStore,
    StateStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Energy delta applied when the analyzer cannot be used.
pub const FALLBACK_ENERGY_DELTA: f32 = -0.05;
pub const FALLBACK_MOOD_DELTA: f32 = 0.0;

#[derive(Debug)]
pub enum TickOutcome {
    /// Decision made, state updated, everything logged.
    Completed {
        decision: Decision,
        analysis: ActivityAnalysis,
        /// True when the analyzer failed and the fixed deltas were used.
        analyzer_fallback: bool,
        state: AiState,
        next_tick: Duration,
    },
    /// Too tired to decide; a sleep entry was logged instead.
    Exhausted { entry: ActivityLogEntry },
    /// The decision step failed; nothing was changed.
    Skipped { reason: DecisionError },
    /// The loop was stopped or restarted while this tick was in flight.
    Superseded,
}

pub struct TickEngine {
    personality: Personality,
    decider: Arc<dyn DecisionClient>,
    analyzer: ActivityAnalyzer,
    weather: Arc<dyn WeatherSource>,
    clock: Arc<dyn Clock>,
    state: Arc<StateStore>,
    memory: RwLock<MemoryStore>,
    activity_log: ActivityLog,
    analyzer_log: AnalyzerLog,
    heartbeat: HeartbeatConfig,
}

impl TickEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        personality: Personality,
        decider: Arc<dyn DecisionClient>,
        analyzer: ActivityAnalyzer,
        weather: Arc<dyn WeatherSource>,
        clock: Arc<dyn Clock>,
        state: Arc<StateStore>,
        memory: MemoryStore,
        activity_log: ActivityLog,
        analyzer_log: AnalyzerLog,
        heartbeat: HeartbeatConfig,
    ) -> Self {
        Self {
            personality,
            decider,
            analyzer,
            weather,
            clock,
            state,
            memory: RwLock::new(memory),
            activity_log,
            analyzer_log,
            heartbeat,
        }
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    pub fn heartbeat(&self) -> &HeartbeatConfig {
        &self.heartbeat
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.activity_log
    }

    pub fn analyzer_log(&self) -> &AnalyzerLog {
        &self.analyzer_log
    }

    pub fn memory(&self) -> &RwLock<MemoryStore> {
        &self.memory
    }

    /// Run one tick. `still_current` is checked right before anything is
    /// written; if it returns false the tick is dropped.
    #[tracing::instrument(skip_all)]
    pub async fn run_tick(&self, still_current: &(dyn Fn() -> bool + Send + Sync)) -> TickOutcome {
        let state = self.state.load().await;
        if state.energy < self.heartbeat.low_energy_threshold {
            return self.exhausted(&state, still_current).await;
        }

        let weather = self.current_weather().await;
        let now = self.clock.now();
        let bucket = self.clock.bucket();
        let traits = self.personality.snapshot(&state);

        let prompt = {
            let memory = self.memory.read().await;
            let recent = memory.recent(now);
            let summary = memory.summarize(now);
            ContextAssembler::decision_prompt(&DecisionContext {
                name: &self.personality.name,
                traits,
                bucket,
                local_time: self.clock.local_now(),
                weather: &weather,
                recent: &recent,
                summary: &summary,
            })
        };

        let timeout = self.heartbeat.call_timeout;
        let decision =
            match tokio::time::timeout(timeout, self.decider.decide(&prompt, &traits)).await {
                Ok(Ok(decision)) => decision,
                Ok(Err(reason)) => {
                    tracing::error!("Tick skipped: {}", reason);
                    return TickOutcome::Skipped { reason };
                }
                Err(_) => {
                    tracing::error!("Tick skipped: decision timed out after {:?}", timeout);
                    return TickOutcome::Skipped {
                        reason: DecisionError::Timeout(timeout),
                    };
                }
            };
        tracing::info!(
            "Decided: {} (thinking: {})",
            decision.actions,
            decision.thoughts
        );

        let (analysis, energy_delta, mood_delta, analyzer_fallback) =
            match self.analyzer.classify(&decision.actions, state.energy).await {
                Ok(a) => (a, a.energy_change(), a.mood_change(), false),
                Err(e) => {
                    tracing::warn!("Analyzer failed, applying fallback deltas: {}", e);
                    (
                        ActivityAnalysis::fallback(),
                        FALLBACK_ENERGY_DELTA,
                        FALLBACK_MOOD_DELTA,
                        true,
                    )
                }
            };
        let next_tick = self.heartbeat.tick_after(decision.duration_minutes);

        if !still_current() {
            tracing::info!("Loop stopped during tick, discarding result");
            return TickOutcome::Superseded;
        }

        let new_state = self.state.update(energy_delta, mood_delta).await;
        self.memory
            .write()
            .await
            .append(MemoryEntry::new(now, decision.actions.clone()));

        let analyzer_entry = AnalyzerLogEntry {
            timestamp: now,
            activity: decision.actions.clone(),
            analysis,
            energy_change: energy_delta,
            mood_change: mood_delta,
            final_energy: new_state.energy,
            final_mood: new_state.mood,
        };
        if let Err(e) = self.analyzer_log.append(analyzer_entry).await {
            tracing::error!("Failed to write analyzer log: {:#}", e);
        }

        let entry = ActivityLogEntry {
            timestamp: now,
            weather,
            energy: new_state.energy,
            mood: new_state.mood,
            thoughts: vec![decision.thoughts.clone()],
            actions: vec![decision.actions.clone()],
            duration: whole_minutes(next_tick),
        };
        if let Err(e) = self.activity_log.append(entry).await {
            tracing::error!("Failed to write activity log: {:#}", e);
        }

        tracing::debug!(
            "Tick done: energy {:.3}, mood {:.3}, next in {:?}",
            new_state.energy,
            new_state.mood,
            next_tick
        );
        TickOutcome::Completed {
            decision,
            analysis,
            analyzer_fallback,
            state: new_state,
            next_tick,
        }
    }

    /// Append a log entry outside the normal tick (used for wake-ups).
    pub async fn log_activity(&self, entry: ActivityLogEntry) {
        if let Err(e) = self.activity_log.append(entry).await {
            tracing::error!("Failed to write activity log: {:#}", e);
        }
    }

    /// Latest activity entry, if the log can be read.
    pub async fn latest_activity(&self) -> Option<ActivityLogEntry> {
        match self.activity_log.latest().await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Could not read activity log: {:#}", e);
                None
            }
        }
    }

    pub async fn current_weather(&self) -> Weather {
        match tokio::time::timeout(self.heartbeat.call_timeout, self.weather.current_weather()).await
        {
            Ok(Ok(w)) => w,
            Ok(Err(e)) => {
                tracing::warn!("Weather lookup failed, using default: {:#}", e);
                Weather::default()
            }
            Err(_) => {
                tracing::warn!("Weather lookup timed out, using default");
                Weather::default()
            }
        }
    }

    async fn exhausted(
        &self,
        state: &AiState,
        still_current: &(dyn Fn() -> bool + Send + Sync),
    ) -> TickOutcome {
        tracing::info!(
            "Energy {:.2} below {:.2}, going to sleep",
            state.energy,
            self.heartbeat.low_energy_threshold
        );
        let plan = RestPlan::for_bucket(self.clock.bucket());
        let entry = ActivityLogEntry {
            timestamp: self.clock.now(),
            weather: Weather::default(),
            energy: state.energy,
            mood: state.mood,
            thoughts: vec!["Resting".to_string()],
            actions: vec!["sleep".to_string()],
            duration: whole_minutes(plan.duration),
        };
        if !still_current() {
            return TickOutcome::Superseded;
        }
        self.log_activity(entry.clone()).await;
        TickOutcome::Exhausted { entry }
    }
}

/// Minutes for the log's `duration` field, at least 1.
pub(crate) fn whole_minutes(d: Duration) -> u32 {
    ((d.as_secs() + 59) / 60).max(1) as u32
}
