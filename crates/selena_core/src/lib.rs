pub mod activity;
pub mod clock;
pub mod config;
pub mod state;
pub mod time;

pub use activity::{ActivityAnalysis, ActivityType};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SelenaConfig;
pub use state::{AiState, Personality, Traits};
pub use time::{should_consider_rest, TimeOfDay};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Current weather as seen by the character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub desc: String,
    pub temp: f32,
}

impl Default for Weather {
    /// Used whenever the weather lookup fails.
    fn default() -> Self {
        Self {
            desc: "clear sky".to_string(),
            temp: 20.0,
        }
    }
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self) -> anyhow::Result<Weather>;
}

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Active,
    Resting,
}

/// What the control surface can observe about the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStatus {
    pub running: bool,
    pub phase: Phase,
    /// Seconds until the next wake-up, if one is pending.
    pub next_wake_secs: Option<u64>,
    pub energy: f32,
    pub mood: f32,
}

/// Start/stop/status surface the scheduler exposes to outer layers.
#[async_trait]
pub trait LoopControl: Send + Sync {
    /// Returns false if the loop was already running.
    async fn start(&self) -> bool;
    /// Returns false if the loop was not running.
    async fn stop(&self) -> bool;
    fn is_running(&self) -> bool;
    async fn status(&self) -> LoopStatus;
}
