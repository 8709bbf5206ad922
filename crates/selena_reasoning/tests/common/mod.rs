//! Shared fixture: a tick engine over temp storage, a manual clock and
//! scripted providers.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use selena_core::{ManualClock, Personality, Weather, WeatherSource};
use selena_limbic::HeartbeatConfig;
use selena_memory::{ActivityLog, AnalyzerLog, MemoryStore, StateStore};
use selena_reasoning::providers::MockProvider;
use selena_reasoning::{ActivityAnalyzer, LlmDecisionClient, TickEngine};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const WORK_ANALYSIS: &str = r#"{"activityType": "work", "intensity": 0.8, "energyImpact": -0.05, "moodImpact": 0.03, "isAppropriate": true}"#;
pub const REST_ANALYSIS: &str = r#"{"activityType": "rest", "intensity": 0.1, "energyImpact": 0.08, "moodImpact": 0.02, "isAppropriate": true}"#;

pub struct FixedWeather(pub Option<Weather>);

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn current_weather(&self) -> Result<Weather> {
        self.0
            .clone()
            .ok_or_else(|| anyhow::anyhow!("weather service down"))
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub decider: Arc<MockProvider>,
    pub analyzer: Arc<MockProvider>,
    pub engine: Arc<TickEngine>,
}

pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
}

pub fn fixture(start: DateTime<Utc>, decider: MockProvider, analyzer: MockProvider) -> Fixture {
    fixture_with_weather(start, decider, analyzer, Some(Weather {
        desc: "light rain".to_string(),
        temp: 27.5,
    }))
}

pub fn fixture_with_weather(
    start: DateTime<Utc>,
    decider: MockProvider,
    analyzer: MockProvider,
    weather: Option<Weather>,
) -> Fixture {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start, chrono_tz::UTC));
    let decider = Arc::new(decider);
    let analyzer = Arc::new(analyzer);
    let heartbeat = HeartbeatConfig::default();

    let engine = TickEngine::new(
        Personality::default(),
        Arc::new(LlmDecisionClient::new(decider.clone())),
        ActivityAnalyzer::new(analyzer.clone(), heartbeat.call_timeout),
        Arc::new(FixedWeather(weather)),
        clock.clone(),
        Arc::new(StateStore::new(dir.path().join("ai-state.json"), clock.clone())),
        MemoryStore::default(),
        ActivityLog::new(dir.path().join("activity-log.json"), 100),
        AnalyzerLog::new(dir.path().join("analyzer-log.json"), 100),
        heartbeat,
    );

    Fixture {
        dir,
        clock,
        decider,
        analyzer,
        engine: Arc::new(engine),
    }
}

/// Let spawned tasks and blocking file I/O make progress without moving
/// the paused clock.
pub async fn settle() {
    for _ in 0..20 {
        std::thread::sleep(Duration::from_millis(2));
        tokio::task::yield_now().await;
    }
}

/// Poll `check` until it holds, without moving the paused clock.
pub async fn eventually<F, Fut>(what: &str, check: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..1000 {
        if check().await {
            return;
        }
        std::thread::sleep(Duration::from_millis(2));
        tokio::task::yield_now().await;
    }
    panic!("timed out waiting for: {}", what);
}
