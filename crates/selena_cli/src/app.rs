//! Builds the character loop from config.

use anyhow::{Context, Result};
use selena_core::{Clock, SelenaConfig, SystemClock, WeatherSource};
use selena_limbic::HeartbeatConfig;
use selena_memory::{ActivityLog, AnalyzerLog, MemoryStore, StateStore};
use selena_perception::{OpenWeatherSource, StaticWeather};
use selena_reasoning::{
    providers, ActivityAnalyzer, CompletionParams, LlmDecisionClient, TickEngine,
};
use std::sync::Arc;

/// On-disk state and logs, usable without any network collaborators.
pub struct Storage {
    pub state: Arc<StateStore>,
    pub activity_log: ActivityLog,
    pub analyzer_log: AnalyzerLog,
}

pub fn clock(cfg: &SelenaConfig) -> Result<Arc<dyn Clock>> {
    let tz = cfg.character.timezone()?;
    Ok(Arc::new(SystemClock::new(tz)))
}

pub fn storage(cfg: &SelenaConfig, clock: Arc<dyn Clock>) -> Result<Storage> {
    let storage = &cfg.storage;
    std::fs::create_dir_all(&storage.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            storage.data_dir.display()
        )
    })?;
    Ok(Storage {
        state: Arc::new(StateStore::new(storage.state_path(), clock)),
        activity_log: ActivityLog::new(storage.activity_log_path(), storage.log_capacity),
        analyzer_log: AnalyzerLog::new(storage.analyzer_log_path(), storage.log_capacity),
    })
}

fn weather_source(cfg: &SelenaConfig, heartbeat: &HeartbeatConfig) -> Arc<dyn WeatherSource> {
    match OpenWeatherSource::from_env(&cfg.weather, heartbeat.call_timeout) {
        Ok(source) => {
            tracing::info!("Weather from OpenWeatherMap for {}", cfg.weather.city);
            Arc::new(source)
        }
        Err(e) => {
            tracing::warn!("Live weather unavailable ({:#}), using fixed weather", e);
            Arc::new(StaticWeather::default())
        }
    }
}

pub fn build_engine(cfg: &SelenaConfig) -> Result<Arc<TickEngine>> {
    let clock = clock(cfg)?;
    let heartbeat = HeartbeatConfig::from(&cfg.scheduler);
    let llm = providers::from_config(&cfg.llm, heartbeat.call_timeout)
        .context("Failed to set up LLM provider")?;
    tracing::info!("LLM provider {} ({})", cfg.llm.provider, cfg.llm.model);

    let decider = Arc::new(LlmDecisionClient::new(llm.clone()));
    let analyzer = ActivityAnalyzer::new(llm, heartbeat.call_timeout)
        .with_params(CompletionParams::from_config(&cfg.llm));
    let weather = weather_source(cfg, &heartbeat);
    let storage = storage(cfg, clock.clone())?;

    Ok(Arc::new(TickEngine::new(
        cfg.character.personality(),
        decider,
        analyzer,
        weather,
        clock,
        storage.state,
        MemoryStore::new(cfg.storage.memory_capacity),
        storage.activity_log,
        storage.analyzer_log,
        heartbeat,
    )))
}
