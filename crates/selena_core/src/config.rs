use crate::state::Personality;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelenaConfig {
    pub llm: LlmConfig,
    pub character: CharacterConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
    pub weather: WeatherConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

impl SelenaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SelenaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("SELENA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SELENA_TIMEZONE") {
            self.character.timezone = v;
        }
        if let Ok(v) = std::env::var("WEATHER_CITY") {
            self.weather.city = v;
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "openrouter", "openai" or "mock"
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Sent as `HTTP-Referer` to OpenRouter.
    pub site_url: String,
    /// Sent as `X-Title` to OpenRouter.
    pub site_name: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            model: "openai/gpt-4o".to_string(),
            base_url: None,
            max_tokens: 512,
            temperature: 0.7,
            site_url: "http://localhost:3000".to_string(),
            site_name: "AI Character Engine".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub name: String,
    pub curiosity: f32,
    pub empathy: f32,
    pub humor: f32,
    /// IANA timezone name used for time-of-day buckets.
    pub timezone: String,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        let p = Personality::default();
        Self {
            name: p.name,
            curiosity: p.curiosity,
            empathy: p.empathy,
            humor: p.humor,
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

impl CharacterConfig {
    pub fn personality(&self) -> Personality {
        Personality {
            name: self.name.clone(),
            curiosity: self.curiosity,
            empathy: self.empathy,
            humor: self.humor,
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub activity_log_file: String,
    pub analyzer_log_file: String,
    pub memory_capacity: usize,
    pub log_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("logs"),
            state_file: "ai-state.json".to_string(),
            activity_log_file: "activity-log.json".to_string(),
            analyzer_log_file: "analyzer-log.json".to_string(),
            memory_capacity: 60,
            log_capacity: 100,
        }
    }
}

impl StorageConfig {
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.activity_log_file)
    }

    pub fn analyzer_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.analyzer_log_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Used when the decision reply carries no duration.
    pub default_tick_minutes: u64,
    pub min_tick_minutes: u64,
    pub max_tick_minutes: u64,
    pub rest_check_minutes: u64,
    pub post_wake_minutes: u64,
    /// Delay before retrying after a failed or malformed decision.
    pub retry_backoff_minutes: u64,
    /// Upper bound on every external call.
    pub call_timeout_secs: u64,
    /// Below this energy the tick skips the decision and goes to sleep.
    pub low_energy_threshold: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_tick_minutes: 5,
            min_tick_minutes: 1,
            max_tick_minutes: 240,
            rest_check_minutes: 15,
            post_wake_minutes: 1,
            retry_backoff_minutes: 5,
            call_timeout_secs: 60,
            low_energy_threshold: 0.1,
        }
    }
}

impl SchedulerConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub city: String,
    pub units: String,
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            city: "Jakarta".to_string(),
            units: "metric".to_string(),
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling diagnostic logs. Console only when unset.
    pub dir: Option<PathBuf>,
    pub json: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SelenaConfig::default();
        assert_eq!(cfg.llm.provider, "openrouter");
        assert_eq!(cfg.storage.memory_capacity, 60);
        assert_eq!(cfg.storage.log_capacity, 100);
        assert_eq!(cfg.scheduler.rest_check_minutes, 15);
        assert_eq!(cfg.character.timezone().unwrap(), chrono_tz::Asia::Jakarta);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
"#;
        let cfg: SelenaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        // Defaults for unspecified fields
        assert_eq!(cfg.llm.max_tokens, 512);
        assert_eq!(cfg.scheduler.default_tick_minutes, 5);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[character]
name = "Aria"
curiosity = 0.9
timezone = "Europe/Berlin"

[storage]
data_dir = "/tmp/selena"
log_capacity = 50

[scheduler]
max_tick_minutes = 90
call_timeout_secs = 10

[gateway]
enabled = false
port = 8080

[logging]
dir = "/var/log/selena"
json = true
"#;
        let cfg: SelenaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.character.personality().name, "Aria");
        assert_eq!(cfg.character.personality().curiosity, 0.9);
        assert_eq!(cfg.character.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(cfg.storage.state_path(), PathBuf::from("/tmp/selena/ai-state.json"));
        assert_eq!(cfg.storage.log_capacity, 50);
        assert_eq!(cfg.scheduler.max_tick_minutes, 90);
        assert_eq!(cfg.scheduler.call_timeout(), Duration::from_secs(10));
        assert!(!cfg.gateway.enabled);
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_invalid_timezone_is_an_error() {
        let cfg = CharacterConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(cfg.timezone().is_err());
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let cfg = SelenaConfig::load_or_default("/nonexistent/selena.toml");
        assert_eq!(cfg.storage.memory_capacity, 60);
    }
}
