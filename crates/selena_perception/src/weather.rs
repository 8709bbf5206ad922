//! Weather sources.

use crate::source::validate_url;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use selena_core::config::WeatherConfig;
use selena_core::{Weather, WeatherSource};
use serde::Deserialize;
use std::time::Duration;

// ============================================================================
// OpenWeatherMap
// ============================================================================

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    weather: Vec<Condition>,
    main: Readings,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
    temp: f32,
}

/// Current conditions from the OpenWeatherMap `/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    client: Client,
    base_url: String,
    api_key: String,
    city: String,
    units: String,
}

impl OpenWeatherSource {
    pub fn new(cfg: &WeatherConfig, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        validate_url(&cfg.base_url)?;
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build HTTP client")?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            city: cfg.city.clone(),
            units: cfg.units.clone(),
        })
    }

    /// Reads the key from `OPENWEATHER_API_KEY`.
    pub fn from_env(cfg: &WeatherConfig, timeout: Duration) -> Result<Self> {
        let api_key =
            std::env::var("OPENWEATHER_API_KEY").context("OPENWEATHER_API_KEY is not set")?;
        Self::new(cfg, api_key, timeout)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn current_weather(&self) -> Result<Weather> {
        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", self.city.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach weather service")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Weather service returned {}", status);
        }

        let body: CurrentWeather = response
            .json()
            .await
            .context("Failed to decode weather response")?;
        let desc = body
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .context("Weather response has no conditions")?;

        tracing::debug!("Weather in {}: {}, {:.1}", self.city, desc, body.main.temp);
        Ok(Weather {
            desc,
            temp: body.main.temp,
        })
    }
}

// ============================================================================
// Static
// ============================================================================

/// Always reports the same weather. Used when no API key is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticWeather(pub Weather);

#[async_trait]
impl WeatherSource for StaticWeather {
    async fn current_weather(&self) -> Result<Weather> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> OpenWeatherSource {
        let cfg = WeatherConfig {
            base_url: server.uri(),
            ..WeatherConfig::default()
        };
        OpenWeatherSource::new(&cfg, "k3y", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Jakarta"))
            .and(query_param("appid", "k3y"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"weather": [{"id": 500, "description": "light rain"}], "main": {"temp": 27.4, "humidity": 80}}"#,
            ))
            .mount(&server)
            .await;

        let w = source(&server).current_weather().await.unwrap();
        assert_eq!(w.desc, "light rain");
        assert!((w.temp - 27.4).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_error_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        assert!(source(&server).current_weather().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_conditions_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"weather": [], "main": {"temp": 20}}"#),
            )
            .mount(&server)
            .await;
        assert!(source(&server).current_weather().await.is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let cfg = WeatherConfig {
            base_url: "ftp://weather.example".to_string(),
            ..WeatherConfig::default()
        };
        assert!(OpenWeatherSource::new(&cfg, "k", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_static_weather() {
        let w = StaticWeather::default().current_weather().await.unwrap();
        assert_eq!(w, Weather::default());
    }
}
