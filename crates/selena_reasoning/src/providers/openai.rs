//! OpenAI-compatible chat completions client (OpenAI, OpenRouter).

use crate::api_types::{CompletionResponse, Message};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use reqwest::Client;
use selena_core::config::LlmConfig;
use serde_json::{json, Value};
use std::time::Duration;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    /// `HTTP-Referer` and `X-Title` for OpenRouter attribution.
    site: Option<(String, String)>,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build HTTP client")?,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            site: None,
            retry: RetryPolicy::default(),
        })
    }

    /// Build from config. The key comes from `OPENROUTER_API_KEY` or
    /// `OPENAI_API_KEY` depending on the provider.
    pub fn from_config(cfg: &LlmConfig, timeout: Duration) -> Result<Self> {
        let openrouter = cfg.provider != "openai";
        let (key_var, default_url) = if openrouter {
            ("OPENROUTER_API_KEY", OPENROUTER_BASE_URL)
        } else {
            ("OPENAI_API_KEY", OPENAI_BASE_URL)
        };
        let api_key =
            std::env::var(key_var).with_context(|| format!("{} is not set", key_var))?;
        let base_url = cfg.base_url.as_deref().unwrap_or(default_url);

        let mut client = Self::new(api_key, base_url, cfg.model.clone(), timeout)?;
        if openrouter {
            client = client.with_site(&cfg.site_url, &cfg.site_name);
        }
        Ok(client)
    }

    pub fn with_site(mut self, url: &str, name: &str) -> Self {
        self.site = Some((url.to_string(), name.to_string()));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn payload(&self, messages: &[Message], params: &CompletionParams) -> Value {
        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if let Some(top_p) = params.top_p {
            payload["top_p"] = json!(top_p);
        }
        if let Some(p) = params.frequency_penalty {
            payload["frequency_penalty"] = json!(p);
        }
        if let Some(p) = params.presence_penalty {
            payload["presence_penalty"] = json!(p);
        }
        if params.json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }
        payload
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    #[tracing::instrument(skip(self, messages, params), fields(model = %self.model))]
    async fn complete(
        &self,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = self.payload(&messages, &params);

        let response = self
            .retry
            .send("chat completions", || {
                let mut req = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&payload);
                if let Some((site_url, site_name)) = &self.site {
                    req = req
                        .header("HTTP-Referer", site_url)
                        .header("X-Title", site_name);
                }
                req.send()
            })
            .await?;

        let body: Value = response
            .json()
            .await
            .context("Failed to decode chat completion body")?;
        let choice = &body["choices"][0];
        let content = choice["message"]["content"]
            .as_str()
            .context("Chat completion carried no message content")?
            .to_string();
        let finish_reason = choice["finish_reason"].as_str().map(str::to_string);

        tracing::debug!("Completion received ({} chars)", content.len());
        Ok(CompletionResponse {
            content,
            finish_reason,
        })
    }
}
