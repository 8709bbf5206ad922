use crate::api_types::{CompletionResponse, Message};
use anyhow::Result;
use async_trait::async_trait;
use selena_core::config::LlmConfig;
use selena_core::Traits;

/// Parameters for LLM completion, modulated by the character's traits
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    /// Maximum tokens to generate (will be clamped to provider limits)
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    /// Ask the provider for a JSON object reply.
    pub json_mode: bool,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            json_mode: false,
        }
    }
}

impl CompletionParams {
    /// Sampling follows mood; low empathy or curiosity discourage repetition.
    pub fn from_traits(traits: &Traits) -> Self {
        let temperature = if traits.mood > 0.7 {
            1.0
        } else if traits.mood < 0.3 {
            0.4
        } else {
            0.7
        };
        Self {
            max_tokens: 256,
            temperature,
            top_p: Some((temperature + 0.2).min(1.0)),
            frequency_penalty: Some(if traits.empathy < 0.3 { 0.2 } else { 0.0 }),
            presence_penalty: Some(if traits.curiosity < 0.3 { 0.2 } else { 0.0 }),
            json_mode: true,
        }
    }

    /// Configured budget and temperature; used for analyzer requests.
    pub fn from_config(cfg: &LlmConfig) -> Self {
        Self {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            ..Self::default()
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request with modulated parameters.
    async fn complete(
        &self,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<CompletionResponse>;
}
