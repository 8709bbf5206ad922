pub mod mock;
pub mod openai;

pub use mock::MockProvider;
pub use openai::OpenAiClient;

use crate::llm::LlmClient;
use anyhow::Result;
use selena_core::config::LlmConfig;
use std::sync::Arc;
use std::time::Duration;

/// Pick a provider by name.
pub fn from_config(cfg: &LlmConfig, timeout: Duration) -> Result<Arc<dyn LlmClient>> {
    match cfg.provider.as_str() {
        "openrouter" | "openai" => Ok(Arc::new(OpenAiClient::from_config(cfg, timeout)?)),
        "mock" => {
            tracing::warn!("Using the mock LLM provider");
            Ok(Arc::new(MockProvider::new()))
        }
        other => anyhow::bail!("Unknown LLM provider '{}'", other),
    }
}
