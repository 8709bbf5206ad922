//! Mock LLM provider: scripted replies for tests and offline runs.

use crate::api_types::{CompletionResponse, Message};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Reply used once the script runs dry.
pub const DEFAULT_MOCK_REPLY: &str =
    r#"{"thoughts": "Nothing much going on", "actions": "Stare out the window", "duration": 5}"#;

#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<(Vec<Message>, CompletionParams)>>,
    delay: Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queue a failed call.
    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()));
        self
    }

    /// Every call waits this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push(&self, entry: Result<String, String>) {
        lock(&self.script).push_back(entry);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Messages and params of every call so far.
    pub fn requests(&self) -> Vec<(Vec<Message>, CompletionParams)> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<CompletionResponse> {
        lock(&self.requests).push((messages, params));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = lock(&self.script).pop_front();
        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                finish_reason: Some("stop".to_string()),
            }),
            Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
            None => Ok(CompletionResponse {
                content: DEFAULT_MOCK_REPLY.to_string(),
                finish_reason: Some("stop".to_string()),
            }),
        }
    }
}
