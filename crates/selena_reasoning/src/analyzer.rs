//! Activity analyzer: turns an activity description into bounded impact.

use crate::api_types::Message;
use crate::decision::{extract_json_object, preview};
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts::{ContextAssembler, ANALYZER_USER_TURN};
use selena_core::ActivityAnalysis;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer unreachable: {0}")]
    Unreachable(String),
    #[error("analyzer timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed analyzer reply: {0}")]
    Malformed(String),
}

pub struct ActivityAnalyzer {
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
    timeout: Duration,
}

impl ActivityAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self {
            client,
            params: CompletionParams::default().json(),
            timeout,
        }
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params.json();
        self
    }

    /// Classify one activity, reporting why it failed if it did.
    pub async fn classify(
        &self,
        activity: &str,
        current_energy: f32,
    ) -> Result<ActivityAnalysis, AnalyzerError> {
        let messages = vec![
            Message::system(ContextAssembler::analyzer_prompt(activity, current_energy)),
            Message::user(ANALYZER_USER_TURN),
        ];

        let response = tokio::time::timeout(
            self.timeout,
            self.client.complete(messages, self.params.clone()),
        )
        .await
        .map_err(|_| AnalyzerError::Timeout(self.timeout))?
        .map_err(|e| AnalyzerError::Unreachable(format!("{:#}", e)))?;

        parse_analysis(&response.content)
    }

    /// Like [`classify`](Self::classify) but never fails: any error yields
    /// [`ActivityAnalysis::fallback`].
    pub async fn analyze(&self, activity: &str, current_energy: f32) -> ActivityAnalysis {
        match self.classify(activity, current_energy).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Activity analysis failed, using fallback: {}", e);
                ActivityAnalysis::fallback()
            }
        }
    }
}

fn parse_analysis(text: &str) -> Result<ActivityAnalysis, AnalyzerError> {
    let value = extract_json_object(text)
        .ok_or_else(|| AnalyzerError::Malformed(format!("no JSON object in {:?}", preview(text))))?;
    let analysis: ActivityAnalysis =
        serde_json::from_value(value).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;
    analysis
        .bounded()
        .ok_or_else(|| AnalyzerError::Malformed("non-finite impact values".to_string()))
}
