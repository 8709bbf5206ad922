//! What the character does next, as chosen by the language model.

use crate::api_types::Message;
use crate::llm::{CompletionParams, LlmClient};
use async_trait::async_trait;
use selena_core::Traits;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Reply shape
// ============================================================================

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("decision service unreachable: {0}")]
    Unreachable(String),
    #[error("decision timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed decision reply: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub thoughts: String,
    pub actions: String,
    /// Minutes until the next tick, if the reply named one.
    pub duration_minutes: Option<f64>,
}

impl Decision {
    /// Parse a reply of the form `{thoughts, actions, duration}`.
    ///
    /// `thoughts` and `actions` may be strings or arrays of strings (the
    /// first element is kept). `duration` may be a number or a numeric
    /// string; anything else counts as absent.
    pub fn parse(text: &str) -> Result<Self, DecisionError> {
        let value = extract_json_object(text)
            .ok_or_else(|| DecisionError::Malformed(format!("no JSON object in {:?}", preview(text))))?;

        let thoughts = first_text(&value, "thoughts")?;
        let actions = first_text(&value, "actions")?;
        let duration_minutes = match value.get("duration") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(other) => {
                tracing::warn!("Ignoring non-numeric duration {}", other);
                None
            }
        };

        Ok(Self {
            thoughts,
            actions,
            duration_minutes,
        })
    }
}

fn first_text(value: &Value, key: &str) -> Result<String, DecisionError> {
    let text = match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
        _ => Err(DecisionError::Malformed(format!("`{}` missing or not text", key))),
    }
}

/// Lenient JSON object extraction: whole text first, then the outermost
/// braces (handles code fences and chatter around the object).
pub(crate) fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

pub(crate) fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}

// ============================================================================
// DecisionClient
// ============================================================================

#[async_trait]
pub trait DecisionClient: Send + Sync {
    /// Ask for the next activity given the rendered context.
    async fn decide(&self, prompt: &str, traits: &Traits) -> Result<Decision, DecisionError>;
}

/// Decision client backed by a chat completion provider.
pub struct LlmDecisionClient {
    client: Arc<dyn LlmClient>,
}

impl LlmDecisionClient {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DecisionClient for LlmDecisionClient {
    async fn decide(&self, prompt: &str, traits: &Traits) -> Result<Decision, DecisionError> {
        let params = CompletionParams::from_traits(traits);
        tracing::debug!(
            "Decision request: temperature {:.1}, top_p {:?}",
            params.temperature,
            params.top_p
        );
        let response = self
            .client
            .complete(vec![Message::user(prompt)], params)
            .await
            .map_err(|e| DecisionError::Unreachable(format!("{:#}", e)))?;
        Decision::parse(&response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    #[test]
    fn test_parse_plain_reply() {
        let d = Decision::parse(r#"{"thoughts": "tired", "actions": "nap", "duration": 30}"#).unwrap();
        assert_eq!(d.thoughts, "tired");
        assert_eq!(d.actions, "nap");
        assert_eq!(d.duration_minutes, Some(30.0));
    }

    #[test]
    fn test_parse_array_forms_take_first() {
        let d = Decision::parse(
            r#"{"thoughts": ["hungry", "bored"], "actions": ["Grab a snack", "Watch TV"], "duration": "15"}"#,
        )
        .unwrap();
        assert_eq!(d.thoughts, "hungry");
        assert_eq!(d.actions, "Grab a snack");
        assert_eq!(d.duration_minutes, Some(15.0));
    }

    #[test]
    fn test_parse_code_fence() {
        let text = "Sure!\n```json\n{\"thoughts\": \"ok\", \"actions\": \"Read\"}\n```";
        let d = Decision::parse(text).unwrap();
        assert_eq!(d.actions, "Read");
        assert_eq!(d.duration_minutes, None);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(matches!(
            Decision::parse("I think I'll go for a walk"),
            Err(DecisionError::Malformed(_))
        ));
        assert!(matches!(
            Decision::parse(r#"{"thoughts": 3, "actions": "walk"}"#),
            Err(DecisionError::Malformed(_))
        ));
        assert!(matches!(
            Decision::parse(r#"{"thoughts": "x", "actions": []}"#),
            Err(DecisionError::Malformed(_))
        ));
        assert!(matches!(
            Decision::parse(r#"{"thoughts": "x"}"#),
            Err(DecisionError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_garbage_duration_is_absent() {
        let d = Decision::parse(r#"{"thoughts": "x", "actions": "y", "duration": "soon"}"#).unwrap();
        assert_eq!(d.duration_minutes, None);
        let d = Decision::parse(r#"{"thoughts": "x", "actions": "y", "duration": true}"#).unwrap();
        assert_eq!(d.duration_minutes, None);
    }

    #[tokio::test]
    async fn test_llm_client_uses_trait_params() {
        let provider = Arc::new(
            MockProvider::new().reply(r#"{"thoughts": "a", "actions": "b", "duration": 5}"#),
        );
        let client = LlmDecisionClient::new(provider.clone());
        let traits = Traits {
            curiosity: 0.1,
            empathy: 0.5,
            humor: 0.2,
            mood: 0.9,
            energy: 0.5,
        };
        let d = client.decide("prompt", &traits).await.unwrap();
        assert_eq!(d.actions, "b");

        let (messages, params) = provider.requests().remove(0);
        assert_eq!(messages, vec![Message::user("prompt")]);
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.presence_penalty, Some(0.2));
        assert!(params.json_mode);
    }

    #[tokio::test]
    async fn test_llm_client_failure_is_unreachable() {
        let provider = Arc::new(MockProvider::new().fail("connection refused"));
        let client = LlmDecisionClient::new(provider);
        let traits = Traits {
            curiosity: 0.5,
            empathy: 0.5,
            humor: 0.5,
            mood: 0.5,
            energy: 0.5,
        };
        let err = client.decide("prompt", &traits).await.unwrap_err();
        assert!(matches!(err, DecisionError::Unreachable(_)));
    }
}
