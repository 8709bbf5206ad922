pub mod analyzer;
pub mod api_types;
pub mod decision;
pub mod engine;
pub mod llm;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod scheduler;

pub use analyzer::{ActivityAnalyzer, AnalyzerError};
pub use decision::{Decision, DecisionClient, DecisionError, LlmDecisionClient};
pub use engine::{TickEngine, TickOutcome};
pub use llm::{CompletionParams, LlmClient};
pub use scheduler::TickScheduler;
