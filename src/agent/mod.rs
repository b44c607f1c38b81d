mod analytics;
mod errors;
mod insight_agent;
mod model_client;
mod prompt;
mod sink;

pub use analytics::WindowStats;
pub use errors::{AgentError, ModelError};
pub use insight_agent::{InsightAgent, Schedule, TickOutcome, Window};
pub use model_client::{
    ChatCompletionsClient, LanguageModel, ModelSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_MODEL_TIMEOUT
};
pub use prompt::{Prompt, PromptBuilder, DEFAULT_MAX_PROMPT_CHARS, SYSTEM_PROMPT};
pub use sink::InsightSink;
