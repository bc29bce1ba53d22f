//! AI Integration Layer
//!
//! Provider adapters, prompts, per-call deadlines and response validation.

pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use prompt::{PromptBuilder, analysis_instructions, report_prompt};
pub use provider::{
    AiProvider, ClaudeCodeProvider, GeminiProvider, OllamaProvider, OpenAiProvider,
    ProviderConfig, ProviderState, SharedProvider, create_provider,
};
pub use timeout::{TimeoutConfig, with_timeout};
pub use validation::{AcceptancePolicy, JsonRepairer, Rejection, extract_json_from_response};
