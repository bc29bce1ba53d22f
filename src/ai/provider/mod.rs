//! AI Provider Abstraction
//!
//! Uniform interface over vision-capable and text-generation endpoints.
//! Adapters hide the vendor request/response shape, perform exactly one
//! request per call and report failures as `ProviderError`. Retry and
//! failover policy lives in the callers (`ImageAnalyzer`, `ReportComposer`).
//!
//! ## Modules
//!
//! - `openai`: Chat Completions (vision + text)
//! - `gemini`: generateContent (vision + text)
//! - `ollama`: local models (vision + text)
//! - `claude_code`: local CLI (text only)

mod claude_code;
mod gemini;
mod image;
mod ollama;
mod openai;

pub use claude_code::ClaudeCodeProvider;
pub use gemini::GeminiProvider;
pub use image::ImageInput;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::network as net_constants;
use crate::types::ProviderError;

/// Shared provider handle, constructed once at pipeline setup
pub type SharedProvider = Arc<dyn AiProvider>;

// =============================================================================
// Provider State
// =============================================================================

/// Read-only adapter configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderState {
    pub initialized: bool,
    pub model_id: String,
    pub max_output_tokens: u32,
}

impl ProviderState {
    pub fn ready(model_id: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            initialized: true,
            model_id: model_id.into(),
            max_output_tokens,
        }
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for one provider endpoint
///
/// API keys are never serialized and are redacted in debug output. Each
/// adapter moves the key into a `SecretString` on construction.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "openai", "gemini", "ollama", "claude-code"
    pub provider: String,
    /// Model name (provider-specific)
    #[serde(default)]
    pub model: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    /// Default output token budget (callers may raise it per request)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    net_constants::DEFAULT_TIMEOUT_SECS
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    crate::constants::analysis::MAX_OUTPUT_TOKENS
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            api_key: None,
            api_base: None,
            max_tokens: default_max_tokens(),
        }
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    fn state(&self) -> &ProviderState;

    /// Whether `analyze` is supported at all
    fn supports_vision(&self) -> bool;

    /// Analyze one image with the given instructions, returning raw model text
    async fn analyze(&self, image: &[u8], instructions: &str) -> Result<String, ProviderError>;

    /// Generate text for a prompt. `max_tokens` overrides the configured budget.
    async fn generate(&self, prompt: &str, max_tokens: Option<u32>)
    -> Result<String, ProviderError>;
}

/// Create a shared provider from configuration.
///
/// Fails with `ProviderError::NotConfigured` when the credential or endpoint
/// is missing or invalid.
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider, ProviderError> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        "claude-code" => Ok(Arc::new(ClaudeCodeProvider::new(config.clone()))),
        other => Err(ProviderError::not_configured(
            other,
            "unknown provider. Supported: openai, gemini, ollama, claude-code",
        )),
    }
}

/// Build an HTTP client with the configured request timeout
pub(crate) fn http_client(provider: &str, timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            ProviderError::not_configured(provider, format!("Failed to create HTTP client: {}", e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_key_not_serialized() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_provider(&ProviderConfig::new("carrier-pigeon")).err().unwrap();
        assert_eq!(err.category(), crate::types::ErrorCategory::NotConfigured);
    }

    #[test]
    fn test_claude_code_is_text_only() {
        let provider = create_provider(&ProviderConfig::new("claude-code")).unwrap();
        assert!(!provider.supports_vision());
        assert!(provider.state().initialized);
    }
}
