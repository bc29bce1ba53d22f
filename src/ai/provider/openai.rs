//! OpenAI API Provider
//!
//! Vision and text generation through the Chat Completions API.
//! Images travel as base64 data URLs inside a multi-part user message.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiProvider, ImageInput, ProviderConfig, ProviderState, http_client};
use crate::types::{ErrorClassifier, ProviderError};

const PROVIDER_NAME: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    temperature: f32,
    state: ProviderState,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("state", &self.state)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::not_configured(
                    PROVIDER_NAME,
                    "API key not found. Set OPENAI_API_KEY env var or provide in config",
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let client = http_client(PROVIDER_NAME, config.timeout_secs)?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            temperature: config.temperature,
            state: ProviderState::ready(model, config.max_tokens),
            client,
        })
    }

    fn build_request(&self, content: MessageContent, max_tokens: u32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.state.model_id.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature: self.temperature,
            max_tokens,
        }
    }

    async fn send(&self, request: ChatCompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.api_base);

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status,
                &body,
                PROVIDER_NAME,
            ));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::empty(PROVIDER_NAME))
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    fn supports_vision(&self) -> bool {
        true
    }

    async fn analyze(&self, image: &[u8], instructions: &str) -> Result<String, ProviderError> {
        info!(model = %self.state.model_id, bytes = image.len(), "Analyzing image with OpenAI");

        let image = ImageInput::from_bytes(image);
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: instructions.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            },
        ]);
        self.send(self.build_request(content, self.state.max_output_tokens))
            .await
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        let max_tokens = max_tokens.unwrap_or(self.state.max_output_tokens);
        info!(model = %self.state.model_id, max_tokens, "Generating with OpenAI");

        let content = MessageContent::Text(prompt.to_string());
        self.send(self.build_request(content, max_tokens)).await
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
