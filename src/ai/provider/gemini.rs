//! Google Gemini Provider
//!
//! Vision and text generation through the `generateContent` endpoint.
//! Images are sent as `inline_data` parts next to the instruction text.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiProvider, ImageInput, ProviderConfig, ProviderState, http_client};
use crate::types::{ErrorClassifier, ProviderError};

const PROVIDER_NAME: &str = "gemini";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-pro";

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    temperature: f32,
    state: ProviderState,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("state", &self.state)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::not_configured(
                    PROVIDER_NAME,
                    "API key not found. Set GEMINI_API_KEY env var or provide in config",
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

    fn build_request(&self, parts: Vec<Part>, max_tokens: u32) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: max_tokens,
            },
        }
    }

    async fn send(&self, request: GenerateContentRequest) -> Result<String, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, self.state.model_id
        );

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
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

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        let text = body.text();
        if text.trim().is_empty() {
            return Err(ProviderError::empty(PROVIDER_NAME));
        }
        Ok(text)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
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
        info!(model = %self.state.model_id, bytes = image.len(), "Analyzing image with Gemini");

        let image = ImageInput::from_bytes(image);
        let parts = vec![
            Part::Text {
                text: instructions.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type.to_string(),
                    data: image.data,
                },
            },
        ];
        self.send(self.build_request(parts, self.state.max_output_tokens))
            .await
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        let max_tokens = max_tokens.unwrap_or(self.state.max_output_tokens);
        info!(model = %self.state.model_id, max_tokens, "Generating with Gemini");

        let parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        self.send(self.build_request(parts, max_tokens)).await
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
