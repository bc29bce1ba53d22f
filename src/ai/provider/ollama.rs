//! Ollama Local Provider
//!
//! Locally-running models through `/api/generate`. Vision models (llava,
//! llama3.2-vision, ...) accept base64 images in the `images` array.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AiProvider, ImageInput, ProviderConfig, ProviderState, http_client};
use crate::types::{ErrorClassifier, ProviderError};

const PROVIDER_NAME: &str = "ollama";
const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llava:latest";

pub struct OllamaProvider {
    api_base: String,
    temperature: f32,
    state: ProviderState,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Self::validate_endpoint(&api_base)?;
        let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let client = http_client(PROVIDER_NAME, config.timeout_secs)?;

        Ok(Self {
            api_base,
            temperature: config.temperature,
            state: ProviderState::ready(model, config.max_tokens),
            client,
        })
    }

    /// Only http/https endpoints are accepted; non-local hosts are allowed with a warning
    fn validate_endpoint(endpoint: &str) -> Result<String, ProviderError> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            ProviderError::not_configured(
                PROVIDER_NAME,
                format!("Invalid endpoint URL '{}': {}", endpoint, e),
            )
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::not_configured(
                PROVIDER_NAME,
                format!("Endpoint must use http or https scheme, got: {}", url.scheme()),
            ));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    async fn send(&self, request: OllamaRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.api_base);

        debug!("Sending request to Ollama API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::network(
                        PROVIDER_NAME,
                        format!(
                            "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                            self.api_base
                        ),
                    )
                } else {
                    ErrorClassifier::classify_transport(&e, PROVIDER_NAME)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status,
                &body,
                PROVIDER_NAME,
            ));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        if body.response.trim().is_empty() {
            return Err(ProviderError::empty(PROVIDER_NAME));
        }
        Ok(body.response)
    }

    fn build_request(&self, prompt: &str, images: Vec<String>, max_tokens: u32) -> OllamaRequest {
        OllamaRequest {
            model: self.state.model_id.clone(),
            prompt: prompt.to_string(),
            images,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: max_tokens,
            },
        }
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
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
        info!(model = %self.state.model_id, bytes = image.len(), "Analyzing image with Ollama");

        let image = ImageInput::from_bytes(image);
        self.send(self.build_request(
            instructions,
            vec![image.data],
            self.state.max_output_tokens,
        ))
        .await
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        let max_tokens = max_tokens.unwrap_or(self.state.max_output_tokens);
        info!(model = %self.state.model_id, max_tokens, "Generating with Ollama");

        self.send(self.build_request(prompt, Vec::new(), max_tokens))
            .await
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}
