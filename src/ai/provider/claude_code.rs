//! Claude Code CLI Provider
//!
//! Text generation through the local `claude` CLI. The CLI takes no image
//! input, so this adapter is text-only and rejects `analyze` outright.
//!
//! Note: single-shot execution only. Fallback is handled by the caller.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::{AiProvider, ProviderConfig, ProviderState};
use crate::types::ProviderError;

const PROVIDER_NAME: &str = "claude-code";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub struct ClaudeCodeProvider {
    timeout_secs: u64,
    state: ProviderState,
}

impl ClaudeCodeProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
            state: ProviderState::ready(
                config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                config.max_tokens,
            ),
        }
    }

    async fn execute(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("Executing Claude Code CLI (model={})", self.state.model_id);

        let child = Command::new("claude")
            .arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.state.model_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProviderError::not_configured(
                    PROVIDER_NAME,
                    format!("Failed to spawn Claude Code CLI: {}. Is it installed?", e),
                )
            })?;

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            ProviderError::network(
                PROVIDER_NAME,
                format!("timed out after {}s", self.timeout_secs),
            )
        })?
        .map_err(|e| ProviderError::unknown(PROVIDER_NAME, format!("execution failed: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = serde_json::from_str::<Value>(&stdout)
                .ok()
                .filter(|r| r.get("is_error").and_then(Value::as_bool).unwrap_or(false))
                .and_then(|r| r.get("result").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| {
                    if stderr.trim().is_empty() {
                        "Process exited with non-zero status".to_string()
                    } else {
                        stderr.trim().to_string()
                    }
                });
            return Err(classify_cli_error(&detail));
        }

        parse_cli_output(&stdout)
    }
}

/// Pull the `result` text out of the CLI's JSON envelope
fn parse_cli_output(stdout: &str) -> Result<String, ProviderError> {
    let response: Value = serde_json::from_str(stdout).map_err(|e| {
        ProviderError::unknown(PROVIDER_NAME, format!("Failed to parse CLI output: {}", e))
    })?;

    response
        .get("result")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::empty(PROVIDER_NAME))
}

fn classify_cli_error(detail: &str) -> ProviderError {
    let lower = detail.to_lowercase();
    if lower.contains("rate limit") || lower.contains("429") {
        ProviderError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            retry_after: None,
        }
    } else if lower.contains("api key") || lower.contains("unauthorized") || lower.contains("401")
    {
        ProviderError::Unauthorized {
            provider: PROVIDER_NAME.to_string(),
        }
    } else {
        ProviderError::unknown(PROVIDER_NAME, detail)
    }
}

#[async_trait]
impl AiProvider for ClaudeCodeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    fn supports_vision(&self) -> bool {
        false
    }

    async fn analyze(&self, _image: &[u8], _instructions: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Capability {
            provider: PROVIDER_NAME.to_string(),
            operation: "image analysis",
        })
    }

    async fn generate(
        &self,
        prompt: &str,
        _max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        info!("Generating with Claude Code CLI (model: {})", self.state.model_id);
        self.execute(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCategory;

    #[tokio::test]
    async fn test_analyze_is_capability_error() {
        let provider = ClaudeCodeProvider::new(ProviderConfig::new("claude-code"));
        let err = provider.analyze(&[1, 2, 3], "inspect").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Capability);
    }

    #[test]
    fn test_parse_cli_output() {
        let text = parse_cli_output(r#"{"type":"result","result":"EXECUTIVE SUMMARY\nAll good"}"#)
            .unwrap();
        assert!(text.starts_with("EXECUTIVE SUMMARY"));

        let empty = parse_cli_output(r#"{"result":"  "}"#).unwrap_err();
        assert_eq!(empty.category(), ErrorCategory::Empty);

        let garbage = parse_cli_output("not json").unwrap_err();
        assert_eq!(garbage.category(), ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_cli_error() {
        assert_eq!(
            classify_cli_error("Rate limit reached").category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            classify_cli_error("Invalid API key").category(),
            ErrorCategory::Auth
        );
        assert_eq!(classify_cli_error("boom").category(), ErrorCategory::Unknown);
    }
}
