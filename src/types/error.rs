//! Unified Error Type System
//!
//! Two layers of errors:
//!
//! - **ProviderError**: a single failed call against one AI endpoint. Always
//!   recoverable at the pipeline level (failover to the next provider, or fall
//!   through to the template report).
//! - **ReportError**: crate-wide error. Only `NoAnalysisAvailable` and
//!   `NoProviderConfigured` end a pipeline run; everything else is absorbed by
//!   a fallback path before it reaches the caller.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Coarse classification of provider failures, used for logging and routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Provider was never configured (missing credential or endpoint)
    NotConfigured,
    /// Operation not supported by this provider (e.g. vision on a text-only model)
    Capability,
    /// Credential rejected
    Auth,
    /// Rate limited by the vendor
    RateLimit,
    /// Connectivity, timeout or 5xx
    Network,
    /// Call succeeded but carried no text
    Empty,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "NOT_CONFIGURED"),
            Self::Capability => write!(f, "CAPABILITY"),
            Self::Auth => write!(f, "AUTH"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Network => write!(f, "NETWORK"),
            Self::Empty => write!(f, "EMPTY"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// Provider Error
// =============================================================================

/// Failure of a single provider call. Adapters never retry; callers decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("{provider} does not support {operation}")]
    Capability {
        provider: String,
        operation: &'static str,
    },

    #[error("{provider} rejected the credential")]
    Unauthorized { provider: String },

    #[error("{provider} rate limited the request")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("{provider} network error: {detail}")]
    Network { provider: String, detail: String },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("{provider} error: {detail}")]
    Unknown { provider: String, detail: String },
}

impl ProviderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotConfigured { .. } => ErrorCategory::NotConfigured,
            Self::Capability { .. } => ErrorCategory::Capability,
            Self::Unauthorized { .. } => ErrorCategory::Auth,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network { .. } => ErrorCategory::Network,
            Self::EmptyResponse { .. } => ErrorCategory::Empty,
            Self::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// Name of the provider that produced the error
    pub fn provider(&self) -> &str {
        match self {
            Self::NotConfigured { provider, .. }
            | Self::Capability { provider, .. }
            | Self::Unauthorized { provider }
            | Self::RateLimited { provider, .. }
            | Self::Network { provider, .. }
            | Self::EmptyResponse { provider }
            | Self::Unknown { provider, .. } => provider,
        }
    }

    pub fn not_configured(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn network(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    pub fn unknown(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unknown {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    pub fn empty(provider: impl Into<String>) -> Self {
        Self::EmptyResponse {
            provider: provider.into(),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport-level outcomes onto `ProviderError`
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a non-success HTTP status
    pub fn classify_http_status(status: u16, body: &str, provider: &str) -> ProviderError {
        match status {
            401 | 403 => ProviderError::Unauthorized {
                provider: provider.to_string(),
            },
            429 => ProviderError::RateLimited {
                provider: provider.to_string(),
                retry_after: parse_retry_after(body),
            },
            408 | 500 | 502 | 503 | 504 => {
                ProviderError::network(provider, format!("HTTP {}: {}", status, preview(body)))
            }
            _ => ProviderError::unknown(provider, format!("HTTP {}: {}", status, preview(body))),
        }
    }

    /// Classify a reqwest transport error
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> ProviderError {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ProviderError::network(provider, err.to_string())
        } else if err.is_decode() || err.is_body() {
            ProviderError::unknown(provider, format!("Malformed response: {}", err))
        } else {
            ProviderError::unknown(provider, err.to_string())
        }
    }
}

/// Extract a "retry after N seconds" hint from a rate-limit body
fn parse_retry_after(message: &str) -> Option<Duration> {
    let lower = message.to_lowercase();
    let idx = lower.find("retry")?;
    lower[idx..]
        .split(|c: char| !c.is_ascii_digit())
        .find(|w| !w.is_empty())
        .and_then(|w| w.parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs.min(300)))
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Every provider failed for one image; absorbed by the orchestrator
    #[error("Analysis failed for image {index}: {reason}")]
    ImageAnalysisFailed { index: usize, reason: String },

    #[error("No image could be analyzed ({attempted} attempted)")]
    NoAnalysisAvailable { attempted: usize },

    #[error("No vision provider is configured")]
    NoProviderConfigured,

    /// Internal signal that routes the composer to the template path
    #[error("AI report rejected: {0}")]
    ReportQualityRejected(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Conditions that end a pipeline run instead of being absorbed by a fallback
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoAnalysisAvailable { .. } | Self::NoProviderConfigured
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::Capability.to_string(), "CAPABILITY");
    }

    #[test]
    fn test_classify_http_status() {
        let auth = ErrorClassifier::classify_http_status(401, "bad key", "openai");
        assert_eq!(auth.category(), ErrorCategory::Auth);
        assert_eq!(auth.provider(), "openai");

        let limited = ErrorClassifier::classify_http_status(
            429,
            "Rate limit exceeded. Please retry after 20 seconds.",
            "gemini",
        );
        assert_eq!(
            limited,
            ProviderError::RateLimited {
                provider: "gemini".to_string(),
                retry_after: Some(Duration::from_secs(20)),
            }
        );

        let server = ErrorClassifier::classify_http_status(503, "overloaded", "openai");
        assert_eq!(server.category(), ErrorCategory::Network);

        let other = ErrorClassifier::classify_http_status(422, "bad payload", "openai");
        assert_eq!(other.category(), ErrorCategory::Unknown);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(
            parse_retry_after("retry after 1000 seconds"),
            Some(Duration::from_secs(300))
        );
        assert_eq!(parse_retry_after("slow down"), None);
    }

    #[test]
    fn test_fatal_errors() {
        assert!(ReportError::NoAnalysisAvailable { attempted: 3 }.is_fatal());
        assert!(ReportError::NoProviderConfigured.is_fatal());
        assert!(!ReportError::ReportQualityRejected("short".into()).is_fatal());
        assert!(
            !ReportError::ImageAnalysisFailed {
                index: 1,
                reason: "all providers failed".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Capability {
            provider: "claude-code".to_string(),
            operation: "image analysis",
        };
        assert_eq!(err.to_string(), "claude-code does not support image analysis");
    }
}
