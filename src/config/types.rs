//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/sitereport/) and project (.sitereport/) level configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::{AcceptancePolicy, ProviderConfig, TimeoutConfig};
use crate::constants::{composer, network};
use crate::types::{ReportError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// AI endpoints
    pub providers: ProvidersConfig,

    /// Report composition settings
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            providers: ProvidersConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ReportError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        for provider in self.providers.all() {
            if !(0.0..=2.0).contains(&provider.temperature) {
                return Err(ReportError::Config(format!(
                    "{} temperature must be between 0.0 and 2.0, got {}",
                    provider.provider, provider.temperature
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(ReportError::Config(format!(
                    "{} timeout_secs must be greater than 0",
                    provider.provider
                )));
            }
        }

        if !self.report.cost_multiplier.is_finite() || self.report.cost_multiplier <= 0.0 {
            return Err(ReportError::Config(format!(
                "report.cost_multiplier must be a positive number, got {}",
                self.report.cost_multiplier
            )));
        }

        if self.report.analysis_timeout_secs == 0 || self.report.generation_timeout_secs == 0 {
            return Err(ReportError::Config(
                "report timeouts must be greater than 0".to_string(),
            ));
        }

        if self.report.min_section_keywords > crate::report::sections::REQUIRED_SECTIONS.len() {
            return Err(ReportError::Config(format!(
                "report.min_section_keywords cannot exceed {}",
                crate::report::sections::REQUIRED_SECTIONS.len()
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Vision providers in preference order (primary first)
    pub vision: Vec<ProviderConfig>,

    /// Text generation provider; absent means template reports only
    pub text: Option<ProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            vision: vec![
                ProviderConfig::new("openai").with_model("gpt-4o"),
                ProviderConfig::new("gemini").with_model("gemini-2.0-flash"),
            ],
            text: Some(ProviderConfig::new("openai").with_model("gpt-4o")),
        }
    }
}

impl ProvidersConfig {
    fn all(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.vision.iter().chain(self.text.iter())
    }
}

// =============================================================================
// Report Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// AI reports must be longer than this (trimmed characters)
    pub min_report_chars: usize,

    /// Required section names an AI report must mention (0 disables the check)
    pub min_section_keywords: usize,

    /// Output token budget for the long-form report
    pub report_max_tokens: u32,

    /// Regional multiplier applied to template cost figures
    pub cost_multiplier: f64,

    /// Property description used in report prose
    pub location: Option<String>,

    /// Deadline for one image analysis call
    pub analysis_timeout_secs: u64,

    /// Deadline for the report generation call
    pub generation_timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_report_chars: composer::MIN_REPORT_CHARS,
            min_section_keywords: composer::MIN_SECTION_KEYWORDS,
            report_max_tokens: composer::REPORT_MAX_TOKENS,
            cost_multiplier: 1.0,
            location: None,
            analysis_timeout_secs: network::ANALYSIS_CALL_TIMEOUT_SECS,
            generation_timeout_secs: network::GENERATION_CALL_TIMEOUT_SECS,
        }
    }
}

impl ReportConfig {
    pub fn acceptance_policy(&self) -> AcceptancePolicy {
        AcceptancePolicy {
            min_chars: self.min_report_chars,
            min_section_keywords: self.min_section_keywords,
        }
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig {
            analysis: Duration::from_secs(self.analysis_timeout_secs),
            generation: Duration::from_secs(self.generation_timeout_secs),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.providers.vision.len(), 2);
        assert_eq!(config.providers.vision[0].provider, "openai");
        assert_eq!(config.report.min_report_chars, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        let mut config = Config::default();
        config.report.cost_multiplier = 0.0;
        assert!(matches!(config.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.providers.vision[1].temperature = 3.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_report_config_conversions() {
        let report = ReportConfig {
            analysis_timeout_secs: 10,
            min_section_keywords: 0,
            ..Default::default()
        };
        assert_eq!(report.timeouts().analysis, Duration::from_secs(10));
        assert_eq!(report.acceptance_policy().min_section_keywords, 0);
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.providers.vision[0].api_key = Some("sk-secret".to_string());
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
    }
}
