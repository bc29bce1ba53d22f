//! Image Analyzer
//!
//! Obtains one `AnalysisResult` for one photograph by walking an ordered
//! provider list. An error or an empty answer moves on to the next provider;
//! the first non-empty answer is final, even when it holds no usable JSON
//! (that case becomes a degraded result rather than another provider call).

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::ai::provider::SharedProvider;
use crate::ai::{TimeoutConfig, analysis_instructions, extract_json_from_response, with_timeout};
use crate::types::{AnalysisResult, ProviderError, ReportError, Result};

pub struct ImageAnalyzer {
    providers: Vec<SharedProvider>,
    instructions: String,
    call_timeout: Duration,
}

impl ImageAnalyzer {
    /// Providers in preference order: primary first, then fallbacks
    pub fn new(providers: Vec<SharedProvider>) -> Self {
        Self {
            providers,
            instructions: analysis_instructions(),
            call_timeout: TimeoutConfig::default().analysis,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Analyze one image. `index` is its 1-based position in the input list.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn analyze(&self, index: usize, image: &[u8]) -> Result<AnalysisResult> {
        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name();
            let reply = with_timeout(
                self.call_timeout,
                name,
                provider.analyze(image, &self.instructions),
            )
            .await;

            let error = match reply {
                Ok(text) if !text.trim().is_empty() => {
                    info!("Image {} analyzed by {}", index, name);
                    return Ok(interpret(index, &text));
                }
                Ok(_) => ProviderError::empty(name),
                Err(e) => e,
            };

            warn!(
                "Image {}: {} failed [{}]: {}",
                index,
                name,
                error.category(),
                error
            );
            failures.push(error.to_string());
        }

        let reason = if failures.is_empty() {
            "no vision providers configured".to_string()
        } else {
            failures.join("; ")
        };
        Err(ReportError::ImageAnalysisFailed { index, reason })
    }
}

/// Turn a non-empty provider answer into a result, degrading when no JSON
/// object can be recovered.
fn interpret(index: usize, text: &str) -> AnalysisResult {
    match extract_json_from_response(text) {
        Some(value) if value.is_object() => AnalysisResult::from_json(index, &value),
        _ => {
            debug!("Image {}: response held no JSON object, degrading", index);
            AnalysisResult::degraded(index, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ProviderConfig;
    use crate::report::testing::{MockProvider, VALID_ANALYSIS, chain, rate_limited};
    use crate::types::Severity;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = MockProvider::new("primary").shared();
        let secondary = MockProvider::new("secondary").shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary, &secondary]));

        let result = analyzer.analyze(1, b"img").await.unwrap();

        assert_eq!(result.image_index, 1);
        assert_eq!(primary.analyze_calls(), 1);
        assert_eq!(secondary.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_primary_fails_over_once() {
        let primary = MockProvider::new("primary")
            .failing(rate_limited("primary"))
            .shared();
        let secondary = MockProvider::new("secondary").shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary, &secondary]));

        let result = analyzer.analyze(4, b"img").await.unwrap();

        assert_eq!(primary.analyze_calls(), 1);
        assert_eq!(secondary.analyze_calls(), 1);
        assert_eq!(result.image_index, 4);
        assert_eq!(result.overall_condition, "Fair");
        assert_eq!(result.material_type.as_deref(), Some("Brick"));
        assert_eq!(result.defects.len(), 1);
        assert_eq!(result.defects[0].severity(), Severity::High);
        assert_eq!(result.defects[0].confidence_score(), 88);
    }

    #[tokio::test]
    async fn test_empty_primary_fails_over() {
        let primary = MockProvider::new("primary").answering("   ").shared();
        let secondary = MockProvider::new("secondary").shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary, &secondary]));

        assert!(analyzer.analyze(1, b"img").await.is_ok());
        assert_eq!(secondary.analyze_calls(), 1);
    }

    #[tokio::test]
    async fn test_fenced_response_is_parsed() {
        let fenced = format!("```json\n{}\n```", VALID_ANALYSIS);
        let primary = MockProvider::new("primary").answering(&fenced).shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary]));

        let result = analyzer.analyze(2, b"img").await.unwrap();
        assert_eq!(result.description, "Rear elevation");
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_array_wrapped_answer_keeps_its_defects() {
        let wrapped = format!("[{}]", VALID_ANALYSIS);
        let primary = MockProvider::new("primary").answering(&wrapped).shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary]));

        let result = analyzer.analyze(5, b"img").await.unwrap();

        assert!(!result.is_degraded());
        assert_eq!(result.description, "Rear elevation");
        assert_eq!(result.defects.len(), 1);
        assert_eq!(result.defects[0].defect_type(), "Crack");
    }

    #[tokio::test]
    async fn test_prose_response_degrades_without_failover() {
        let prose = "The wall shows some staining but I cannot be sure. ".repeat(20);
        let primary = MockProvider::new("primary").answering(&prose).shared();
        let secondary = MockProvider::new("secondary").shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary, &secondary]));

        let result = analyzer.analyze(3, b"img").await.unwrap();

        assert!(result.is_degraded());
        assert_eq!(result.overall_condition, "Unknown - Analysis incomplete");
        assert_eq!(result.description.chars().count(), 500);
        assert!(result.defects.is_empty());
        assert_eq!(secondary.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let primary = MockProvider::new("primary")
            .failing(ProviderError::network("primary", "connection reset"))
            .shared();
        let secondary = MockProvider::new("secondary")
            .failing(rate_limited("secondary"))
            .shared();
        let analyzer = ImageAnalyzer::new(chain(&[&primary, &secondary]));

        match analyzer.analyze(5, b"img").await {
            Err(ReportError::ImageAnalysisFailed { index, reason }) => {
                assert_eq!(index, 5);
                assert!(reason.contains("connection reset"));
                assert!(reason.contains("secondary"));
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.image_index)),
        }
    }

    #[tokio::test]
    async fn test_text_only_provider_is_skipped_via_capability_error() {
        let text_only = crate::ai::create_provider(&ProviderConfig::new("claude-code")).unwrap();
        let vision = MockProvider::new("vision").shared();
        let analyzer = ImageAnalyzer::new(vec![text_only, vision.clone() as SharedProvider]);

        assert!(analyzer.analyze(1, b"img").await.is_ok());
        assert_eq!(vision.analyze_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_providers() {
        let analyzer = ImageAnalyzer::new(Vec::new());
        let err = analyzer.analyze(1, b"img").await.unwrap_err();
        assert!(err.to_string().contains("no vision providers"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_primary_times_out_and_fails_over() {
        struct Slow;

        #[async_trait::async_trait]
        impl crate::ai::AiProvider for Slow {
            fn name(&self) -> &str {
                "slow"
            }
            fn state(&self) -> &crate::ai::ProviderState {
                unimplemented!()
            }
            fn supports_vision(&self) -> bool {
                true
            }
            async fn analyze(&self, _: &[u8], _: &str) -> std::result::Result<String, ProviderError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(VALID_ANALYSIS.to_string())
            }
            async fn generate(
                &self,
                _: &str,
                _: Option<u32>,
            ) -> std::result::Result<String, ProviderError> {
                unimplemented!()
            }
        }

        let secondary = MockProvider::new("secondary").shared();
        let analyzer = ImageAnalyzer::new(vec![Arc::new(Slow) as SharedProvider, secondary.clone()])
            .with_call_timeout(Duration::from_secs(5));

        assert!(analyzer.analyze(1, b"img").await.is_ok());
        assert_eq!(secondary.analyze_calls(), 1);
    }
}
