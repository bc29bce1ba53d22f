//! Report Composer
//!
//! `AttemptAI → {Accepted | Rejected → Template} → Done`
//!
//! The AI path is tried once. Any provider error, a missing text provider, or
//! a response failing the acceptance heuristics routes to the template engine,
//! which always succeeds. The two paths never run concurrently.

use std::time::Duration;

use tracing::{info, instrument, warn};

use super::progress::{self, ProgressReporter};
use super::template::{ReportContext, TemplateEngine};
use crate::ai::provider::SharedProvider;
use crate::ai::{AcceptancePolicy, TimeoutConfig, report_prompt, with_timeout};
use crate::constants::composer as consts;
use crate::types::{AnalysisResult, ProviderError, ReportError, ReportSource, Result};

/// Report text plus the path that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReport {
    pub text: String,
    pub source: ReportSource,
}

pub struct ReportComposer {
    provider: Option<SharedProvider>,
    engine: TemplateEngine,
    policy: AcceptancePolicy,
    max_tokens: u32,
    call_timeout: Duration,
    progress: ProgressReporter,
}

impl ReportComposer {
    /// `provider = None` composes template reports only
    pub fn new(provider: Option<SharedProvider>, progress: ProgressReporter) -> Self {
        Self {
            provider,
            engine: TemplateEngine::new(),
            policy: AcceptancePolicy {
                min_chars: consts::MIN_REPORT_CHARS,
                min_section_keywords: consts::MIN_SECTION_KEYWORDS,
            },
            max_tokens: consts::REPORT_MAX_TOKENS,
            call_timeout: TimeoutConfig::default().generation,
            progress,
        }
    }

    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Produce a report. Never fails.
    #[instrument(skip_all, fields(analyses = analyses.len()))]
    pub async fn compose(&self, analyses: &[AnalysisResult], ctx: &ReportContext) -> ComposedReport {
        self.progress.report(progress::GENERATING);

        let report = match self.attempt_ai(analyses, ctx).await {
            Ok(report) => report,
            Err(e) => {
                warn!("AI report not used: {}", e);
                self.progress.report(progress::FALLING_BACK);
                ComposedReport {
                    text: self.engine.render(analyses, ctx),
                    source: ReportSource::Template,
                }
            }
        };

        self.progress.report(progress::COMPLETE);
        report
    }

    async fn attempt_ai(
        &self,
        analyses: &[AnalysisResult],
        ctx: &ReportContext,
    ) -> Result<ComposedReport> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            ProviderError::not_configured("text", "no text generation provider configured")
        })?;

        let prompt = report_prompt(analyses, ctx);
        info!(
            "Requesting report from {} ({} prompt chars, max {} tokens)",
            provider.name(),
            prompt.len(),
            self.max_tokens
        );

        let text = with_timeout(
            self.call_timeout,
            provider.name(),
            provider.generate(&prompt, Some(self.max_tokens)),
        )
        .await?;

        self.policy
            .check(&text)
            .map_err(|rejection| ReportError::ReportQualityRejected(rejection.to_string()))?;

        info!("AI report accepted ({} chars)", text.trim().len());
        Ok(ComposedReport {
            text: text.trim().to_string(),
            source: ReportSource::Ai {
                provider: provider.name().to_string(),
                model: provider.state().model_id.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::progress::recording;
    use crate::report::sections::REQUIRED_SECTIONS;
    use crate::report::testing::{MockProvider, rate_limited};
    use crate::types::{Defect, Severity};
    use std::sync::Arc;

    fn analyses() -> Vec<AnalysisResult> {
        vec![AnalysisResult {
            image_index: 1,
            description: "Front porch".to_string(),
            overall_condition: "Poor".to_string(),
            material_type: Some("Timber".to_string()),
            defects: vec![Defect::new("Rot", "Post base", Severity::High, 90, "Soft timber")],
        }]
    }

    fn ai_report() -> String {
        REQUIRED_SECTIONS
            .iter()
            .map(|name| format!("{}\n{}", name, "Detailed professional narrative. ".repeat(4)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn composer(mock: &Arc<MockProvider>) -> (ReportComposer, Arc<std::sync::Mutex<Vec<String>>>) {
        let (progress, log) = recording();
        let provider: SharedProvider = mock.clone();
        (ReportComposer::new(Some(provider), progress), log)
    }

    #[tokio::test]
    async fn test_accepts_complete_ai_report() {
        let mock = MockProvider::new("writer")
            .generating(Ok(ai_report()))
            .shared();
        let (composer, log) = composer(&mock);

        let report = composer.compose(&analyses(), &ReportContext::new("")).await;

        assert_eq!(
            report.source,
            ReportSource::Ai {
                provider: "writer".to_string(),
                model: "mock-model".to_string()
            }
        );
        assert_eq!(report.text, ai_report().trim());
        assert_eq!(
            log.lock().unwrap().clone(),
            vec![progress::GENERATING, progress::COMPLETE]
        );
    }

    #[tokio::test]
    async fn test_short_stub_falls_back_to_identical_template() {
        let stub = "x".repeat(50);
        let mock = MockProvider::new("writer").generating(Ok(stub)).shared();
        let (composer, log) = composer(&mock);
        let ctx = ReportContext::new("Loose handrail").with_multiplier(1.1);

        let report = composer.compose(&analyses(), &ctx).await;

        assert_eq!(report.source, ReportSource::Template);
        assert_eq!(report.text, TemplateEngine::new().render(&analyses(), &ctx));
        assert_eq!(mock.generate_calls(), 1);
        assert_eq!(
            log.lock().unwrap().clone(),
            vec![progress::GENERATING, progress::FALLING_BACK, progress::COMPLETE]
        );
    }

    #[tokio::test]
    async fn test_long_text_without_sections_is_rejected() {
        let mock = MockProvider::new("writer")
            .generating(Ok("Unstructured rambling. ".repeat(60)))
            .shared();
        let (composer, _) = composer(&mock);

        let report = composer.compose(&analyses(), &ReportContext::new("")).await;
        assert!(report.source.is_template());
    }

    #[tokio::test]
    async fn test_keyword_check_can_be_disabled() {
        let mock = MockProvider::new("writer")
            .generating(Ok("Unstructured rambling. ".repeat(60)))
            .shared();
        let (composer, _) = composer(&mock);
        let composer = composer.with_policy(AcceptancePolicy {
            min_chars: 500,
            min_section_keywords: 0,
        });

        let report = composer.compose(&analyses(), &ReportContext::new("")).await;
        assert!(!report.source.is_template());
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_without_retry() {
        let mock = MockProvider::new("writer")
            .generating(Err(rate_limited("writer")))
            .shared();
        let (composer, _) = composer(&mock);

        let report = composer.compose(&analyses(), &ReportContext::new("")).await;

        assert!(report.source.is_template());
        assert_eq!(mock.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_text_provider_uses_template() {
        let (progress, log) = recording();
        let composer = ReportComposer::new(None, progress);

        let report = composer.compose(&analyses(), &ReportContext::new("")).await;

        assert!(report.source.is_template());
        assert_eq!(log.lock().unwrap().len(), 3);
    }
}
