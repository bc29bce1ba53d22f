//! Report Pipeline
//!
//! images + transcripts → orchestrator → composer (AI, else template)
//! → section parser → `PipelineOutput`
//!
//! Provider handles are built once here and passed down read-only; a run
//! owns all of its intermediate state.
//!
//! ```ignore
//! let pipeline = ReportPipeline::from_config(&config, ProgressReporter::new(|m| eprintln!("{m}")))?;
//! let output = pipeline.run(&entries).await?;
//! ```

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::analyzer::ImageAnalyzer;
use super::composer::ReportComposer;
use super::orchestrator::AnalysisOrchestrator;
use super::progress::ProgressReporter;
use super::sections::SectionParser;
use super::template::ReportContext;
use crate::ai::provider::{SharedProvider, create_provider};
use crate::config::{Config, ReportConfig};
use crate::types::{LogEntry, PipelineOutput, ReportError, Result};

pub struct ReportPipeline {
    orchestrator: AnalysisOrchestrator,
    composer: ReportComposer,
    parser: SectionParser,
    report: ReportConfig,
}

impl ReportPipeline {
    pub fn builder() -> ReportPipelineBuilder {
        ReportPipelineBuilder::default()
    }

    /// Build providers from configuration. Vision providers that fail to
    /// initialize are skipped; a text provider that fails leaves the
    /// pipeline in template-only mode.
    pub fn from_config(config: &Config, progress: ProgressReporter) -> Result<Self> {
        let mut vision = Vec::with_capacity(config.providers.vision.len());
        for provider_config in &config.providers.vision {
            match create_provider(provider_config) {
                Ok(provider) if provider.supports_vision() => {
                    info!(
                        "Vision provider ready: {} ({})",
                        provider.name(),
                        provider.state().model_id
                    );
                    vision.push(provider);
                }
                Ok(provider) => {
                    warn!("Skipping {}: no image support", provider.name());
                }
                Err(e) => warn!("Skipping vision provider: {}", e),
            }
        }

        let text = match &config.providers.text {
            Some(text_config) => match create_provider(text_config) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("Text provider unavailable, reports will use the template: {}", e);
                    None
                }
            },
            None => None,
        };

        let mut builder = Self::builder()
            .vision_providers(vision)
            .report_config(config.report.clone())
            .progress(progress);
        if let Some(text) = text {
            builder = builder.text_provider(text);
        }
        builder.build()
    }

    /// Run one full pipeline over captured log entries
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn run(&self, entries: &[LogEntry]) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        info!("Pipeline run {} started", run_id);

        let images: Vec<Arc<[u8]>> = entries.iter().map(|e| Arc::clone(&e.image)).collect();
        let outcome = self.orchestrator.run(&images).await?;

        let ctx = self.context_for(entries);
        let composed = self.composer.compose(&outcome.analyses, &ctx).await;
        let sections = self.parser.parse(&composed.text);

        info!(
            "Pipeline run {} finished: {} sections from {}",
            run_id,
            sections.len(),
            composed.source
        );

        Ok(PipelineOutput {
            run_id,
            source: composed.source,
            sections,
            analyses: outcome.analyses,
            failed_images: outcome.failed,
            report_text: composed.text,
            images,
        })
    }

    /// Transcripts joined in entry order; the inspection date is the latest
    /// entry timestamp.
    fn context_for(&self, entries: &[LogEntry]) -> ReportContext {
        let transcript = entries
            .iter()
            .map(|e| e.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let mut ctx = ReportContext::new(transcript).with_multiplier(self.report.cost_multiplier);
        if let Some(location) = &self.report.location {
            ctx = ctx.with_location(location.clone());
        }
        if let Some(latest) = entries.iter().map(|e| e.timestamp).max() {
            ctx = ctx.with_date(latest.date_naive());
        }
        ctx
    }
}

#[derive(Default)]
pub struct ReportPipelineBuilder {
    vision: Vec<SharedProvider>,
    text: Option<SharedProvider>,
    report: ReportConfig,
    progress: ProgressReporter,
}

impl ReportPipelineBuilder {
    /// Append a vision provider; earlier providers are preferred
    pub fn vision_provider(mut self, provider: SharedProvider) -> Self {
        self.vision.push(provider);
        self
    }

    pub fn vision_providers(mut self, providers: Vec<SharedProvider>) -> Self {
        self.vision.extend(providers);
        self
    }

    pub fn text_provider(mut self, provider: SharedProvider) -> Self {
        self.text = Some(provider);
        self
    }

    pub fn report_config(mut self, report: ReportConfig) -> Self {
        self.report = report;
        self
    }

    pub fn progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn build(self) -> Result<ReportPipeline> {
        if self.vision.is_empty() {
            return Err(ReportError::NoProviderConfigured);
        }

        let timeouts = self.report.timeouts();
        let analyzer = ImageAnalyzer::new(self.vision).with_call_timeout(timeouts.analysis);
        let orchestrator = AnalysisOrchestrator::new(Arc::new(analyzer), self.progress.clone());

        if self.text.is_none() {
            info!("No text provider configured, reports will use the template");
        }
        let composer = ReportComposer::new(self.text, self.progress)
            .with_policy(self.report.acceptance_policy())
            .with_max_tokens(self.report.report_max_tokens)
            .with_call_timeout(timeouts.generation);

        Ok(ReportPipeline {
            orchestrator,
            composer,
            parser: SectionParser::new(),
            report: self.report,
        })
    }
}
