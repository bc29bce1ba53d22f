//! SiteReport - AI-Assisted Site Inspection Reports
//!
//! Turns inspection photos and inspector notes into a structured report.
//! Each photo is analyzed by a chain of vision providers; the findings are
//! written up by a text provider, or by a deterministic template when the AI
//! path is unavailable or its output falls short.
//!
//! ## Core Features
//!
//! - **Provider Failover**: vision providers tried in order for every image
//! - **Concurrent Analysis**: all images analyzed at once, failures isolated
//! - **Template Fallback**: offline report with cost and time estimates
//! - **Section Parsing**: report text split into the nine named sections
//!
//! ## Quick Start
//!
//! ```ignore
//! use sitereport::{ConfigLoader, LogEntry, ProgressReporter, ReportPipeline};
//!
//! let config = ConfigLoader::load()?;
//! let pipeline = ReportPipeline::from_config(&config, ProgressReporter::silent())?;
//! let output = pipeline
//!     .run(&[LogEntry::new(std::fs::read("roof.jpg")?, "Slipped slates")])
//!     .await?;
//! println!("{}", output.sections.to_text());
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider adapters, prompts, JSON extraction, report acceptance
//! - [`report`]: analyzer, orchestrator, composer, template engine, section parser
//! - [`config`]: layered configuration
//! - [`types`]: domain values and errors

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod report;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader, ProvidersConfig, ReportConfig};

pub use types::error::{ErrorCategory, ProviderError, ReportError, Result};
pub use types::{
    AnalysisResult, Defect, LogEntry, PipelineOutput, ReportSections, ReportSource, Severity,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use report::{
    AnalysisOrchestrator, ComposedReport, ImageAnalyzer, ProgressReporter, ReportComposer,
    ReportContext, ReportPipeline, ReportPipelineBuilder, SectionParser, TemplateEngine,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    AiProvider, ProviderConfig, SharedProvider, TimeoutConfig, create_provider, with_timeout,
};
