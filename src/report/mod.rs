//! Inspection report pipeline
//!
//! - [`analyzer`]: one image against the vision provider chain
//! - [`orchestrator`]: concurrent fan-out over all images
//! - [`composer`]: AI report with template fallback
//! - [`template`]: deterministic offline report
//! - [`sections`]: report text → named sections
//! - [`pipeline`]: the facade tying them together

pub mod analyzer;
pub mod composer;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod sections;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::ImageAnalyzer;
pub use composer::{ComposedReport, ReportComposer};
pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome};
pub use pipeline::{ReportPipeline, ReportPipelineBuilder};
pub use progress::{ProgressCallback, ProgressReporter};
pub use sections::{REQUIRED_SECTIONS, SectionParser};
pub use template::{CostEstimate, ReportContext, TemplateEngine, TimeEstimate};
