//! Core domain types

pub mod defect;
pub mod error;
pub mod report;

pub use defect::{AnalysisResult, Defect, Severity};
pub use error::{ErrorCategory, ErrorClassifier, ProviderError, ReportError, Result};
pub use report::{LogEntry, PipelineOutput, ReportSections, ReportSource};
