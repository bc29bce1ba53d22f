//! Template Command
//!
//! Render the deterministic template report from saved analyses, offline.
//!
//! Usage:
//!   sitereport template --analyses analyses.json [--date 2026-05-02] [--format json]
//!
//! The analyses file is either a JSON array of analysis results or the JSON
//! output of `sitereport generate`.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::Value;
use tokio::runtime::Runtime;
use uuid::Uuid;

use crate::cli::render::{OutputFormat, render, write_output};
use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::report::{ReportContext, SectionParser, TemplateEngine};
use crate::types::{AnalysisResult, PipelineOutput, ReportError, ReportSource, Result};

#[derive(Debug, Clone, Default)]
pub struct TemplateOptions {
    pub analyses: PathBuf,
    pub transcript: Option<PathBuf>,
    pub location: Option<String>,
    pub multiplier: Option<f64>,
    pub date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

pub fn run(options: TemplateOptions) -> Result<()> {
    let rt = Runtime::new()?;
    rt.block_on(run_async(options))
}

async fn run_async(options: TemplateOptions) -> Result<()> {
    let report = ConfigLoader::load()?.report;

    let analyses = parse_analyses(&tokio::fs::read_to_string(&options.analyses).await?)?;
    let transcript = match &options.transcript {
        Some(path) => tokio::fs::read_to_string(path).await?.trim().to_string(),
        None => String::new(),
    };

    let mut ctx = ReportContext::new(transcript)
        .with_multiplier(options.multiplier.unwrap_or(report.cost_multiplier));
    if let Some(location) = options.location.or(report.location) {
        ctx = ctx.with_location(location);
    }
    if let Some(date) = options.date {
        ctx = ctx.with_date(date);
    }

    let output = template_output(analyses, &ctx);
    write_output(&render(&output, options.format)?, options.output.as_deref()).await?;

    Output::new().success(&format!(
        "Template report from {} analyses",
        output.analyses.len()
    ));
    Ok(())
}

fn template_output(analyses: Vec<AnalysisResult>, ctx: &ReportContext) -> PipelineOutput {
    let report_text = TemplateEngine::new().render(&analyses, ctx);
    PipelineOutput {
        run_id: Uuid::new_v4(),
        source: ReportSource::Template,
        sections: SectionParser::new().parse(&report_text),
        analyses,
        failed_images: Vec::new(),
        report_text,
        images: Vec::new(),
    }
}

/// Accepts a bare array or an object with an `analyses` array
fn parse_analyses(content: &str) -> Result<Vec<AnalysisResult>> {
    let value: Value = serde_json::from_str(content)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove("analyses").ok_or_else(|| {
            ReportError::Config("analyses file has no \"analyses\" array".to_string())
        })?,
        _ => {
            return Err(ReportError::Config(
                "analyses file must hold a JSON array or object".to_string(),
            ));
        }
    };
    Ok(serde_json::from_value(list)?)
}
