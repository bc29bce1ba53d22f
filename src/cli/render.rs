//! Report rendering for the CLI
//!
//! JSON carries the section map together with analyses and provenance;
//! markdown renders one `## SECTION` block per section.

use std::path::Path;

use clap::ValueEnum;
use tracing::info;

use crate::types::{PipelineOutput, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

pub fn render(output: &PipelineOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
        OutputFormat::Markdown => Ok(render_markdown(output)),
    }
}

fn render_markdown(output: &PipelineOutput) -> String {
    let mut doc = String::from("# Inspection Report\n\n");
    doc.push_str(&format!("_Source: {}_\n", output.source));

    if !output.failed_images.is_empty() {
        let failed = output
            .failed_images
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        doc.push_str(&format!("\n> Images not analyzed: {}\n", failed));
    }

    for (name, body) in output.sections.iter() {
        doc.push_str(&format!("\n## {}\n\n{}\n", name, body));
    }
    doc
}

/// Write to `path`, or stdout when absent
pub async fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, text).await?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SectionParser;
    use crate::types::{AnalysisResult, ReportSource};
    use uuid::Uuid;

    fn output() -> PipelineOutput {
        let text = "EXECUTIVE SUMMARY\nSound overall.\n\nCONCLUSION\nNo urgent work.";
        PipelineOutput {
            run_id: Uuid::nil(),
            source: ReportSource::Template,
            sections: SectionParser::new().parse(text),
            analyses: vec![AnalysisResult::degraded(1, "Roof photo")],
            failed_images: vec![2, 4],
            report_text: text.to_string(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_blocks() {
        let md = render(&output(), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Inspection Report"));
        assert!(md.contains("_Source: template_"));
        assert!(md.contains("> Images not analyzed: 2, 4"));
        assert!(md.contains("## EXECUTIVE SUMMARY\n\nSound overall.\n"));
        assert!(md.find("## EXECUTIVE SUMMARY") < md.find("## CONCLUSION"));
    }

    #[test]
    fn test_json_keeps_section_order_and_omits_images() {
        let json = render(&output(), OutputFormat::Json).unwrap();
        assert!(json.find("\"EXECUTIVE SUMMARY\"") < json.find("\"CONCLUSION\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sections"]["CONCLUSION"], "No urgent work.");
        assert_eq!(value["source"]["kind"], "template");
        assert_eq!(value["analyses"].as_array().unwrap().len(), 1);
        assert!(value.get("images").is_none());
    }

    #[tokio::test]
    async fn test_write_output_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/report.md");
        write_output("body", Some(&path)).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "body");
    }
}
