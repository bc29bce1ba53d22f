//! Generate Command
//!
//! Analyze inspection photos and write the report.
//!
//! Usage:
//!   sitereport generate --image a.jpg --image b.jpg [--transcript notes.txt]
//!   sitereport generate --manifest visit.json --format json --output report.json
//!   sitereport generate --image a.jpg --template-only
//!
//! A manifest is a JSON array of `{ "image": "path", "transcript": "...", "timestamp": "RFC 3339" }`
//! objects. Relative image paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::cli::render::{OutputFormat, render, write_output};
use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::report::{ProgressReporter, ReportPipeline};
use crate::types::{LogEntry, ReportError, Result};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub images: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
    /// Inspector notes, attached to the first entry
    pub transcript: Option<PathBuf>,
    pub location: Option<String>,
    pub multiplier: Option<f64>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    /// Skip the text provider and always use the template report
    pub template_only: bool,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    image: PathBuf,
    #[serde(default)]
    transcript: String,
    timestamp: Option<DateTime<Utc>>,
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let config = apply_overrides(ConfigLoader::load()?, &options)?;
    let rt = Runtime::new()?;
    rt.block_on(run_async(config, options))
}

async fn run_async(config: Config, options: GenerateOptions) -> Result<()> {
    let out = Output::new();
    let entries = load_entries(&options).await?;
    info!("Loaded {} log entries", entries.len());

    let progress = ProgressReporter::new(move |message| out.progress(message));
    let pipeline = ReportPipeline::from_config(&config, progress)?;
    let output = pipeline.run(&entries).await?;

    let text = render(&output, options.format)?;
    write_output(&text, options.output.as_deref()).await?;

    if !output.failed_images.is_empty() {
        out.warning(&format!(
            "{} of {} images could not be analyzed",
            output.failed_images.len(),
            entries.len()
        ));
    }
    out.success(&format!(
        "Report {} ({} sections, {})",
        output.run_id,
        output.sections.len(),
        output.source
    ));
    Ok(())
}

/// CLI flags take precedence over every config layer
fn apply_overrides(mut config: Config, options: &GenerateOptions) -> Result<Config> {
    if let Some(location) = &options.location {
        config.report.location = Some(location.clone());
    }
    if let Some(multiplier) = options.multiplier {
        config.report.cost_multiplier = multiplier;
    }
    if options.template_only {
        config.providers.text = None;
    }
    config.validate()?;
    Ok(config)
}

async fn load_entries(options: &GenerateOptions) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();

    if let Some(manifest) = &options.manifest {
        entries.extend(load_manifest(manifest).await?);
    }
    for path in &options.images {
        entries.push(LogEntry::new(read_image(path).await?, String::new()));
    }

    if let Some(path) = &options.transcript {
        let notes = tokio::fs::read_to_string(path).await?;
        if let Some(first) = entries.first_mut() {
            first.transcript = join_notes(&first.transcript, &notes);
        }
    }

    Ok(entries)
}

async fn load_manifest(path: &Path) -> Result<Vec<LogEntry>> {
    let content = tokio::fs::read_to_string(path).await?;
    let records: Vec<ManifestEntry> = serde_json::from_str(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let image_path = if record.image.is_absolute() {
            record.image
        } else {
            base.join(record.image)
        };
        let mut entry = LogEntry::new(read_image(&image_path).await?, record.transcript);
        if let Some(timestamp) = record.timestamp {
            entry = entry.at(timestamp);
        }
        entries.push(entry);
    }
    Ok(entries)
}

async fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ReportError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

fn join_notes(existing: &str, notes: &str) -> String {
    match (existing.trim(), notes.trim()) {
        ("", notes) => notes.to_string(),
        (existing, "") => existing.to_string(),
        (existing, notes) => format!("{}\n{}", existing, notes),
    }
}
