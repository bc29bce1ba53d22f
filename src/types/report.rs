//! Pipeline input and output values

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::defect::AnalysisResult;

/// One captured log entry handed over by the storage collaborator
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub image: Arc<[u8]>,
    pub transcript: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(image: impl Into<Arc<[u8]>>, transcript: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            transcript: transcript.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Ordered section name → body mapping, in discovery order.
///
/// Built once by the section parser and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportSections(IndexMap<String, String>);

impl ReportSections {
    pub(crate) fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Keeps the first body recorded for a key
    pub(crate) fn insert(&mut self, key: impl Into<String>, body: impl Into<String>) {
        self.0.entry(key.into()).or_insert_with(|| body.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render back to heading/body text
    pub fn to_text(&self) -> String {
        self.iter()
            .map(|(key, body)| format!("{}\n{}", key, body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Which composer path produced the report text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSource {
    Ai { provider: String, model: String },
    Template,
}

impl ReportSource {
    pub fn is_template(&self) -> bool {
        matches!(self, ReportSource::Template)
    }
}

impl std::fmt::Display for ReportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportSource::Ai { provider, model } => write!(f, "{} ({})", provider, model),
            ReportSource::Template => write!(f, "template"),
        }
    }
}

/// Everything the renderer needs from one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub source: ReportSource,
    pub sections: ReportSections,
    pub analyses: Vec<AnalysisResult>,
    /// 1-based indices of images no provider could analyze
    pub failed_images: Vec<usize>,
    #[serde(skip)]
    pub report_text: String,
    #[serde(skip)]
    pub images: Vec<Arc<[u8]>>,
}
