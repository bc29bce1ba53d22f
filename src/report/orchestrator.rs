//! Analysis Orchestrator
//!
//! Fans out one `ImageAnalyzer` call per image, joins all of them, and keeps
//! the successes. Each task's error (or panic) is captured in isolation so a
//! failing image never cancels its siblings.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tracing::{info, instrument, warn};

use super::analyzer::ImageAnalyzer;
use super::progress::ProgressReporter;
use crate::types::{AnalysisResult, ReportError, Result};

/// Joined outcome of one fan-out
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Successes ordered by `image_index`
    pub analyses: Vec<AnalysisResult>,
    /// 1-based indices that produced no result, ascending
    pub failed: Vec<usize>,
}

pub struct AnalysisOrchestrator {
    analyzer: Arc<ImageAnalyzer>,
    progress: ProgressReporter,
}

impl AnalysisOrchestrator {
    pub fn new(analyzer: Arc<ImageAnalyzer>, progress: ProgressReporter) -> Self {
        Self { analyzer, progress }
    }

    /// Analyze every image concurrently. Fails only when nothing succeeded.
    #[instrument(skip(self, images), fields(images = images.len()))]
    pub async fn run(&self, images: &[Arc<[u8]>]) -> Result<AnalysisOutcome> {
        let total = images.len();
        if total == 0 {
            return Err(ReportError::NoAnalysisAvailable { attempted: 0 });
        }

        self.progress.analyzing(total);
        let analyzer = &self.analyzer;

        // Unbounded: every image is in flight at once
        let mut stream = futures::stream::iter(images.iter().enumerate())
            .map(|(position, image)| {
                let index = position + 1;
                async move {
                    let result = AssertUnwindSafe(analyzer.analyze(index, image))
                        .catch_unwind()
                        .await;
                    (index, result)
                }
            })
            .buffer_unordered(total);

        let mut analyses = Vec::with_capacity(total);
        let mut failed = Vec::new();
        let mut done = 0;

        while let Some((index, result)) = stream.next().await {
            done += 1;
            match result {
                Ok(Ok(analysis)) => {
                    analyses.push(analysis);
                    self.progress.analyzed(done, total);
                }
                Ok(Err(e)) => {
                    warn!("{}", e);
                    failed.push(index);
                    self.progress.image_failed(index, done, total);
                }
                Err(_) => {
                    warn!("Analysis task for image {} panicked", index);
                    failed.push(index);
                    self.progress.image_failed(index, done, total);
                }
            }
        }

        if analyses.is_empty() {
            return Err(ReportError::NoAnalysisAvailable { attempted: total });
        }

        analyses.sort_by_key(|a| a.image_index);
        failed.sort_unstable();

        info!(
            "Analysis complete: {} succeeded, {} failed",
            analyses.len(),
            failed.len()
        );

        Ok(AnalysisOutcome { analyses, failed })
    }
}
