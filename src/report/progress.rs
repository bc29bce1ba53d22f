//! Pipeline stage notifications
//!
//! A single-argument string callback invoked at each stage transition.
//! Notifications never influence control flow.

use std::fmt;
use std::sync::Arc;

use tracing::info;

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub const GENERATING: &str = "Generating report";
pub const FALLING_BACK: &str = "Falling back to template report";
pub const COMPLETE: &str = "Report complete";

#[derive(Clone, Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, message: &str) {
        info!("{}", message);
        if let Some(callback) = &self.callback {
            callback(message);
        }
    }

    pub fn analyzing(&self, total: usize) {
        self.report(&format!("Analyzing {} images", total));
    }

    pub fn analyzed(&self, done: usize, total: usize) {
        self.report(&format!("Analyzed {} of {} images", done, total));
    }

    pub fn image_failed(&self, index: usize, done: usize, total: usize) {
        self.report(&format!(
            "Image {} could not be analyzed ({} of {} processed)",
            index, done, total
        ));
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Collects messages; used by tests across the report module
#[cfg(test)]
pub(crate) fn recording() -> (ProgressReporter, Arc<std::sync::Mutex<Vec<String>>>) {
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let reporter = ProgressReporter::new(move |msg| {
        if let Ok(mut messages) = sink.lock() {
            messages.push(msg.to_string());
        }
    });
    (reporter, log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_is_noop() {
        ProgressReporter::silent().report("nothing listens");
    }

    #[test]
    fn test_messages_forwarded_in_order() {
        let (reporter, log) = recording();
        reporter.analyzing(3);
        reporter.analyzed(1, 3);
        reporter.image_failed(2, 2, 3);
        reporter.report(COMPLETE);

        let messages = log.lock().unwrap().clone();
        assert_eq!(
            messages,
            vec![
                "Analyzing 3 images",
                "Analyzed 1 of 3 images",
                "Image 2 could not be analyzed (2 of 3 processed)",
                "Report complete",
            ]
        );
    }
}
