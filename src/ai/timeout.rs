//! Per-call Deadlines
//!
//! Every provider call made by the pipeline runs under a deadline. An expired
//! deadline is reported as a network failure so it flows through the same
//! failover and template-fallback paths as any other transport error.
//!
//! ```ignore
//! let text = with_timeout(timeouts.analysis, provider.name(), provider.analyze(&bytes, prompt)).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::ProviderError;

/// Deadlines for the two kinds of provider call
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// One vision analysis (default: 90 seconds)
    pub analysis: Duration,
    /// Long-form report generation (default: 5 minutes)
    pub generation: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            analysis: Duration::from_secs(net_constants::ANALYSIS_CALL_TIMEOUT_SECS),
            generation: Duration::from_secs(net_constants::GENERATION_CALL_TIMEOUT_SECS),
        }
    }
}

/// Run a provider call under a deadline
pub async fn with_timeout<T, F>(timeout: Duration, provider: &str, future: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::network(
            provider,
            format!("call timed out after {:?}", timeout),
        )),
    }
}
