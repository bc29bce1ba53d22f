//! Scripted provider for pipeline tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::ai::provider::{AiProvider, ProviderState};
use crate::types::ProviderError;

type AnalyzeFn = Box<dyn Fn(&[u8]) -> Result<String, ProviderError> + Send + Sync>;

pub(crate) const VALID_ANALYSIS: &str = r#"{
  "description": "Rear elevation",
  "material_type": "Brick",
  "overall_condition": "Fair",
  "defects": [
    {"type": "Crack", "location": "Lintel", "severity": "High", "confidence_score": 88, "description": "Stepped crack"}
  ]
}"#;

pub(crate) struct MockProvider {
    name: String,
    state: ProviderState,
    analyze_fn: AnalyzeFn,
    generate_reply: Result<String, ProviderError>,
    analyze_calls: AtomicUsize,
    generate_calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: ProviderState::ready("mock-model", 1024),
            analyze_fn: Box::new(|_| Ok(VALID_ANALYSIS.to_string())),
            generate_reply: Err(ProviderError::empty(name)),
            analyze_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn analyzing(
        mut self,
        f: impl Fn(&[u8]) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.analyze_fn = Box::new(f);
        self
    }

    pub(crate) fn answering(self, text: &str) -> Self {
        let text = text.to_string();
        self.analyzing(move |_| Ok(text.clone()))
    }

    pub(crate) fn failing(self, err: ProviderError) -> Self {
        self.analyzing(move |_| Err(err.clone()))
    }

    pub(crate) fn generating(mut self, reply: Result<String, ProviderError>) -> Self {
        self.generate_reply = reply;
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    fn supports_vision(&self) -> bool {
        true
    }

    async fn analyze(&self, image: &[u8], _instructions: &str) -> Result<String, ProviderError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        (self.analyze_fn)(image)
    }

    async fn generate(
        &self,
        _prompt: &str,
        _max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.generate_reply.clone()
    }
}

pub(crate) fn rate_limited(provider: &str) -> ProviderError {
    ProviderError::RateLimited {
        provider: provider.to_string(),
        retry_after: None,
    }
}

/// Upcast mocks into a provider preference list
pub(crate) fn chain(mocks: &[&Arc<MockProvider>]) -> Vec<crate::ai::SharedProvider> {
    mocks
        .iter()
        .map(|mock| Arc::clone(mock) as crate::ai::SharedProvider)
        .collect()
}
