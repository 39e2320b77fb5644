//! Mock narrative backend for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use cohortlens_core::traits::{NarrativeGenerator, NarrativeRequest, NarrativeResponse};

/// A scripted backend for exercising summary generation without network
/// calls.
pub struct MockGenerator {
    /// `Some(text)` answers with `text`; `None` fails every request.
    response: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<NarrativeRequest>>,
}

impl MockGenerator {
    /// A mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock whose every request fails.
    pub fn failing() -> Self {
        Self {
            response: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this backend.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this backend.
    pub fn last_request(&self) -> Option<NarrativeRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NarrativeGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &NarrativeRequest) -> anyhow::Result<NarrativeResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        match &self.response {
            Some(text) => Ok(NarrativeResponse {
                text: text.clone(),
                model: request.model.clone(),
                latency_ms: 1,
            }),
            None => anyhow::bail!("mock backend configured to fail"),
        }
    }
}
