// src/checker/fake.rs
// Canned LinkProbe for tests: no network, optional per-link delay so tests
// can force links to finish out of document order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::http::{LinkProbe, ProbeResult};

pub struct FakeProbe {
    answers: HashMap<String, ProbeResult>,
    delays: HashMap<String, Duration>,
    default: ProbeResult,
    pub calls: AtomicUsize,
}

impl FakeProbe {
    /// Every link answers with `status` unless overridden
    pub fn answering(status: u16) -> Self {
        Self {
            answers: HashMap::new(),
            delays: HashMap::new(),
            default: ProbeResult::Response(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, url: &str, result: ProbeResult) -> Self {
        self.answers.insert(url.to_string(), result);
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkProbe for FakeProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.answers
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}
