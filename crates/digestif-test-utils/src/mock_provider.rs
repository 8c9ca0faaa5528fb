// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock text backend adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls. A failure
//! switch simulates an unavailable backend for fallback-path tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use digestif_core::traits::adapter::PluginAdapter;
use digestif_core::traits::provider::ProviderAdapter;
use digestif_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use digestif_core::DigestifError;

/// A mock text backend that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty,
/// a default "mock digest" text is returned. Requests are recorded for
/// prompt assertions.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    fail: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Delay every `complete` call, for timeout-path tests.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// Make every subsequent `complete` call fail and `health_check` report
    /// unhealthy, simulating an unreachable backend.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }

    /// All requests received so far (test inspection).
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of `complete` calls received.
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Pop the next response, or return the default.
    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock digest".to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, DigestifError> {
        if self.fail.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock backend unavailable".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), DigestifError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, DigestifError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(DigestifError::Provider {
                message: "mock backend unavailable".into(),
                source: None,
            });
        }

        let model = request.model.clone();
        self.requests.lock().await.push(request);

        let text = self.next_response().await;
        Ok(ProviderResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content: text,
            model,
            stop_reason: Some("end_turn".to_string()),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digestif_core::types::ProviderMessage;

    fn make_request() -> ProviderRequest {
        ProviderRequest {
            model: "test-model".to_string(),
            system_prompt: None,
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: "summarize".to_string(),
            }],
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let provider = MockProvider::new();
        let resp = provider.complete(make_request()).await.unwrap();
        assert_eq!(resp.content, "mock digest");
    }

    #[tokio::test]
    async fn queued_responses_returned_in_order() {
        let provider = MockProvider::with_responses(vec![
            "first".to_string(),
            "second".to_string(),
        ]);

        assert_eq!(provider.complete(make_request()).await.unwrap().content, "first");
        assert_eq!(provider.complete(make_request()).await.unwrap().content, "second");
        // Queue exhausted, falls back to default
        assert_eq!(
            provider.complete(make_request()).await.unwrap().content,
            "mock digest"
        );
    }

    #[tokio::test]
    async fn unavailable_provider_errors_and_reports_unhealthy() {
        let provider = MockProvider::new();
        provider.set_unavailable(true);

        let err = provider.complete(make_request()).await.unwrap_err();
        assert!(matches!(err, DigestifError::Provider { .. }));

        let health = provider.health_check().await.unwrap();
        assert!(matches!(health, HealthStatus::Unhealthy(_)));
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let provider = MockProvider::new();
        provider.complete(make_request()).await.unwrap();
        assert_eq!(provider.request_count().await, 1);
        let requests = provider.requests().await;
        assert_eq!(requests[0].messages[0].content, "summarize");
    }
}
