// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The text backend gate: probe-once backend selection with a deterministic
//! fallback.
//!
//! The gate asks the generative provider for a structured digest and
//! degrades to the fixed template on any failure -- unavailability, API
//! errors, or a timeout. Availability is probed once and the selection is
//! cached for the process lifetime; a backend that becomes unavailable
//! mid-session is not re-probed per call. An injected override supports
//! testing without a live provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use digestif_core::types::{HealthStatus, ProviderMessage, ProviderRequest};
use digestif_core::{PluginAdapter, ProviderAdapter};
use digestif_digest::DigestMessage;

use crate::template;

/// Which backend the gate renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The generative provider, with per-call fallback on failure.
    Generative,
    /// The deterministic template only.
    Fallback,
}

/// Per-digest rendering context.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub chat_title: String,
    /// Target-date label, `YYYY-MM-DD`.
    pub date_label: String,
    /// Unfiltered message count for the day (statistics).
    pub total_count: usize,
    /// Mention string the digest is addressed to.
    pub target_mention: String,
}

/// Generation parameters for the generative path.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub model: String,
    pub max_tokens: u32,
    /// Bound on one generative call; a timeout falls back to the template.
    pub generation_timeout: Duration,
    /// Approximate character bound requested from the backend.
    pub max_digest_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            generation_timeout: Duration::from_secs(60),
            max_digest_chars: 3500,
        }
    }
}

/// Renders an assembled message set into final digest prose.
pub struct TextBackendGate {
    provider: Option<Arc<dyn ProviderAdapter>>,
    options: RenderOptions,
    selection: OnceCell<Backend>,
}

impl TextBackendGate {
    /// Create a gate over an optional generative provider.
    ///
    /// With `None` the gate always renders the deterministic template.
    pub fn new(provider: Option<Arc<dyn ProviderAdapter>>, options: RenderOptions) -> Self {
        Self {
            provider,
            options,
            selection: OnceCell::new(),
        }
    }

    /// Create a gate with a pre-selected backend, bypassing the probe.
    ///
    /// Test seam for forcing either path deterministically.
    pub fn with_backend(
        provider: Option<Arc<dyn ProviderAdapter>>,
        options: RenderOptions,
        backend: Backend,
    ) -> Self {
        Self {
            provider,
            options,
            selection: OnceCell::new_with(Some(backend)),
        }
    }

    /// The backend selected for this process.
    ///
    /// Probes provider health exactly once; every later call returns the
    /// cached selection.
    pub async fn selected_backend(&self) -> Backend {
        *self
            .selection
            .get_or_init(|| async {
                let Some(provider) = &self.provider else {
                    info!("no generative provider configured, using fallback renderer");
                    return Backend::Fallback;
                };
                match provider.health_check().await {
                    Ok(HealthStatus::Healthy) => {
                        info!(provider = provider.name(), "generative backend selected");
                        Backend::Generative
                    }
                    Ok(status) => {
                        warn!(?status, "generative backend not healthy, using fallback renderer");
                        Backend::Fallback
                    }
                    Err(e) => {
                        warn!(error = %e, "generative backend probe failed, using fallback renderer");
                        Backend::Fallback
                    }
                }
            })
            .await
    }

    /// Renders the digest for an assembled message set.
    ///
    /// Empty input always renders the empty-state template without touching
    /// the provider. Every provider failure degrades to the deterministic
    /// template; this method never surfaces a backend error.
    pub async fn render(&self, messages: &[DigestMessage], ctx: &RenderContext) -> String {
        if messages.is_empty() {
            debug!(chat = %ctx.chat_title, "empty input, rendering empty-state template");
            return template::empty_digest(ctx);
        }

        match self.selected_backend().await {
            Backend::Fallback => template::fallback_digest(messages, ctx),
            Backend::Generative => match self.generate(messages, ctx).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, chat = %ctx.chat_title, "generation failed, falling back");
                    metrics::counter!("digestif_render_fallback_total").increment(1);
                    template::fallback_digest(messages, ctx)
                }
            },
        }
    }

    /// One bounded generative call.
    async fn generate(
        &self,
        messages: &[DigestMessage],
        ctx: &RenderContext,
    ) -> Result<String, digestif_core::DigestifError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            digestif_core::DigestifError::Provider {
                message: "generative backend selected but no provider configured".into(),
                source: None,
            }
        })?;

        let request = ProviderRequest {
            model: self.options.model.clone(),
            system_prompt: Some(template::system_prompt(ctx, self.options.max_digest_chars)),
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: template::user_prompt(messages, ctx),
            }],
            max_tokens: self.options.max_tokens,
        };

        let response = tokio::time::timeout(
            self.options.generation_timeout,
            provider.complete(request),
        )
        .await
        .map_err(|_| digestif_core::DigestifError::Timeout {
            duration: self.options.generation_timeout,
        })??;

        let text = response.content.trim().to_string();
        if text.is_empty() {
            return Err(digestif_core::DigestifError::Provider {
                message: "backend returned an empty digest".into(),
                source: None,
            });
        }
        Ok(text)
    }
}
