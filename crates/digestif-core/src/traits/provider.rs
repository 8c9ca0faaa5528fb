// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for text-producing backend integrations.

use async_trait::async_trait;

use crate::error::DigestifError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for generative text backends.
///
/// Provider adapters handle communication with language model APIs. Digest
/// rendering is a single-shot request; any failure is mapped to
/// [`DigestifError::Provider`] so the render gate can degrade to its
/// deterministic fallback.
///
/// [`DigestifError::Provider`]: crate::error::DigestifError::Provider
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, DigestifError>;
}
