// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript resolver trait consumed by the digest generator.

use async_trait::async_trait;

use crate::error::DigestifError;
use crate::types::Transcript;

/// Resolves transcript text for a spoken-media message.
///
/// The digest generator only observes transcripts that already exist; the
/// speech-to-text producer that writes them lives outside this crate. A
/// `None` return means no transcript is available (unrecognized, oversized,
/// or never processed) and is rendered as an explicit marker downstream.
#[async_trait]
pub trait TranscriptResolver: Send + Sync {
    async fn resolve(
        &self,
        message_id: i64,
        media_ref: &str,
    ) -> Result<Option<Transcript>, DigestifError>;
}
