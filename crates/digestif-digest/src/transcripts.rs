// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store-backed transcript resolver.

use std::sync::Arc;

use async_trait::async_trait;

use digestif_core::types::Transcript;
use digestif_core::{DigestifError, MessageStore, TranscriptResolver};

/// Resolves transcripts from the message store's transcripts table.
///
/// The speech-to-text pipeline writes rows there out-of-band; by the time a
/// digest is generated, a transcript either exists or it doesn't. This
/// resolver never triggers recognition.
pub struct StoreTranscripts {
    store: Arc<dyn MessageStore>,
}

impl StoreTranscripts {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TranscriptResolver for StoreTranscripts {
    async fn resolve(
        &self,
        message_id: i64,
        media_ref: &str,
    ) -> Result<Option<Transcript>, DigestifError> {
        self.store.get_transcript(message_id, media_ref).await
    }
}
