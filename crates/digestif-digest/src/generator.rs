// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Date-windowed message assembly with opt-out filtering and transcript
//! attachment.
//!
//! [`DigestGenerator`] is stateless per call: it pulls one calendar day of
//! messages from the store, drops messages from currently opted-out authors,
//! and attaches transcript text for spoken media. Opt-out is evaluated here,
//! at generation time, so a later opt-out retroactively hides stored history.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use digestif_core::types::MessageKind;
use digestif_core::{DigestifError, MessageStore, TranscriptResolver};

/// Transcript state attached to a spoken-media digest message.
///
/// A missing transcript is an explicit marker, never an empty string that
/// could be silently merged with a caption.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptText {
    /// Transcript text resolved for this message.
    Resolved(String),
    /// Spoken media with no usable transcript.
    Unavailable,
}

/// One message prepared for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestMessage {
    pub message_id: i64,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub author_name: String,
    pub author_handle: Option<String>,
    pub created_at: String,
    /// `Some` only for voice/audio/video-note messages.
    pub transcript: Option<TranscriptText>,
}

/// The assembled message set for one chat and one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDigest {
    /// Chronologically ordered messages, opted-out authors removed.
    pub messages: Vec<DigestMessage>,
    /// Pre-filter row count, for chat-wide statistics. Not the length of
    /// `messages` -- callers must not conflate the two.
    pub total_count: usize,
}

impl DayDigest {
    /// Whether any renderable content survived filtering.
    pub fn has_content(&self) -> bool {
        !self.messages.is_empty()
    }
}

/// Computes the inclusive day window for a date in the store's timestamp space.
pub fn day_window(date: NaiveDate) -> (String, String) {
    let day = date.format("%Y-%m-%d");
    (
        format!("{day}T00:00:00.000Z"),
        format!("{day}T23:59:59.999Z"),
    )
}

/// Assembles the ordered, filtered message set for a chat and calendar date.
pub struct DigestGenerator {
    store: Arc<dyn MessageStore>,
    transcripts: Arc<dyn TranscriptResolver>,
}

impl DigestGenerator {
    pub fn new(store: Arc<dyn MessageStore>, transcripts: Arc<dyn TranscriptResolver>) -> Self {
        Self { store, transcripts }
    }

    /// Pulls the day's messages, drops opted-out authors, and attaches
    /// transcripts for spoken media.
    ///
    /// Store-assigned order is preserved; this method never reorders.
    pub async fn assemble(
        &self,
        chat_id: i64,
        date: NaiveDate,
    ) -> Result<DayDigest, DigestifError> {
        let (start, end) = day_window(date);
        let rows = self.store.get_messages_in_range(chat_id, &start, &end).await?;
        let total_count = rows.len();

        let mut messages = Vec::new();
        for row in rows {
            if row.author_opted_out {
                continue;
            }

            let transcript = if row.message.kind.is_spoken() {
                Some(match &row.message.media_ref {
                    Some(media_ref) => {
                        match self
                            .transcripts
                            .resolve(row.message.message_id, media_ref)
                            .await?
                        {
                            Some(t) => TranscriptText::Resolved(t.text),
                            None => TranscriptText::Unavailable,
                        }
                    }
                    None => TranscriptText::Unavailable,
                })
            } else {
                None
            };

            messages.push(DigestMessage {
                message_id: row.message.message_id,
                kind: row.message.kind,
                content: row.message.content,
                author_name: row.author_name,
                author_handle: row.author_handle,
                created_at: row.message.created_at,
                transcript,
            });
        }

        debug!(
            chat_id,
            date = %date,
            total = total_count,
            filtered = messages.len(),
            "assembled day digest"
        );

        Ok(DayDigest {
            messages,
            total_count,
        })
    }

    /// Cheap existence check: whether the chat has any renderable content
    /// for the date after opt-out filtering.
    ///
    /// Used to decide whether a scheduled fire should suppress delivery.
    /// Skips transcript resolution entirely.
    pub async fn has_content(
        &self,
        chat_id: i64,
        date: NaiveDate,
    ) -> Result<bool, DigestifError> {
        let (start, end) = day_window(date);
        let rows = self.store.get_messages_in_range(chat_id, &start, &end).await?;
        Ok(rows.iter().any(|r| !r.author_opted_out))
    }
}
