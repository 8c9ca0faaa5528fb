// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the digestif pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Timestamp format used throughout the message store.
///
/// All `created_at`/`updated_at` columns hold UTC instants rendered with
/// this format. Lexicographic order over these strings equals chronological
/// order, which is what the day-window `BETWEEN` queries rely on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Renders a UTC instant in the store's timestamp space.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Unique identifier for a message delivered through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
    Transcriber,
}

/// Message kinds tracked by the store, matching the chat platform's taxonomy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Photo,
    Video,
    Voice,
    Audio,
    VideoNote,
    Sticker,
    Document,
}

impl MessageKind {
    /// Kinds whose payload is a spoken recording that may carry a transcript.
    pub fn is_spoken(self) -> bool {
        matches!(self, MessageKind::Voice | MessageKind::Audio | MessageKind::VideoNote)
    }
}

// --- Domain entities ---

/// A group chat known to the digest service.
///
/// Created on first observed activity; `report_time`/`timezone`/
/// `target_mention`/`active` are mutated only through settings commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    pub kind: String,
    /// Local wall-clock delivery time, `HH:MM`.
    pub report_time: String,
    /// IANA zone name, e.g. `Europe/Berlin`.
    pub timezone: String,
    /// Mention string addressed in every digest.
    pub target_mention: String,
    pub active: bool,
    pub created_at: String,
}

/// A chat member observed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    /// Suppresses this user's messages from digest content, evaluated at
    /// generation time.
    pub opted_out: bool,
    pub updated_at: String,
}

/// One stored chat message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub kind: MessageKind,
    /// Caption or text body.
    pub content: Option<String>,
    /// Platform file reference for media messages.
    pub media_ref: Option<String>,
    pub reply_to: Option<i64>,
    pub created_at: String,
}

/// A message row joined with its author, as returned by range queries.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredMessage {
    pub message: StoredMessage,
    pub author_name: String,
    pub author_handle: Option<String>,
    /// The author's opt-out flag at query time.
    pub author_opted_out: bool,
}

/// A speech-to-text transcript for one (message, media) pair.
///
/// Written at most once per composite key; a pre-existing row is always
/// preferred over recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub message_id: i64,
    pub media_ref: String,
    pub text: String,
    pub language: Option<String>,
    pub duration_secs: Option<f64>,
    pub created_at: String,
}

/// Partial update applied to a chat's digest settings.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSettingsPatch {
    pub report_time: Option<String>,
    pub timezone: Option<String>,
    pub target_mention: Option<String>,
    pub active: Option<bool>,
}

// --- Channel types ---

/// An inbound message received from a channel adapter, normalized for ingestion.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub chat_title: String,
    pub chat_kind: String,
    pub message_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_handle: Option<String>,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub media_ref: Option<String>,
    pub reply_to: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// An outbound message to be delivered via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_markdown: bool,
    pub max_message_length: Option<usize>,
}

// --- Provider types ---

/// A request to a text-producing backend.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
}

/// One conversational turn in a provider request.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

/// A response from a text-producing backend.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}

/// Token counts reported by a provider, used for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn timestamp_format_is_sortable() {
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 1, 21, 30, 5).unwrap();
        let a = format_timestamp(&early);
        let b = format_timestamp(&late);
        assert!(a < b, "lexicographic order must match chronological order");
        assert_eq!(a, "2026-03-01T09:00:00.000Z");
    }

    #[test]
    fn message_kind_round_trips_snake_case() {
        for kind in [
            MessageKind::Text,
            MessageKind::Photo,
            MessageKind::Video,
            MessageKind::Voice,
            MessageKind::Audio,
            MessageKind::VideoNote,
            MessageKind::Sticker,
            MessageKind::Document,
        ] {
            let s = kind.to_string();
            let parsed = MessageKind::from_str(&s).expect("should parse back");
            assert_eq!(kind, parsed);
        }
        assert_eq!(MessageKind::VideoNote.to_string(), "video_note");
    }

    #[test]
    fn spoken_kinds_are_voice_audio_video_note() {
        assert!(MessageKind::Voice.is_spoken());
        assert!(MessageKind::Audio.is_spoken());
        assert!(MessageKind::VideoNote.is_spoken());
        assert!(!MessageKind::Text.is_spoken());
        assert!(!MessageKind::Video.is_spoken());
        assert!(!MessageKind::Sticker.is_spoken());
    }

    #[test]
    fn settings_patch_default_changes_nothing() {
        let patch = ChatSettingsPatch::default();
        assert!(patch.report_time.is_none());
        assert!(patch.timezone.is_none());
        assert!(patch.target_mention.is_none());
        assert!(patch.active.is_none());
    }
}
