// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store trait consumed by the digest pipeline.

use async_trait::async_trait;

use crate::error::DigestifError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthoredMessage, Chat, ChatSettingsPatch, StoredMessage, Transcript};

/// Durable keyed storage for chats, users, messages, and transcripts.
///
/// The digest pipeline is a pure logic layer over this contract; it owns no
/// persisted state of its own. Timestamps passed to `get_messages_in_range`
/// use the store's timestamp space (see [`TIMESTAMP_FORMAT`]), and both
/// bounds are inclusive.
///
/// [`TIMESTAMP_FORMAT`]: crate::types::TIMESTAMP_FORMAT
#[async_trait]
pub trait MessageStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, pragmas).
    async fn initialize(&self) -> Result<(), DigestifError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), DigestifError>;

    // --- Chat operations ---

    async fn get_chat(&self, id: i64) -> Result<Option<Chat>, DigestifError>;

    /// Lists every chat with `active = true`.
    async fn list_active_chats(&self) -> Result<Vec<Chat>, DigestifError>;

    /// Creates the chat on first observed activity, or refreshes its
    /// title/kind. Digest settings are never touched by this call.
    async fn upsert_chat(&self, id: i64, title: &str, kind: &str) -> Result<(), DigestifError>;

    /// Applies a partial settings update; `None` fields are left unchanged.
    async fn update_chat_settings(
        &self,
        id: i64,
        patch: &ChatSettingsPatch,
    ) -> Result<(), DigestifError>;

    // --- User operations ---

    /// Creates or refreshes a user's identity. The `opted_out` flag is
    /// never touched by this call.
    async fn upsert_user(
        &self,
        id: i64,
        username: Option<&str>,
        first_name: &str,
    ) -> Result<(), DigestifError>;

    async fn set_user_opt_out(&self, user_id: i64, opted_out: bool)
        -> Result<(), DigestifError>;

    // --- Message operations ---

    /// Inserts a message. Re-inserting an existing (chat, message) key is a
    /// no-op; stored messages are immutable.
    async fn insert_message(&self, msg: &StoredMessage) -> Result<(), DigestifError>;

    /// Returns all messages for a chat with `start_ts <= created_at <= end_ts`,
    /// joined with the author's current opt-out status, in ascending creation
    /// order with insertion order as the tie-break.
    async fn get_messages_in_range(
        &self,
        chat_id: i64,
        start_ts: &str,
        end_ts: &str,
    ) -> Result<Vec<AuthoredMessage>, DigestifError>;

    // --- Transcript operations ---

    async fn get_transcript(
        &self,
        message_id: i64,
        media_ref: &str,
    ) -> Result<Option<Transcript>, DigestifError>;

    /// Stores a transcript. Idempotent on `(message_id, media_ref)`: a
    /// pre-existing row always wins and the second write is a no-op.
    async fn put_transcript(&self, transcript: &Transcript) -> Result<(), DigestifError>;
}
