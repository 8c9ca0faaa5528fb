// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin ingestion adapter: maps an inbound channel message to store records.
//!
//! Purely mechanical -- chat and author are upserted, the message is stored
//! verbatim. All interpretation (windows, filtering, rendering) happens at
//! digest time.

use std::sync::Arc;

use digestif_core::types::{format_timestamp, InboundMessage, StoredMessage};
use digestif_core::{DigestifError, MessageStore};

/// Record one observed message: upsert the chat and author, store the row.
///
/// First observed activity creates the chat with configured defaults.
pub async fn record(
    store: &Arc<dyn MessageStore>,
    msg: &InboundMessage,
) -> Result<(), DigestifError> {
    store
        .upsert_chat(msg.chat_id, &msg.chat_title, &msg.chat_kind)
        .await?;
    store
        .upsert_user(msg.user_id, msg.user_handle.as_deref(), &msg.user_name)
        .await?;
    store
        .insert_message(&StoredMessage {
            chat_id: msg.chat_id,
            message_id: msg.message_id,
            user_id: msg.user_id,
            kind: msg.kind,
            content: msg.content.clone(),
            media_ref: msg.media_ref.clone(),
            reply_to: msg.reply_to,
            created_at: format_timestamp(&msg.timestamp),
        })
        .await
}
