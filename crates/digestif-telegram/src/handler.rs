// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message routing, chat filtering, and content extraction.
//!
//! Determines whether an incoming Telegram message should be ingested
//! (group chats only, optionally restricted to an allow-list), then maps it
//! into a channel-agnostic [`InboundMessage`] for the ingestion adapter.

use digestif_core::types::{InboundMessage, MessageKind};
use teloxide::prelude::*;

/// Checks whether the message comes from a group or supergroup chat.
///
/// The digest is a group feature; private and channel messages are ignored.
pub fn is_group(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

/// Checks whether the chat is served by this bot.
///
/// An empty allow-list serves every group the bot is a member of.
pub fn is_allowed_chat(msg: &Message, allowed_chats: &[i64]) -> bool {
    allowed_chats.is_empty() || allowed_chats.contains(&msg.chat.id.0)
}

/// The storage string for the chat's kind.
fn chat_kind_label(msg: &Message) -> &'static str {
    if msg.chat.is_supergroup() {
        "supergroup"
    } else if msg.chat.is_group() {
        "group"
    } else if msg.chat.is_channel() {
        "channel"
    } else {
        "private"
    }
}

/// Classify a message into its stored kind, caption/text, and media reference.
///
/// Returns `None` for unsupported payloads (locations, polls, service
/// messages).
fn classify(msg: &Message) -> Option<(MessageKind, Option<String>, Option<String>)> {
    let caption = msg.caption().map(|c| c.to_string());

    if let Some(text) = msg.text() {
        return Some((MessageKind::Text, Some(text.to_string()), None));
    }
    if let Some(photos) = msg.photo() {
        // Telegram provides multiple sizes; the last one is the largest.
        let file_id = photos.last().map(|p| p.file.id.to_string());
        return Some((MessageKind::Photo, caption, file_id));
    }
    if let Some(video) = msg.video() {
        return Some((MessageKind::Video, caption, Some(video.file.id.to_string())));
    }
    if let Some(voice) = msg.voice() {
        return Some((MessageKind::Voice, None, Some(voice.file.id.to_string())));
    }
    if let Some(audio) = msg.audio() {
        return Some((MessageKind::Audio, caption, Some(audio.file.id.to_string())));
    }
    if let Some(note) = msg.video_note() {
        return Some((MessageKind::VideoNote, None, Some(note.file.id.to_string())));
    }
    if let Some(doc) = msg.document() {
        return Some((MessageKind::Document, caption, Some(doc.file.id.to_string())));
    }
    if msg.sticker().is_some() {
        return Some((MessageKind::Sticker, None, None));
    }

    None
}

/// Converts a Telegram message into an [`InboundMessage`].
///
/// Returns `None` when the message has no sender (channel posts, service
/// messages) or an unsupported payload.
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let from = msg.from.as_ref()?;
    let (kind, content, media_ref) = classify(msg)?;

    Some(InboundMessage {
        chat_id: msg.chat.id.0,
        chat_title: msg.chat.title().unwrap_or("").to_string(),
        chat_kind: chat_kind_label(msg).to_string(),
        message_id: i64::from(msg.id.0),
        user_id: from.id.0 as i64,
        user_name: from.first_name.clone(),
        user_handle: from.username.clone(),
        kind,
        content,
        media_ref,
        reply_to: msg.reply_to_message().map(|r| i64::from(r.id.0)),
        timestamp: msg.date,
    })
}
