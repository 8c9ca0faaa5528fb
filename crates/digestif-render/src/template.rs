// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic digest templates and the generative prompt.
//!
//! The fallback template guarantees a digest exists even with zero external
//! dependencies reachable; the empty-state template answers explicit
//! previews of days with no activity.

use digestif_core::types::MessageKind;
use digestif_digest::DigestMessage;

use crate::lines;
use crate::RenderContext;

/// Deterministic digest: greeting, per-kind counts, and a statistics line.
pub fn fallback_digest(messages: &[DigestMessage], ctx: &RenderContext) -> String {
    let text_count = messages.iter().filter(|m| m.kind == MessageKind::Text).count();
    let spoken_count = messages.iter().filter(|m| m.kind.is_spoken()).count();
    let media_count = messages.len() - text_count - spoken_count;

    format!(
        "{mention}, here is the digest for \"{title}\" on {date}.\n\n\
         Text messages: {text_count}\n\
         Voice and video notes: {spoken_count}\n\
         Other media: {media_count}\n\n\
         Statistics: {total} messages were posted in total.",
        mention = ctx.target_mention,
        title = ctx.chat_title,
        date = ctx.date_label,
        total = ctx.total_count,
    )
}

/// Empty-state digest for an explicit preview of a day with no activity.
pub fn empty_digest(ctx: &RenderContext) -> String {
    format!(
        "{mention}, nothing was posted in \"{title}\" on {date} -- no digest today.",
        mention = ctx.target_mention,
        title = ctx.chat_title,
        date = ctx.date_label,
    )
}

/// System prompt for the generative backend.
pub fn system_prompt(ctx: &RenderContext, max_chars: usize) -> String {
    format!(
        "You are writing the once-daily digest of a group chat. The input is one \
         line per message: [HH:MM] author: body. Media messages carry a [kind] tag; \
         voice, audio and video_note lines carry a transcript or the marker \
         {unrecognized} when recognition failed.\n\n\
         Write the digest in the language the chat uses, addressed to {mention}, with \
         these sections:\n\
         1. Thematic summary of the day's conversations.\n\
         2. Decisions and agreements, if any were made.\n\
         3. Highlights from voice and video notes, each with its timestamp and author.\n\
         4. A short humorous-notes section, if the day gave any material.\n\
         5. One statistics line: {total} messages in total.\n\n\
         Skip a section entirely when there is nothing for it. Do not invent events. \
         Keep the whole digest under {max_chars} characters.",
        unrecognized = lines::UNRECOGNIZED_MARKER,
        mention = ctx.target_mention,
        total = ctx.total_count,
        max_chars = max_chars,
    )
}

/// User prompt: the digest header plus the protocol lines.
pub fn user_prompt(messages: &[DigestMessage], ctx: &RenderContext) -> String {
    format!(
        "Chat: {title}\nDate: {date}\n\n{lines}",
        title = ctx.chat_title,
        date = ctx.date_label,
        lines = lines::format_input(messages),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext {
            chat_title: "Weekend Plans".to_string(),
            date_label: "2026-03-01".to_string(),
            total_count: 5,
            target_mention: "@all".to_string(),
        }
    }

    fn make_msg(kind: MessageKind) -> DigestMessage {
        DigestMessage {
            message_id: 1,
            kind,
            content: None,
            author_name: "Alice".to_string(),
            author_handle: None,
            created_at: "2026-03-01T09:00:00.000Z".to_string(),
            transcript: None,
        }
    }

    #[test]
    fn fallback_counts_kinds_and_mentions_target() {
        let messages = vec![
            make_msg(MessageKind::Text),
            make_msg(MessageKind::Text),
            make_msg(MessageKind::Voice),
            make_msg(MessageKind::VideoNote),
            make_msg(MessageKind::Photo),
        ];
        let digest = fallback_digest(&messages, &ctx());

        assert!(digest.starts_with("@all,"));
        assert!(digest.contains("Text messages: 2"));
        assert!(digest.contains("Voice and video notes: 2"));
        assert!(digest.contains("Other media: 1"));
        assert!(digest.contains("Statistics: 5 messages"));
    }

    #[test]
    fn fallback_statistics_uses_unfiltered_total() {
        // Two renderable messages, but five stored for the day.
        let messages = vec![make_msg(MessageKind::Text), make_msg(MessageKind::Text)];
        let digest = fallback_digest(&messages, &ctx());
        assert!(digest.contains("Statistics: 5 messages"));
    }

    #[test]
    fn empty_digest_names_chat_and_date() {
        let digest = empty_digest(&ctx());
        assert!(digest.contains("@all"));
        assert!(digest.contains("Weekend Plans"));
        assert!(digest.contains("2026-03-01"));
        assert!(digest.contains("no digest"));
    }

    #[test]
    fn system_prompt_pins_sections_and_bound() {
        let prompt = system_prompt(&ctx(), 3500);
        assert!(prompt.contains("Thematic summary"));
        assert!(prompt.contains("Decisions"));
        assert!(prompt.contains("voice and video notes"));
        assert!(prompt.contains("humorous"));
        assert!(prompt.contains("5 messages in total"));
        assert!(prompt.contains("@all"));
        assert!(prompt.contains("under 3500 characters"));
    }

    #[test]
    fn user_prompt_contains_protocol_lines() {
        let mut msg = make_msg(MessageKind::Text);
        msg.content = Some("hello".to_string());
        let prompt = user_prompt(&[msg], &ctx());
        assert!(prompt.contains("Chat: Weekend Plans"));
        assert!(prompt.contains("Date: 2026-03-01"));
        assert!(prompt.contains("[09:00] Alice: hello"));
    }
}
